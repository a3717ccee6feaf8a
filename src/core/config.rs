use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HISTORY_FILE: &str = "chat_history.txt";
pub const DEFAULT_GEMINI_HOST: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub history_path: PathBuf,
    pub gemini_api_key: String,
    pub gemini_api_hostname: String,
    pub gemini_model: String,
    pub request_timeout: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let history_path = env::var("ROOTGPT_HISTORY_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_HISTORY_FILE));
        // A missing key is not an error here. The first request fails
        // instead and shows up in the transcript.
        let gemini_api_key = env::var("GOOGLE_API_KEY").unwrap_or_default();
        let gemini_api_hostname =
            env::var("ROOTGPT_API_HOST").unwrap_or_else(|_| DEFAULT_GEMINI_HOST.to_string());
        let gemini_model =
            env::var("ROOTGPT_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());
        let request_timeout = env::var("ROOTGPT_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| parse_timeout(&v));

        Self {
            history_path,
            gemini_api_key,
            gemini_api_hostname,
            gemini_model,
            request_timeout,
        }
    }
}

fn parse_timeout(value: &str) -> Option<Duration> {
    match value.trim().parse::<u64>() {
        Ok(0) => None,
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(e) => {
            tracing::warn!(
                "Ignoring ROOTGPT_REQUEST_TIMEOUT_SECS={}: {}",
                value,
                e
            );
            None
        }
    }
}
