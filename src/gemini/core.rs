use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::RemoteError;

pub const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "model")]
    Model,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Part {
    pub text: String,
}

/// One message sent to `generateContent`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(role: Role, text: &str) -> Self {
        Content {
            role,
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Clone, Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
            response_mime_type: String::from("text/plain"),
        }
    }
}

// {
//   "candidates": [{
//     "content": {"parts": [{"text": "Hi there"}], "role": "model"},
//     "finishReason": "STOP"
//   }],
//   "promptFeedback": {"blockReason": "SAFETY"}
// }
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// The text of the first candidate. Parts without text are
    /// skipped.
    fn into_text(self) -> Result<String, RemoteError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map(|r| format!("blocked: {}", r))
                .unwrap_or_else(|| String::from("no candidates"));
            return Err(RemoteError::NoText { reason });
        };

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            let reason = candidate
                .finish_reason
                .map(|r| format!("finish reason: {}", r))
                .unwrap_or_else(|| String::from("empty candidate"));
            return Err(RemoteError::NoText { reason });
        }

        Ok(text)
    }
}

/// Calls `generateContent` with the full list of `contents` and
/// returns the reply text.
pub fn generate_content(
    http: &Client,
    contents: &[Content],
    generation_config: &GenerationConfig,
    api_hostname: &str,
    api_key: &str,
    model: &str,
) -> Result<String, RemoteError> {
    let payload = json!({
        "contents": contents,
        "generationConfig": generation_config,
    });
    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        api_hostname.trim_end_matches('/'),
        model
    );

    tracing::debug!("Sending {} messages to {}", contents.len(), url);

    // The key goes in a header. Transport errors print the request URL.
    let response = http
        .post(&url)
        .header(API_KEY_HEADER, api_key)
        .json(&payload)
        .send()?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .unwrap_or_else(|_| String::from("Failed to read error response"));
        return Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let body = response.text()?;
    let parsed: GenerateContentResponse = serde_json::from_str(&body).inspect_err(|e| {
        tracing::error!("Parsing generateContent response failed for {}\nError: {}", body, e)
    })?;
    parsed.into_text()
}
