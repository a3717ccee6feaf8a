use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;

use super::core::{Content, GenerationConfig, Role, generate_content};
use crate::chat::client::{BoxedChatSession, ChatSession, CompletionClient, completed_exchanges};
use crate::chat::models::Turn;
use crate::core::{AppConfig, RemoteError};

/// Opens chat sessions against the Gemini `generateContent` API.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_hostname: String,
    api_key: String,
    model: String,
    generation_config: GenerationConfig,
}

impl GeminiClient {
    /// A client without a request timeout.
    pub fn new(api_hostname: &str, api_key: &str, model: &str) -> Result<Self, RemoteError> {
        Self::with_timeout(api_hostname, api_key, model, None)
    }

    pub fn with_timeout(
        api_hostname: &str,
        api_key: &str,
        model: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, RemoteError> {
        // The blocking client times out after 30 seconds unless told
        // otherwise
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            generation_config: GenerationConfig::default(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, RemoteError> {
        Self::with_timeout(
            &config.gemini_api_hostname,
            &config.gemini_api_key,
            &config.gemini_model,
            config.request_timeout,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_hostname", &self.api_hostname)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("generation_config", &self.generation_config)
            .finish_non_exhaustive()
    }
}

impl CompletionClient for GeminiClient {
    fn start_chat(&self, history: &[Turn]) -> BoxedChatSession {
        let session = GeminiChatSession::new(self.clone(), history);
        tracing::debug!(
            "Starting {} chat session with {} prior messages",
            self.model,
            session.contents.len()
        );
        Box::new(session)
    }
}

/// A multi-turn chat. The whole exchange so far is sent with every
/// message because `generateContent` itself is stateless.
pub struct GeminiChatSession {
    client: GeminiClient,
    contents: Vec<Content>,
}

impl GeminiChatSession {
    pub fn new(client: GeminiClient, history: &[Turn]) -> Self {
        let mut contents = Vec::new();
        for (user, reply) in completed_exchanges(history) {
            contents.push(Content::new(Role::User, user.text()));
            contents.push(Content::new(Role::Model, reply.text()));
        }
        Self { client, contents }
    }

    pub fn contents(&self) -> &[Content] {
        &self.contents
    }
}

impl ChatSession for GeminiChatSession {
    fn send_message(&mut self, text: &str) -> Result<String, RemoteError> {
        let mut request = self.contents.clone();
        request.push(Content::new(Role::User, text));

        let reply = generate_content(
            &self.client.http,
            &request,
            &self.client.generation_config,
            &self.client.api_hostname,
            &self.client.api_key,
            &self.client.model,
        )?;

        // Only a successful exchange becomes part of the context
        request.push(Content::new(Role::Model, &reply));
        self.contents = request;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn reply_body(text: &str) -> String {
        json!({
            "candidates": [{
                "content": {"parts": [{"text": text}], "role": "model"},
                "finishReason": "STOP"
            }]
        })
        .to_string()
    }

    #[test]
    fn test_from_config() {
        let config = AppConfig {
            history_path: "chat_history.txt".into(),
            gemini_api_key: String::from("test-key"),
            gemini_api_hostname: String::from("http://localhost:1234"),
            gemini_model: String::from("gemini-test"),
            request_timeout: Some(Duration::from_secs(5)),
        };
        let client = GeminiClient::from_config(&config).unwrap();

        assert_eq!(client.model(), "gemini-test");
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.api_hostname, "http://localhost:1234");
        assert_eq!(client.generation_config, GenerationConfig::default());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client =
            GeminiClient::new("http://localhost", "SUPER-SECRET-KEY", "gemini-1.5-flash").unwrap();
        let debug = format!("{:?}", client);

        assert!(!debug.contains("SUPER-SECRET-KEY"));
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("gemini-1.5-flash"));
    }

    #[test]
    fn test_session_seeded_from_history() {
        let client = GeminiClient::new("http://localhost", "key", "gemini-1.5-flash").unwrap();
        let history = vec![
            Turn::user("hello"),
            Turn::assistant("hi there"),
            Turn::user("unanswered"),
        ];
        let session = GeminiChatSession::new(client, &history);

        assert_eq!(
            session.contents(),
            &[
                Content::new(Role::User, "hello"),
                Content::new(Role::Model, "hi there"),
            ]
        );
    }

    #[test]
    fn test_session_sends_prior_context() {
        let mut server = mockito::Server::new();
        let path = "/v1beta/models/gemini-1.5-flash:generateContent";
        let config = serde_json::to_value(GenerationConfig::default()).unwrap();

        let first = server
            .mock("POST", path)
            .match_query(Matcher::Any)
            .match_body(Matcher::Json(json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}],
                "generationConfig": config.clone(),
            })))
            .with_status(200)
            .with_body(reply_body("hi there"))
            .create();
        let second = server
            .mock("POST", path)
            .match_query(Matcher::Any)
            .match_body(Matcher::Json(json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "hello"}]},
                    {"role": "model", "parts": [{"text": "hi there"}]},
                    {"role": "user", "parts": [{"text": "how are you?"}]}
                ],
                "generationConfig": config,
            })))
            .with_status(200)
            .with_body(reply_body("great"))
            .create();

        let client = GeminiClient::new(&server.url(), "test-key", "gemini-1.5-flash").unwrap();
        let mut session = client.start_chat(&[]);

        assert_eq!(session.send_message("hello").unwrap(), "hi there");
        assert_eq!(session.send_message("how are you?").unwrap(), "great");

        first.assert();
        second.assert();
    }

    #[test]
    fn test_failed_exchange_is_not_remembered() {
        let mut server = mockito::Server::new();
        let path = "/v1beta/models/gemini-1.5-flash:generateContent";

        let failing = server
            .mock("POST", path)
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("internal error")
            .expect(1)
            .create();

        let client = GeminiClient::new(&server.url(), "test-key", "gemini-1.5-flash").unwrap();
        let mut session = GeminiChatSession::new(client, &[]);

        let result = session.send_message("test");
        failing.assert();
        assert!(matches!(result, Err(RemoteError::Status { status: 500, .. })));
        assert!(session.contents().is_empty());
    }
}
