use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::types::{ChatMessage, LlmClient};
use super::AiError;
use crate::config::AppConfig;

/// Blocking HTTP client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, AiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AiError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AiError> {
        Self::new(
            &config.api_base_url,
            config.api_key.clone(),
            &config.model,
            config.request_timeout_secs,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Request body for `POST /chat/completions`
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

/// Response body from `POST /chat/completions`
#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl LlmClient for OpenAiClient {
    fn complete(&self, system: &str, prompt: &str) -> Result<String, AiError> {
        let api_key = self.api_key.as_deref().ok_or(AiError::MissingCredential)?;

        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage::system(system), ChatMessage::user(prompt)],
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Sending chat completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    AiError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    AiError::Timeout(self.timeout_secs)
                } else {
                    AiError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AiError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .map_err(|e| AiError::ResponseParsing(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AiError::EmptyResponse)
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Mock LLM client for testing. Returns a configurable response and
/// records every prompt it receives.
pub struct MockLlmClient {
    outcome: MockOutcome,
    with_credential: bool,
    calls: Mutex<Vec<(String, String)>>,
}

enum MockOutcome {
    Respond(String),
    Fail { status: u16, body: String },
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            outcome: MockOutcome::Respond(response.to_string()),
            with_credential: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A client whose every call fails with a service error.
    pub fn failing(status: u16, body: &str) -> Self {
        Self {
            outcome: MockOutcome::Fail {
                status,
                body: body.to_string(),
            },
            with_credential: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn without_credential(mut self) -> Self {
        self.with_credential = false;
        self
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// `(system, prompt)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl LlmClient for MockLlmClient {
    fn complete(&self, system: &str, prompt: &str) -> Result<String, AiError> {
        if !self.with_credential {
            return Err(AiError::MissingCredential);
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((system.to_string(), prompt.to_string()));
        }
        match &self.outcome {
            MockOutcome::Respond(text) => Ok(text.clone()),
            MockOutcome::Fail { status, body } => Err(AiError::Service {
                status: *status,
                body: body.clone(),
            }),
        }
    }

    fn has_credential(&self) -> bool {
        self.with_credential
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_client_returns_configured_response() {
        let client = MockLlmClient::new("test response");
        assert_eq!(client.complete("system", "prompt").unwrap(), "test response");
        assert_eq!(client.call_count(), 1);
        assert_eq!(client.calls()[0], ("system".to_string(), "prompt".to_string()));
    }

    #[test]
    fn failing_mock_returns_service_error() {
        let client = MockLlmClient::failing(503, "overloaded");
        match client.complete("s", "p").unwrap_err() {
            AiError::Service { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn mock_without_credential_never_records_a_call() {
        let client = MockLlmClient::new("x").without_credential();
        assert!(matches!(
            client.complete("s", "p"),
            Err(AiError::MissingCredential)
        ));
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn openai_client_trims_trailing_slash() {
        let client = OpenAiClient::new("https://api.openai.com/v1/", None, "gpt-4o", 30).unwrap();
        assert_eq!(client.base_url, "https://api.openai.com/v1");
        assert_eq!(client.timeout_secs, 30);
        assert_eq!(client.model(), "gpt-4o");
    }

    #[test]
    fn openai_client_without_key_fails_before_network() {
        // Unroutable base URL: a network attempt would surface as Connection.
        let client = OpenAiClient::new("http://127.0.0.1:9", None, "gpt-4o", 1).unwrap();
        assert!(!client.has_credential());
        assert!(matches!(
            client.complete("s", "p"),
            Err(AiError::MissingCredential)
        ));
    }

    #[test]
    fn from_config_copies_settings() {
        let config = AppConfig {
            api_key: Some("sk-test".into()),
            model: "gpt-4o-mini".into(),
            ..AppConfig::default()
        };
        let client = OpenAiClient::from_config(&config).unwrap();
        assert!(client.has_credential());
        assert_eq!(client.model(), "gpt-4o-mini");
        assert_eq!(client.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn chat_request_serializes_roles() {
        let body = ChatCompletionRequest {
            model: "gpt-4o",
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn chat_response_parses_content() {
        let raw = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Merhaba"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("Merhaba"));
    }
}
