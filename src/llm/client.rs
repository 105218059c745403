//! OpenAI-compatible chat-completion client.
//!
//! Works with any endpoint that speaks `/v1/chat/completions`, including
//! vision models that accept `image_url` content parts.

use crate::config::LlmConfig;
use crate::error::{EvalError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Message role in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// An image reference inside a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One part of a multimodal message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

/// Plain text or a list of parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }
}

/// Request body for chat completion.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

/// Response from chat completion.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI API error response.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub(crate) error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub(crate) message: String,
}

/// Turn a non-success response body into an adapter error.
pub(crate) fn api_failure(status: reqwest::StatusCode, body: &str) -> EvalError {
    if let Ok(api_error) = serde_json::from_str::<ApiError>(body) {
        return EvalError::AdapterCall(format!(
            "API error ({}): {}",
            status, api_error.error.message
        ));
    }
    EvalError::AdapterCall(format!("Request failed ({}): {}", status, body))
}

/// OpenAI-compatible LLM client.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Get the API endpoint URL.
    fn endpoint(&self) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        format!("{}/v1/chat/completions", base)
    }

    fn request<'a>(
        &'a self,
        messages: &'a [Message],
        max_tokens: u32,
        temperature: f32,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens: Some(max_tokens),
            temperature: Some(temperature),
            seed: self.config.seed,
        }
    }

    /// Send a chat completion request with the configured sampling settings.
    pub async fn chat(&self, messages: &[Message]) -> Result<String> {
        self.chat_with(messages, self.config.max_tokens, self.config.temperature)
            .await
    }

    /// Send a chat completion request and return the first choice's text.
    pub async fn chat_with(
        &self,
        messages: &[Message],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let request = self.request(messages, max_tokens, temperature);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_failure(status, &body));
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| EvalError::AdapterCall(format!("Malformed completion: {}", e)))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| EvalError::AdapterCall("No choices in response".to_string()))?;

        debug!(model = %self.config.model, output = %content, "chat completion");
        Ok(content)
    }

    /// Convenience method: single user message with optional system prompt.
    pub async fn complete(&self, system: Option<&str>, user: &str) -> Result<String> {
        let mut messages = Vec::new();

        if let Some(sys) = system {
            messages.push(Message::system(sys));
        }
        messages.push(Message::user(user));

        self.chat(&messages).await
    }

    /// Test connectivity to the API.
    pub async fn test_connection(&self) -> Result<()> {
        let response = self
            .complete(None, "Say 'hello' and nothing else.")
            .await?;

        if response.to_lowercase().contains("hello") {
            Ok(())
        } else {
            Err(EvalError::AdapterCall(format!(
                "Unexpected response: {}",
                response
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_base: &str) -> LlmConfig {
        LlmConfig {
            api_base: api_base.to_string(),
            api_key: "test".to_string(),
            model: "gpt-4o".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_endpoint_construction() {
        let client = LlmClient::new(config("https://api.example.com/"));
        assert_eq!(client.endpoint(), "https://api.example.com/v1/chat/completions");

        let client2 = LlmClient::new(config("https://api.example.com"));
        assert_eq!(client2.endpoint(), "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn test_request_carries_seed() {
        let mut cfg = config("https://api.example.com");
        cfg.seed = Some(1234);
        let client = LlmClient::new(cfg);
        let messages = vec![Message::user("hi")];

        let json = serde_json::to_value(client.request(&messages, 32, 0.2)).unwrap();
        assert_eq!(json["seed"], 1234);
        assert_eq!(json["max_tokens"], 32);
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_request_omits_missing_seed() {
        let client = LlmClient::new(config("https://api.example.com"));
        let messages = vec![Message::user("hi")];

        let json = serde_json::to_value(client.request(&messages, 32, 0.2)).unwrap();
        assert!(json.get("seed").is_none());
    }

    #[test]
    fn test_multimodal_message_shape() {
        let message = Message::user_parts(vec![
            ContentPart::text("look"),
            ContentPart::image("data:image/png;base64,AAAA"),
        ]);

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][0]["text"], "look");
        assert_eq!(json["content"][1]["type"], "image_url");
        assert_eq!(json["content"][1]["image_url"]["url"], "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_api_failure_message() {
        let err = api_failure(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            r#"{"error": {"message": "rate limited", "type": "requests"}}"#,
        );
        assert_eq!(
            err.to_string(),
            "Model call failed: API error (429 Too Many Requests): rate limited"
        );
    }
}
