//! Plain text-completion client for locally served models.
//!
//! Targets the `/v1/completions` route exposed by llama.cpp, vLLM and
//! similar servers: one prompt in, one continuation out.

use super::client::api_failure;
use crate::error::{EvalError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

/// Client for a local completion server.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    api_base: String,
    model: String,
}

impl CompletionClient {
    pub fn new(api_base: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/completions", self.api_base.trim_end_matches('/'))
    }

    /// Generate a continuation of `prompt`.
    pub async fn generate(
        &self,
        prompt: &str,
        max_new_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens: max_new_tokens,
            temperature,
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(api_failure(status, &body));
        }

        let completion: CompletionResponse = serde_json::from_str(&body)
            .map_err(|e| EvalError::AdapterCall(format!("Malformed completion: {}", e)))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or_else(|| EvalError::AdapterCall("No choices in response".to_string()))?;

        debug!(model = %self.model, output = %text, "text completion");
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let client = CompletionClient::new("http://localhost:8080/", "llama-2-7b");
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/completions");
    }

    #[test]
    fn test_request_shape() {
        let request = CompletionRequest {
            model: "llama-2-7b",
            prompt: "Your mark:",
            max_tokens: 32,
            temperature: 0.2,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["max_tokens"], 32);
        assert_eq!(json["prompt"], "Your mark:");
    }
}
