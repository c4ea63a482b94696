//! OpenAI-compatible chat-completions generator

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::errors::{GenerationError, GenerationResult};
use super::prompt::{system_prompt, user_prompt};
use super::QueryGenerator;
use crate::config::GeneratorConfig;
use crate::schema::Schema;
use crate::store::StoreKind;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Calls a chat-completions endpoint and returns the first choice verbatim.
///
/// Markdown fences and surrounding prose are left in place; the sanitizer
/// removes them.
pub struct ChatCompletionGenerator {
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
    client: Client,
}

impl ChatCompletionGenerator {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            temperature: 0.0,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(&config.endpoint, &config.model, &config.api_key).with_temperature(config.temperature)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl QueryGenerator for ChatCompletionGenerator {
    async fn generate(&self, question: &str, schema: &Schema, kind: StoreKind) -> GenerationResult<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": system_prompt()},
                    {"role": "user", "content": user_prompt(question, schema, kind)}
                ],
                "temperature": self.temperature
            }))
            .send()
            .await
            .map_err(|e| GenerationError::unavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::unavailable(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::unavailable(format!("failed to parse response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(GenerationError::Empty);
        }
        debug!(model = %self.model, chars = content.len(), "generator answered");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":" SELECT 1; "}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some(" SELECT 1; "));
    }

    #[test]
    fn test_null_content_parses() {
        let body = r#"{"choices":[{"message":{"content":null}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let generator = ChatCompletionGenerator::new("http://127.0.0.1:9/v1/chat/completions", "m", "k");
        let err = generator
            .generate("show all customers", &Schema::new(), StoreKind::KeyValue)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Unavailable(_)));
    }
}
