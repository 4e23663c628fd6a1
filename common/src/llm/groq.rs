use crate::config::ModelConfig;
use crate::error::{IplSqlError, Result};
use crate::llm::model::{ChatModel, Message};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
}

/// client for an openai-compatible `/chat/completions` endpoint (groq by default)
pub struct GroqClient {
    http: reqwest::Client,
    config: ModelConfig,
}

impl GroqClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(IplSqlError::Config("model api key is empty".to_string()));
        }

        // whole-request timeouts are applied per call by the pipeline
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        tracing::info!(model = %config.model, base_url = %config.base_url, "chat model client initialized");

        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatModel for GroqClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    #[tracing::instrument(skip(self, messages), fields(llm.model = %self.config.model, message_count = messages.len()))]
    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: &messages,
            temperature: self.config.temperature,
        };

        let total_chars: usize = messages.iter().map(|m| m.content.len()).sum();
        tracing::debug!("sending {} messages ({} chars)", messages.len(), total_chars);

        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| IplSqlError::Model(format!("request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err_body = resp.text().await.unwrap_or_default();
            return Err(IplSqlError::Model(format!(
                "model service returned {}: {}",
                status, err_body
            )));
        }

        let result: Value = resp
            .json()
            .await
            .map_err(|e| IplSqlError::Model(format!("failed to parse model response: {}", e)))?;

        extract_reply(&result)
    }
}

fn extract_reply(result: &Value) -> Result<String> {
    let content = result
        .pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .ok_or_else(|| IplSqlError::Model("model response had no message content".to_string()))?;

    if let Some(reason) = result.pointer("/choices/0/finish_reason").and_then(|v| v.as_str()) {
        if reason == "length" {
            tracing::warn!("model reply was truncated by the token limit");
        }
    }

    Ok(content.trim().to_string())
}
