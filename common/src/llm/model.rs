use crate::error::{IplSqlError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// A chat-completion backend: an ordered message list in, one text completion out.
///
/// Output is not reproducible, so the pipeline only ever talks to this trait
/// and tests substitute scripted fakes.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, messages: Vec<Message>) -> Result<String>;
}

/// `complete`, but give up after `timeout`; dropping the call cancels the in-flight request
pub async fn complete_within(
    model: &dyn ChatModel,
    messages: Vec<Message>,
    timeout: Duration,
) -> Result<String> {
    tokio::time::timeout(timeout, model.complete(messages))
        .await
        .map_err(|_| {
            IplSqlError::Timeout(format!(
                "{} did not answer within {:?}",
                model.name(),
                timeout
            ))
        })?
}
