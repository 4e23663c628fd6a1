use crate::conversation::ConversationState;
use crate::error::Result;
use crate::llm::{complete_within, ChatModel, Message};
use crate::schema::SchemaContext;
use std::sync::Arc;
use std::time::Duration;

/// Turns the conversation so far plus a new prompt into candidate sql.
pub struct SqlGenerator {
    model: Arc<dyn ChatModel>,
    schema: Arc<SchemaContext>,
    history_turns: Option<usize>,
    timeout: Duration,
}

impl SqlGenerator {
    pub fn new(model: Arc<dyn ChatModel>, schema: Arc<SchemaContext>, timeout: Duration) -> Self {
        Self {
            model,
            schema,
            history_turns: None,
            timeout,
        }
    }

    /// only send the last `turns` prompts instead of the whole conversation
    pub fn with_history_turns(mut self, turns: Option<usize>) -> Self {
        self.history_turns = turns;
        self
    }

    /// Record `prompt` in the conversation and ask the model for sql.
    ///
    /// The prompt stays in the conversation even when the model call fails.
    #[tracing::instrument(skip(self, conversation, prompt), fields(prompt_len = prompt.len(), history = conversation.len()))]
    pub async fn generate(
        &self,
        conversation: &mut ConversationState,
        prompt: &str,
    ) -> Result<String> {
        conversation.append(prompt);

        let history = conversation.recent(self.history_turns);
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(self.schema.system_prompt()));
        messages.extend(history);

        let reply = complete_within(self.model.as_ref(), messages, self.timeout).await?;
        let candidate = reply.trim().to_string();

        tracing::debug!(model = self.model.name(), candidate = %candidate, "model proposed sql");
        Ok(candidate)
    }
}
