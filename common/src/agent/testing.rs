//! Scripted stand-ins for the model and the store.

use crate::db::{QueryError, QueryExecutor, ResultSet};
use crate::error::{IplSqlError, Result};
use crate::llm::{ChatModel, Message};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// answers from a queue and records every request it saw
#[derive(Default)]
pub(crate) struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    pub(crate) fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        let model = Self::default();
        model.push_err(message);
        model
    }

    pub(crate) fn push_err(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(IplSqlError::Model(message.to_string())));
    }

    pub(crate) fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        self.calls.lock().unwrap().push(messages);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(IplSqlError::Model("no scripted reply left".to_string())))
    }
}

/// replies with the last user message, i.e. a sanitizer that changes nothing
pub(crate) struct EchoModel;

#[async_trait]
impl ChatModel for EchoModel {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        Ok(messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default())
    }
}

/// executor with queued outcomes that records the sql it was asked to run
#[derive(Default)]
pub(crate) struct ScriptedExecutor {
    outcomes: Mutex<VecDeque<std::result::Result<ResultSet, QueryError>>>,
    executed: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub(crate) fn new(
        outcomes: impl IntoIterator<Item = std::result::Result<ResultSet, QueryError>>,
    ) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn execute(&self, sql: &str) -> std::result::Result<ResultSet, QueryError> {
        self.executed.lock().unwrap().push(sql.to_string());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(QueryError::new("no scripted outcome left")))
    }
}
