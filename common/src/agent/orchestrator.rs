use crate::agent::generator::SqlGenerator;
use crate::agent::sanitizer::SqlSanitizer;
use crate::config::PipelineConfig;
use crate::conversation::SessionStore;
use crate::db::{QueryExecutor, ResultSet};
use crate::error::{IplSqlError, Result};
use crate::llm::ChatModel;
use crate::schema::SchemaContext;
use serde::Serialize;
use std::sync::Arc;

/// sql that the store accepted, with its rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutcome {
    pub sql: String,
    pub rows: ResultSet,
    /// execution attempts used, 1 or 2
    #[serde(skip)]
    pub attempts: usize,
}

/// Runs a prompt through generate → sanitize → execute with a single repair.
///
/// On the first execution failure the *raw* candidate (not the first
/// sanitized one) goes back to the sanitizer together with the error text,
/// so corrections never stack on top of each other. A second failure is
/// terminal and reports the first sanitized query as `original_sql`.
pub struct Orchestrator {
    generator: SqlGenerator,
    sanitizer: SqlSanitizer,
    executor: Arc<dyn QueryExecutor>,
    sessions: Arc<SessionStore>,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn ChatModel>,
        executor: Arc<dyn QueryExecutor>,
        schema: Arc<SchemaContext>,
        sessions: Arc<SessionStore>,
        config: &PipelineConfig,
    ) -> Self {
        let generator = SqlGenerator::new(
            Arc::clone(&model),
            Arc::clone(&schema),
            config.model_timeout,
        )
        .with_history_turns(config.history_turns);
        let sanitizer = SqlSanitizer::new(model, schema, config.model_timeout);

        Self {
            generator,
            sanitizer,
            executor,
            sessions,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    #[tracing::instrument(skip(self, session_id, prompt), fields(session = %session_id))]
    pub async fn run(&self, session_id: &str, prompt: &str, reset: bool) -> Result<QueryOutcome> {
        let session = self.sessions.session(session_id).await;

        let candidate = {
            // held through generation so concurrent requests in this session
            // cannot interleave their prompts
            let mut conversation = session.lock().await;
            if reset {
                tracing::info!("resetting conversation");
                conversation.reset();
            }

            tracing::info!(stage = "generating", "generating sql");
            self.generator
                .generate(&mut conversation, prompt)
                .await
                .map_err(|e| IplSqlError::Generation(e.to_string()))?
        };

        self.repair_and_execute(&candidate).await
    }

    async fn repair_and_execute(&self, candidate: &str) -> Result<QueryOutcome> {
        tracing::info!(stage = "sanitizing_1", "sanitizing candidate");
        let first_sql = self.sanitize(candidate, None).await?;

        tracing::info!(stage = "executing_1", sql = %first_sql, "executing");
        let first_error = match self.executor.execute(&first_sql).await {
            Ok(rows) => {
                tracing::info!(stage = "done", row_count = rows.len(), "query succeeded");
                return Ok(QueryOutcome {
                    sql: first_sql,
                    rows,
                    attempts: 1,
                });
            }
            Err(e) => e,
        };

        tracing::warn!(stage = "sanitizing_2", error = %first_error, "first execution failed, repairing");
        let second_sql = self.sanitize(candidate, Some(&first_error.message)).await?;

        tracing::info!(stage = "executing_2", sql = %second_sql, "executing repaired query");
        match self.executor.execute(&second_sql).await {
            Ok(rows) => {
                tracing::info!(stage = "done", row_count = rows.len(), "repaired query succeeded");
                Ok(QueryOutcome {
                    sql: second_sql,
                    rows,
                    attempts: 2,
                })
            }
            Err(e) => {
                tracing::warn!(stage = "failed", error = %e, "repaired query failed");
                Err(IplSqlError::Execution {
                    message: e.message,
                    original_sql: first_sql,
                })
            }
        }
    }

    async fn sanitize(&self, candidate: &str, prior_error: Option<&str>) -> Result<String> {
        self.sanitizer
            .sanitize(candidate, prior_error)
            .await
            .map_err(|e| IplSqlError::Sanitization(e.to_string()))
    }
}
