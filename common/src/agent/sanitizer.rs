use crate::agent::parser::extract_sql;
use crate::agent::prompt::build_sanitizer_prompt;
use crate::error::Result;
use crate::llm::{complete_within, ChatModel, Message};
use crate::schema::SchemaContext;
use std::sync::Arc;
use std::time::Duration;

/// One-shot, history-free correction of a candidate query against the schema.
pub struct SqlSanitizer {
    model: Arc<dyn ChatModel>,
    schema: Arc<SchemaContext>,
    timeout: Duration,
}

impl SqlSanitizer {
    pub fn new(model: Arc<dyn ChatModel>, schema: Arc<SchemaContext>, timeout: Duration) -> Self {
        Self {
            model,
            schema,
            timeout,
        }
    }

    #[tracing::instrument(skip(self, candidate, prior_error), fields(with_error = prior_error.is_some()))]
    pub async fn sanitize(&self, candidate: &str, prior_error: Option<&str>) -> Result<String> {
        let messages = vec![
            Message::system(build_sanitizer_prompt(&self.schema, prior_error)),
            Message::user(candidate),
        ];

        let reply = complete_within(self.model.as_ref(), messages, self.timeout).await?;
        let sanitized = extract_sql(&reply);

        tracing::debug!(sanitized = %sanitized, "sanitized sql");
        Ok(sanitized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{EchoModel, ScriptedModel};
    use crate::error::IplSqlError;

    fn schema() -> Arc<SchemaContext> {
        Arc::new(SchemaContext::ipl())
    }

    #[tokio::test]
    async fn test_valid_sql_passes_through_unchanged() {
        let sanitizer = SqlSanitizer::new(Arc::new(EchoModel), schema(), Duration::from_secs(5));
        let sql = "SELECT Team_Name FROM Team LIMIT 5;";

        let once = sanitizer.sanitize(sql, None).await.unwrap();
        let twice = sanitizer.sanitize(&once, None).await.unwrap();

        assert_eq!(once, sql);
        assert_eq!(twice, sql);
    }

    #[tokio::test]
    async fn test_request_has_no_history_and_carries_error() {
        let model = Arc::new(ScriptedModel::new(["```sql\nSELECT Runs_Scored FROM Batsman_Scored;\n```"]));
        let sanitizer = SqlSanitizer::new(
            Arc::clone(&model) as Arc<dyn ChatModel>,
            schema(),
            Duration::from_secs(5),
        );

        let fixed = sanitizer
            .sanitize("SELECT Runs FROM Batsman_Scored;", Some("no such column: Runs"))
            .await
            .unwrap();
        assert_eq!(fixed, "SELECT Runs_Scored FROM Batsman_Scored;");

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 2);
        assert!(calls[0][0].content.contains("no such column: Runs"));
        assert_eq!(calls[0][1], Message::user("SELECT Runs FROM Batsman_Scored;"));
    }

    #[tokio::test]
    async fn test_slow_model_times_out() {
        struct Stalled;

        #[async_trait::async_trait]
        impl ChatModel for Stalled {
            fn name(&self) -> &str {
                "stalled"
            }

            async fn complete(&self, _messages: Vec<Message>) -> Result<String> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(String::new())
            }
        }

        let sanitizer = SqlSanitizer::new(Arc::new(Stalled), schema(), Duration::from_millis(20));
        let err = sanitizer.sanitize("SELECT 1", None).await.unwrap_err();
        assert!(matches!(err, IplSqlError::Timeout(_)));
    }
}
