use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use common::config::{
    ModelConfig, PipelineConfig, ServerConfig, DEFAULT_BASE_URL, DEFAULT_DATABASE, DEFAULT_HOST,
    DEFAULT_MODEL, DEFAULT_MODEL_TIMEOUT_SECS, DEFAULT_PORT, DEFAULT_SESSION_IDLE_SECS,
    DEFAULT_STORE_TIMEOUT_SECS,
};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "iplsql")]
#[command(about = "ask questions about IPL cricket statistics in plain english", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the query API over HTTP
    Serve {
        /// Address to bind
        #[arg(long, env = "IPLSQL_HOST", default_value = DEFAULT_HOST)]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Seconds a conversation may sit idle before it is forgotten
        #[arg(long, env = "IPLSQL_SESSION_IDLE_SECS", default_value_t = DEFAULT_SESSION_IDLE_SECS)]
        session_idle_secs: u64,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Answer a single question and print the sql and rows as json
    Ask {
        /// The question, e.g. "Find the matches with the highest aggregate score."
        prompt: String,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct PipelineArgs {
    /// SQLite database with the IPL dataset
    #[arg(short, long, env = "IPLSQL_DATABASE", default_value = DEFAULT_DATABASE)]
    database: PathBuf,

    /// API key for the chat-completion service
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Chat model name
    #[arg(long, env = "IPLSQL_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "IPLSQL_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Seconds to wait for each model call
    #[arg(long, env = "IPLSQL_MODEL_TIMEOUT_SECS", default_value_t = DEFAULT_MODEL_TIMEOUT_SECS)]
    model_timeout_secs: u64,

    /// Seconds to wait for each database query
    #[arg(long, env = "IPLSQL_STORE_TIMEOUT_SECS", default_value_t = DEFAULT_STORE_TIMEOUT_SECS)]
    store_timeout_secs: u64,

    /// Only send the last N prompts of a conversation to the model
    #[arg(long, env = "IPLSQL_HISTORY_TURNS")]
    history_turns: Option<NonZeroUsize>,
}

impl PipelineArgs {
    fn model_config(&self) -> Result<ModelConfig> {
        let base = ModelConfig::from_env(self.api_key.clone())
            .context("an API key is required (set GROQ_API_KEY or pass --api-key)")?;
        Ok(ModelConfig {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            ..base
        })
    }

    fn pipeline_config(&self, session_idle_secs: u64) -> PipelineConfig {
        PipelineConfig {
            history_turns: self.history_turns.map(NonZeroUsize::get),
            model_timeout: Duration::from_secs(self.model_timeout_secs),
            store_timeout: Duration::from_secs(self.store_timeout_secs),
            session_idle: Duration::from_secs(session_idle_secs),
        }
    }
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        use common::tracing::init_tracing;

        let _guard = init_tracing("iplsql")?;

        match self.command {
            Commands::Serve {
                host,
                port,
                session_idle_secs,
                pipeline,
            } => {
                let config = ServerConfig {
                    host,
                    port,
                    database: pipeline.database.clone(),
                    model: pipeline.model_config()?,
                    pipeline: pipeline.pipeline_config(session_idle_secs),
                };
                serve(config).await
            }
            Commands::Ask { prompt, pipeline } => {
                let model = pipeline.model_config()?;
                let config = pipeline.pipeline_config(DEFAULT_SESSION_IDLE_SECS);
                ask(&pipeline.database, model, config, &prompt).await
            }
        }
    }
}

struct Pipeline {
    orchestrator: common::agent::Orchestrator,
    schema: std::sync::Arc<common::schema::SchemaContext>,
}

fn build_pipeline(
    database: &std::path::Path,
    model: ModelConfig,
    config: &PipelineConfig,
) -> Result<Pipeline> {
    use common::agent::Orchestrator;
    use common::conversation::SessionStore;
    use common::db::SqliteStore;
    use common::llm::GroqClient;
    use common::schema::SchemaContext;
    use std::sync::Arc;

    let schema = Arc::new(SchemaContext::ipl());
    tracing::info!(
        schema_version = schema.version(),
        tables = schema.tables().len(),
        "schema context loaded"
    );

    let store = SqliteStore::open(database, config.store_timeout)
        .with_context(|| format!("failed to open database {}", database.display()))?;
    let client = GroqClient::new(model)?;
    let sessions = Arc::new(SessionStore::new(config.session_idle));

    let orchestrator = Orchestrator::new(
        Arc::new(client),
        Arc::new(store),
        Arc::clone(&schema),
        sessions,
        config,
    );

    Ok(Pipeline {
        orchestrator,
        schema,
    })
}

async fn serve(config: ServerConfig) -> Result<()> {
    use crate::server::{self, AppState};
    use actix_web::web;
    use common::conversation::spawn_eviction;
    use std::sync::Arc;

    let Pipeline {
        orchestrator,
        schema,
    } = build_pipeline(&config.database, config.model.clone(), &config.pipeline)?;

    // sweep a few times per idle window
    let sweep_every = (config.pipeline.session_idle / 4).max(Duration::from_secs(1));
    let eviction = spawn_eviction(Arc::clone(orchestrator.sessions()), sweep_every);

    let state = web::Data::new(AppState {
        orchestrator,
        schema,
    });

    let (host, port) = config.bind_address();
    let result = server::serve(state, &host, port).await;

    eviction.abort();
    result.context("http server failed")
}

async fn ask(
    database: &std::path::Path,
    model: ModelConfig,
    config: PipelineConfig,
    prompt: &str,
) -> Result<()> {
    use common::conversation::DEFAULT_SESSION;
    use common::IplSqlError;

    let pipeline = build_pipeline(database, model, &config)?;

    match pipeline.orchestrator.run(DEFAULT_SESSION, prompt, true).await {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(IplSqlError::Execution {
            message,
            original_sql,
        }) => Err(anyhow::anyhow!(
            "query failed after repair: {}\nfirst attempted sql: {}",
            message,
            original_sql
        )),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ask_parses_defaults() {
        let cli = Cli::try_parse_from(["iplsql", "ask", "who won in 2008?"]).unwrap();
        match cli.command {
            Commands::Ask { prompt, pipeline } => {
                assert_eq!(prompt, "who won in 2008?");
                assert_eq!(pipeline.model, DEFAULT_MODEL);
                let config = pipeline.pipeline_config(DEFAULT_SESSION_IDLE_SECS);
                assert_eq!(config.model_timeout, Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS));
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_serve_flags() {
        let cli = Cli::try_parse_from([
            "iplsql",
            "serve",
            "--port",
            "8080",
            "--history-turns",
            "6",
            "--database",
            "ipl.sqlite",
        ])
        .unwrap();
        match cli.command {
            Commands::Serve { port, pipeline, .. } => {
                assert_eq!(port, 8080);
                assert_eq!(pipeline.history_turns, NonZeroUsize::new(6));
                assert_eq!(pipeline.database, PathBuf::from("ipl.sqlite"));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_zero_history_turns_rejected() {
        let result = Cli::try_parse_from(["iplsql", "ask", "--history-turns", "0", "who won?"]);
        assert!(result.is_err());
    }
}
