use crate::error::{IplSqlError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATABASE: &str = "database.sqlite";
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// settings for the hosted chat-completion service
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub connect_timeout: Duration,
}

impl ModelConfig {
    /// resolve the api key from the environment when none was given explicitly
    pub fn from_env(api_key: Option<String>) -> Result<Self> {
        let api_key = api_key
            .filter(|s| !s.trim().is_empty())
            .or_else(|| env::var(API_KEY_ENV).ok().filter(|s| !s.trim().is_empty()))
            .ok_or_else(|| IplSqlError::Config(format!("{} is not set", API_KEY_ENV)))?;

        Ok(Self {
            api_key,
            ..Self::default()
        })
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

/// knobs for the generate / sanitize / execute pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// how many prior prompts to send with each generation request; None sends all of them
    pub history_turns: Option<usize>,
    pub model_timeout: Duration,
    pub store_timeout: Duration,
    pub session_idle: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            history_turns: None,
            model_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
            store_timeout: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
            session_idle: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database: PathBuf,
    pub model: ModelConfig,
    pub pipeline: PipelineConfig,
}

impl ServerConfig {
    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
