use thiserror::Error;

#[derive(Error, Debug)]
pub enum IplSqlError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("sql generation failed: {0}")]
    Generation(String),

    #[error("sql sanitization failed: {0}")]
    Sanitization(String),

    #[error("sql execution failed: {message}")]
    Execution {
        message: String,
        original_sql: String,
    },

    #[error("tracing initialization failed: {0}")]
    Tracing(String),
}

pub type Result<T> = std::result::Result<T, IplSqlError>;
