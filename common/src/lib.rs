pub mod agent;
pub mod config;
pub mod conversation;
pub mod db;
pub mod error;
pub mod llm;
pub mod schema;
pub mod tracing;

pub use error::{IplSqlError, Result};
