pub mod generator;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod sanitizer;

#[cfg(test)]
pub(crate) mod testing;

pub use generator::SqlGenerator;
pub use orchestrator::{Orchestrator, QueryOutcome};
pub use parser::extract_sql;
pub use prompt::build_sanitizer_prompt;
pub use sanitizer::SqlSanitizer;
