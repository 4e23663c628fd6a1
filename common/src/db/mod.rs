pub mod guard;
pub mod sqlite;

pub use guard::{classify, StatementKind};
pub use sqlite::{QueryError, QueryExecutor, ResultSet, Row, SqliteStore};
