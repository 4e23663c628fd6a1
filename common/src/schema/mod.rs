pub mod context;
pub mod tables;

pub use context::{SchemaContext, DEFAULT_ROW_LIMIT, SCHEMA_VERSION};
pub use tables::{TableDef, IPL_TABLES};
