//! Remote libSQL access over the Turso HTTP pipeline protocol.

pub mod client;
pub mod error;
pub mod queries;
pub mod schema;
pub mod value;

pub use client::{SqlExecutor, Statement, StepResult, TursoClient};
pub use error::TursoError;
pub use queries::{
    DEFAULT_RUN_LIMIT, DEFAULT_RUN_MODEL, MissionStore, NewAgentRun, RunStatus, TaskFilter,
};
pub use schema::{SCHEMA_SQL, SchemaReport, executable_statements, run_schema, run_script};
pub use value::{Arg, QueryResult, Row, Value, to_rows};

#[cfg(test)]
pub(crate) mod tests;
