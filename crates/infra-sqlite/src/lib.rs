// pushbridge Infrastructure - SQLite Adapter
// Implements: ExecutionEngine (engine inbox)

mod connection;
mod execution_engine;
mod migration;

pub use connection::create_pool;
pub use execution_engine::{InboxJob, InboxState, SqliteExecutionEngine};
pub use migration::run_migrations;

// Note: sqlx::Error conversion is handled by wrapping in helper functions
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
