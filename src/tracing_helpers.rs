//! Tracing spans for migrations and executed statements

use tracing::Span;

/// Span covering one migration in one direction
pub fn migration_span(version: i64, name: &str, direction: &str) -> Span {
    tracing::info_span!("tidemark.migration", version, name, direction)
}

/// Span covering one executed statement
pub fn execute_statement_span(sql: &str) -> Span {
    tracing::debug_span!("tidemark.execute", db.statement = sql)
}

/// Span covering a whole runner operation such as `migrate_up`
pub fn runner_span(operation: &'static str) -> Span {
    tracing::info_span!("tidemark.runner", operation)
}
