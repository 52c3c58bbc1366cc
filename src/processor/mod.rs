//! Processors - executing generated SQL against a database
//!
//! A [`Processor`] owns one connection (or none, for [`ScriptProcessor`]), the
//! [`Generator`] for its dialect and the [`ExecutionOptions`] of the run. It is the
//! only place where SQL reaches an engine.
//!
//! Transactions are begun lazily: the first executed statement opens one when
//! [`TransactionMode::Automatic`] is configured, and `commit`/`rollback` close it.
//! Nothing is begun in preview-only mode.

pub mod factory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod script;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use factory::{FactoryRegistry, ProcessorFactory};
#[cfg(feature = "postgres")]
pub use postgres::PostgresProcessor;
pub use script::ScriptProcessor;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteProcessor;

use crate::expression::ChangeExpression;
use crate::generator::{Generator, Statement};
use crate::migration::MigrationError;
use serde::Deserialize;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Processor error type
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    /// `PostgreSQL` error from `may_postgres`
    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] may_postgres::Error),

    /// SQLite error from `rusqlite`
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("{0}")]
    Other(String),
}

/// Who owns transaction boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionMode {
    /// The runner commits after a successful batch and rolls back on failure
    #[default]
    Automatic,
    /// The caller begins, commits and rolls back through the processor
    Manual,
}

/// Per-run execution settings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionOptions {
    /// Generate and log SQL without executing anything
    pub preview_only: bool,
    /// Record failing statements and keep going
    pub silent_fail: bool,
    /// Statement timeout, where the engine supports one
    pub timeout_seconds: Option<u64>,
    pub transaction_mode: TransactionMode,
}

impl ExecutionOptions {
    #[must_use]
    pub fn preview() -> Self {
        Self {
            preview_only: true,
            ..Self::default()
        }
    }

    /// Whether the processor should open a transaction before executing
    #[must_use]
    pub fn begins_transactions(&self) -> bool {
        !self.preview_only && self.transaction_mode == TransactionMode::Automatic
    }
}

/// Executes SQL for one dialect
///
/// Implementors provide raw access to the engine; [`Processor::execute`] and
/// [`Processor::process`] layer logging, preview suppression and error wrapping on
/// top.
pub trait Processor {
    fn options(&self) -> &ExecutionOptions;

    fn generator(&self) -> &Generator;

    /// Execute one statement, beginning a transaction first if one is due
    ///
    /// # Errors
    ///
    /// Returns `ProcessorError` if the engine rejects the statement.
    fn execute_raw(&mut self, sql: &str) -> Result<(), ProcessorError>;

    /// Run a query and read the first column of every row as `i64`
    ///
    /// # Errors
    ///
    /// Returns `ProcessorError` if the query fails or a value is not an integer.
    fn read_i64s(&mut self, sql: &str) -> Result<Vec<i64>, ProcessorError>;

    /// Check whether a table exists
    ///
    /// # Errors
    ///
    /// Returns `ProcessorError` if the catalog query fails.
    fn table_exists(&mut self, schema: Option<&str>, table: &str) -> Result<bool, ProcessorError>;

    /// Commit the open transaction, if any
    ///
    /// # Errors
    ///
    /// Returns `ProcessorError` if the commit fails.
    fn commit(&mut self) -> Result<(), ProcessorError>;

    /// Roll back the open transaction, if any
    ///
    /// # Errors
    ///
    /// Returns `ProcessorError` if the rollback fails.
    fn rollback(&mut self) -> Result<(), ProcessorError>;

    /// Execute one statement, or only log it in preview-only mode
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Execution` carrying the failing SQL.
    fn execute(&mut self, sql: &str) -> Result<(), MigrationError> {
        log::info!("{sql}");
        if self.options().preview_only {
            return Ok(());
        }

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_statement_span(sql).entered();

        self.execute_raw(sql).map_err(|source| MigrationError::Execution {
            sql: sql.to_string(),
            source,
        })
    }

    /// Generate and execute one expression
    ///
    /// Notices from loose compatibility mode are logged as warnings.
    ///
    /// # Errors
    ///
    /// Returns generation errors as-is and the first failing statement as
    /// `MigrationError::Execution`.
    fn process(&mut self, expression: &ChangeExpression) -> Result<(), MigrationError> {
        let statements = self.generator().generate(expression)?;
        for statement in statements {
            match statement {
                Statement::Sql(sql) => self.execute(&sql)?,
                Statement::Notice(message) => log::warn!("{expression}: {message}"),
            }
        }
        Ok(())
    }
}

impl<P: Processor + ?Sized> Processor for Box<P> {
    fn options(&self) -> &ExecutionOptions {
        (**self).options()
    }

    fn generator(&self) -> &Generator {
        (**self).generator()
    }

    fn execute_raw(&mut self, sql: &str) -> Result<(), ProcessorError> {
        (**self).execute_raw(sql)
    }

    fn read_i64s(&mut self, sql: &str) -> Result<Vec<i64>, ProcessorError> {
        (**self).read_i64s(sql)
    }

    fn table_exists(&mut self, schema: Option<&str>, table: &str) -> Result<bool, ProcessorError> {
        (**self).table_exists(schema, table)
    }

    fn commit(&mut self) -> Result<(), ProcessorError> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<(), ProcessorError> {
        (**self).rollback()
    }

    fn execute(&mut self, sql: &str) -> Result<(), MigrationError> {
        (**self).execute(sql)
    }

    fn process(&mut self, expression: &ChangeExpression) -> Result<(), MigrationError> {
        (**self).process(expression)
    }
}
