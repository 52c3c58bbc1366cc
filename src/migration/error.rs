//! Migration-specific error types

use crate::processor::ProcessorError;
use std::fmt;

/// Direction a migration was being run in when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

/// Migration-specific errors
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// The dialect cannot express the operation and strict compatibility is on
    #[error("{dialect} does not support this operation: {message}")]
    UnsupportedOperation { dialect: String, message: String },

    /// A generated statement failed on the engine
    #[error("failed to execute `{sql}`: {source}")]
    Execution {
        sql: String,
        #[source]
        source: ProcessorError,
    },

    /// The ledger references a version no registered migration carries
    #[error("the version ledger references version {version} but no migration is registered with that version")]
    MissingMigration { version: i64 },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid {kind} expression: {reason}")]
    InvalidExpression { kind: &'static str, reason: String },

    #[error("a migration with version {version} is already registered")]
    DuplicateVersion { version: i64 },

    /// A migration failed while running in `direction`
    #[error("migration {version} failed ({direction}): {source}")]
    Failed {
        version: i64,
        direction: Direction,
        #[source]
        source: Box<MigrationError>,
    },

    /// Commit, rollback or read failure outside a single statement
    #[error(transparent)]
    Processor(#[from] ProcessorError),
}

impl MigrationError {
    /// The innermost error, looking through `Failed` wrappers
    #[must_use]
    pub fn root(&self) -> &MigrationError {
        match self {
            MigrationError::Failed { source, .. } => source.root(),
            other => other,
        }
    }

    #[must_use]
    pub fn is_missing_migration(&self) -> bool {
        matches!(self.root(), MigrationError::MissingMigration { .. })
    }

    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self.root(), MigrationError::UnsupportedOperation { .. })
    }

    pub(crate) fn failed(version: i64, direction: Direction, source: MigrationError) -> Self {
        match source {
            // Missing migrations are reported as-is; there is no migration to blame.
            MigrationError::MissingMigration { .. } => source,
            source => MigrationError::Failed {
                version,
                direction,
                source: Box::new(source),
            },
        }
    }
}
