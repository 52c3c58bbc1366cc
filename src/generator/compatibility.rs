//! Handling of operations a dialect cannot express

use super::{Dialect, Statement};
use crate::migration::MigrationError;
use serde::Deserialize;

/// What to do when a dialect cannot render an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatibilityMode {
    /// Fail with `UnsupportedOperation`
    #[default]
    Strict,
    /// Emit a notice in place of SQL and carry on
    Loose,
}

impl CompatibilityMode {
    /// Resolve an unsupported operation
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::UnsupportedOperation` in strict mode.
    pub fn handle(self, dialect: Dialect, message: &str) -> Result<Vec<Statement>, MigrationError> {
        match self {
            CompatibilityMode::Strict => Err(MigrationError::UnsupportedOperation {
                dialect: dialect.name().to_string(),
                message: message.to_string(),
            }),
            CompatibilityMode::Loose => {
                log::warn!("{}: {}", dialect.name(), message);
                Ok(vec![Statement::Notice(message.to_string())])
            }
        }
    }
}
