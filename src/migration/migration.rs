//! Migration trait definition

use super::schema_manager::SchemaManager;

/// Trait that all migrations must implement
///
/// `up` and `down` only describe changes by pushing expressions into the
/// [`SchemaManager`]; the runner decides when and whether they execute. The same
/// migration value is reused across runner calls, so both methods must be pure.
pub trait Migration: Send + Sync {
    /// Get the migration version (commonly a timestamp: YYYYMMDDHHMMSS)
    fn version(&self) -> i64;

    /// Get the migration name (human-readable identifier)
    fn name(&self) -> &str;

    /// Describe the forward changes
    fn up(&self, schema: &mut SchemaManager);

    /// Describe the changes that undo `up`
    fn down(&self, schema: &mut SchemaManager);
}
