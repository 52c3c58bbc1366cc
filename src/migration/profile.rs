//! Profiles - expressions run after every full `migrate_up`
//!
//! A profile typically seeds environment-specific data. It is not versioned and
//! never recorded in the ledger, so it must be safe to run repeatedly.

use super::schema_manager::SchemaManager;

pub trait Profile: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, schema: &mut SchemaManager);
}
