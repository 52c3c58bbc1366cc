//! Migration system
//!
//! This module provides the migration execution engine:
//! - the [`Migration`] trait and the [`MigrationRegistry`] holding them by version
//! - [`SchemaManager`] collecting a migration's change expressions
//! - the version ledger ([`VersionStore`])
//! - [`MigrationRunner`] applying and reverting migrations in one batch
//!
//! # Example
//!
//! ```rust,no_run
//! use tidemark::expression::{ColumnDefinition, DbType};
//! use tidemark::migration::{Migration, SchemaManager};
//!
//! pub struct CreateUsersTable;
//!
//! impl Migration for CreateUsersTable {
//!     fn name(&self) -> &str {
//!         "create_users_table"
//!     }
//!
//!     fn version(&self) -> i64 {
//!         20240120120000
//!     }
//!
//!     fn up(&self, schema: &mut SchemaManager) {
//!         schema.create_table(
//!             "users",
//!             vec![
//!                 ColumnDefinition::new("id", DbType::Int32).primary_key().identity(),
//!                 ColumnDefinition::new("email", DbType::String).not_null().unique(),
//!             ],
//!         );
//!     }
//!
//!     fn down(&self, schema: &mut SchemaManager) {
//!         schema.drop_table("users");
//!     }
//! }
//! ```

pub mod conventions;
pub mod error;
pub mod migration;
pub mod profile;
pub mod registry;
pub mod runner;
pub mod schema_manager;
pub mod startup;
pub mod status;
pub mod version_store;

pub use conventions::Conventions;
pub use error::{Direction, MigrationError};
pub use migration::Migration;
pub use profile::Profile;
pub use registry::MigrationRegistry;
pub use runner::{CaughtFailure, MigrationRunner, RunReport};
pub use schema_manager::SchemaManager;
pub use startup::startup_migrations;
pub use status::MigrationStatus;
pub use version_store::{MemoryVersionStore, SqlVersionStore, VersionStore, VersionTableMetadata};
