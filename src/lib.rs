//! # Tidemark
//!
//! Dialect-aware schema migrations. Migrations describe their changes as
//! dialect-neutral [`expression::ChangeExpression`]s; a [`generator::Generator`]
//! renders them to SQL for MySQL, PostgreSQL, SQLite or SQL Server, and a
//! [`migration::MigrationRunner`] applies them through a [`processor::Processor`]
//! while keeping a versioned ledger in the database.
//!
//! ```rust
//! use tidemark::expression::{ChangeExpression, RenameColumn};
//! use tidemark::generator::Generator;
//!
//! let rename: ChangeExpression = RenameColumn {
//!     table: "Users".into(),
//!     old_name: "Name".into(),
//!     new_name: "FullName".into(),
//! }
//! .into();
//!
//! let sql = Generator::sqlite().generate_sql(&rename).unwrap();
//! assert_eq!(sql, "ALTER TABLE \"Users\" RENAME COLUMN \"Name\" TO \"FullName\";");
//! ```

pub mod config;
pub mod expression;
pub mod generator;
pub mod migration;
pub mod processor;
#[cfg(feature = "tracing")]
pub mod tracing_helpers;

pub use config::RunnerConfig;
pub use generator::{Dialect, Generator};
pub use migration::{Migration, MigrationError, MigrationRegistry, MigrationRunner, SchemaManager};
pub use processor::{ExecutionOptions, Processor};
