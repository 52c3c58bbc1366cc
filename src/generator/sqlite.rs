//! SQLite dialect
//!
//! SQLite has no `ALTER COLUMN` and cannot add or drop constraints on an existing
//! table. Unique constraints are expressed as unique indexes instead.

use super::column::{Clause, ColumnSyntax};
use super::{generic, sql, DialectSyntax, Generator, RenderTable, Statement};
use crate::expression::{operations::*, ColumnDefinition, ConstraintKind, DbType};
use crate::migration::MigrationError;

pub(crate) static SYNTAX: DialectSyntax = DialectSyntax {
    create_schema: None,
    drop_schema: None,
    rename_table: Some("ALTER TABLE {table} RENAME TO {new_name}"),
    add_column: "ALTER TABLE {table} ADD COLUMN {column}",
    drop_column: "ALTER TABLE {table} DROP COLUMN {column}",
    alter_column: None,
    drop_index: "DROP INDEX {name}",
    drop_foreign_key: None,
    drop_unique: None,
    drop_primary_key: None,
    add_constraint: false,
    pluggable_engines: false,
    schema_scoped_indexes: true,
};

pub(crate) static COLUMNS: ColumnSyntax = ColumnSyntax {
    type_map,
    clauses: &[
        Clause::Type,
        Clause::PrimaryKey,
        Clause::Identity,
        Clause::Nullability,
        Clause::Default,
        Clause::Unique,
    ],
    identity: "AUTOINCREMENT",
    identity_needs_inline_key: true,
    current_timestamp: "CURRENT_TIMESTAMP",
    new_guid: "(lower(hex(randomblob(16))))",
};

pub(crate) static RENDER: RenderTable = RenderTable {
    create_constraint,
    delete_constraint,
    ..generic::RENDER
};

fn type_map(column: &ColumnDefinition) -> String {
    match column.db_type {
        DbType::AnsiString
        | DbType::String
        | DbType::FixedString
        | DbType::Text
        | DbType::Guid
        | DbType::Json => "TEXT",
        DbType::Boolean | DbType::Byte | DbType::Int16 | DbType::Int32 | DbType::Int64 => {
            "INTEGER"
        }
        DbType::Decimal => "NUMERIC",
        DbType::Float | DbType::Double => "REAL",
        DbType::Date => "DATE",
        DbType::Time => "TIME",
        DbType::DateTime | DbType::DateTimeOffset => "DATETIME",
        DbType::Binary => "BLOB",
    }
    .to_string()
}

fn create_constraint(g: &Generator, e: &CreateConstraint) -> Result<Vec<Statement>, MigrationError> {
    match e.kind {
        ConstraintKind::Unique => sql(format!(
            "CREATE UNIQUE INDEX {} ON {} ({})",
            g.quoter().quote_table_name(e.table.schema.as_deref(), &e.name),
            g.quote(&e.table.name),
            g.quote_list(&e.columns)
        )),
        ConstraintKind::PrimaryKey => g.unsupported_kind("Adding a primary key"),
    }
}

fn delete_constraint(g: &Generator, e: &DeleteConstraint) -> Result<Vec<Statement>, MigrationError> {
    match e.kind {
        ConstraintKind::Unique => sql(format!(
            "DROP INDEX {}",
            g.quoter().quote_table_name(e.table.schema.as_deref(), &e.name)
        )),
        ConstraintKind::PrimaryKey => g.unsupported_kind("Dropping a primary key"),
    }
}
