//! Payloads of the individual change operations

use super::definitions::{
    ColumnDefinition, ConstraintKind, DataRow, DefaultValue, ForeignKeyDefinition,
    IndexDefinition, TableName,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateSchema {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteSchema {
    pub name: String,
}

/// Create a table with its columns
///
/// Columns flagged `primary_key` form the table's primary key. When more than one
/// column is flagged, a composite key named `primary_key_name` is emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub table: TableName,
    pub columns: Vec<ColumnDefinition>,
    pub primary_key_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteTable {
    pub table: TableName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenameTable {
    pub table: TableName,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateColumn {
    pub table: TableName,
    pub column: ColumnDefinition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteColumn {
    pub table: TableName,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenameColumn {
    pub table: TableName,
    pub old_name: String,
    pub new_name: String,
}

/// Change the type, nullability or default of an existing column
#[derive(Debug, Clone, PartialEq)]
pub struct AlterColumn {
    pub table: TableName,
    pub column: ColumnDefinition,
}

/// Replace the default of a column
///
/// `default: None` removes the current default.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterDefaultConstraint {
    pub table: TableName,
    pub column: String,
    pub default: Option<DefaultValue>,
    /// Name of the constraint created for the new default (SQL Server)
    pub constraint_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndex {
    pub index: IndexDefinition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteIndex {
    pub table: TableName,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateForeignKey {
    pub foreign_key: ForeignKeyDefinition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteForeignKey {
    pub table: TableName,
    pub name: String,
}

/// Add a primary key or unique constraint
#[derive(Debug, Clone, PartialEq)]
pub struct CreateConstraint {
    pub table: TableName,
    /// Empty until conventions assign a name
    pub name: String,
    pub kind: ConstraintKind,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteConstraint {
    pub table: TableName,
    pub name: String,
    pub kind: ConstraintKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertData {
    pub table: TableName,
    pub rows: Vec<DataRow>,
}

/// Delete rows matching every column/value pair of a row, or all rows
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteData {
    pub table: TableName,
    pub rows: Vec<DataRow>,
    pub all_rows: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteSql {
    pub sql: String,
}
