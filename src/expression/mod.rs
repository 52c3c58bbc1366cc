//! Dialect-neutral schema and data change expressions
//!
//! A [`ChangeExpression`] describes one operation (create a table, rename a column,
//! insert a row, ...). Migrations collect expressions through a
//! [`SchemaManager`](crate::migration::SchemaManager); the runner applies naming
//! conventions, validates them and hands them to a dialect
//! [`Generator`](crate::generator::Generator).

pub mod definitions;
pub mod operations;

pub use definitions::{
    ColumnDefinition, ConstraintKind, DataRow, DbType, DefaultValue, ForeignKeyDefinition,
    IndexColumn, IndexDefinition, Rule, SortDirection, TableName, Value,
};
pub use operations::*;

use crate::migration::MigrationError;
use std::fmt;

/// One schema or data change
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeExpression {
    CreateSchema(CreateSchema),
    DeleteSchema(DeleteSchema),
    CreateTable(CreateTable),
    DeleteTable(DeleteTable),
    RenameTable(RenameTable),
    CreateColumn(CreateColumn),
    DeleteColumn(DeleteColumn),
    RenameColumn(RenameColumn),
    AlterColumn(AlterColumn),
    AlterDefaultConstraint(AlterDefaultConstraint),
    CreateIndex(CreateIndex),
    DeleteIndex(DeleteIndex),
    CreateForeignKey(CreateForeignKey),
    DeleteForeignKey(DeleteForeignKey),
    CreateConstraint(CreateConstraint),
    DeleteConstraint(DeleteConstraint),
    InsertData(InsertData),
    DeleteData(DeleteData),
    ExecuteSql(ExecuteSql),
}

macro_rules! expression_from {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for ChangeExpression {
                fn from(payload: $variant) -> Self {
                    ChangeExpression::$variant(payload)
                }
            }
        )*

        impl ChangeExpression {
            /// Name of the operation kind, e.g. `"RenameColumn"`
            #[must_use]
            pub fn kind(&self) -> &'static str {
                match self {
                    $(ChangeExpression::$variant(_) => stringify!($variant),)*
                }
            }
        }
    };
}

expression_from!(
    CreateSchema,
    DeleteSchema,
    CreateTable,
    DeleteTable,
    RenameTable,
    CreateColumn,
    DeleteColumn,
    RenameColumn,
    AlterColumn,
    AlterDefaultConstraint,
    CreateIndex,
    DeleteIndex,
    CreateForeignKey,
    DeleteForeignKey,
    CreateConstraint,
    DeleteConstraint,
    InsertData,
    DeleteData,
    ExecuteSql,
);

impl ChangeExpression {
    /// Whether the runner times this expression in aggregate with other inserts
    #[must_use]
    pub fn is_bulk_insert(&self) -> bool {
        matches!(self, ChangeExpression::InsertData(_))
    }

    /// Check the expression for structural problems
    ///
    /// Runs after conventions have been applied, so generated names are already
    /// filled in when this is called by the runner.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::InvalidExpression` naming the offending field.
    pub fn validate(&self) -> Result<(), MigrationError> {
        let invalid = |reason: &str| {
            Err(MigrationError::InvalidExpression {
                kind: self.kind(),
                reason: reason.to_string(),
            })
        };

        match self {
            ChangeExpression::CreateSchema(CreateSchema { name })
            | ChangeExpression::DeleteSchema(DeleteSchema { name }) => {
                if name.is_empty() {
                    return invalid("schema name is empty");
                }
            }
            ChangeExpression::CreateTable(e) => {
                check_table(&e.table).or_else(|r| invalid(r))?;
                if e.columns.is_empty() {
                    return invalid("table has no columns");
                }
                if e.columns.iter().any(|c| c.name.is_empty()) {
                    return invalid("column name is empty");
                }
            }
            ChangeExpression::DeleteTable(DeleteTable { table }) => {
                check_table(table).or_else(|r| invalid(r))?;
            }
            ChangeExpression::RenameTable(e) => {
                check_table(&e.table).or_else(|r| invalid(r))?;
                if e.new_name.is_empty() {
                    return invalid("new table name is empty");
                }
            }
            ChangeExpression::CreateColumn(CreateColumn { table, column })
            | ChangeExpression::AlterColumn(AlterColumn { table, column }) => {
                check_table(table).or_else(|r| invalid(r))?;
                if column.name.is_empty() {
                    return invalid("column name is empty");
                }
            }
            ChangeExpression::DeleteColumn(e) => {
                check_table(&e.table).or_else(|r| invalid(r))?;
                if e.columns.is_empty() || e.columns.iter().any(String::is_empty) {
                    return invalid("no column names given");
                }
            }
            ChangeExpression::RenameColumn(e) => {
                check_table(&e.table).or_else(|r| invalid(r))?;
                if e.old_name.is_empty() || e.new_name.is_empty() {
                    return invalid("column name is empty");
                }
            }
            ChangeExpression::AlterDefaultConstraint(e) => {
                check_table(&e.table).or_else(|r| invalid(r))?;
                if e.column.is_empty() {
                    return invalid("column name is empty");
                }
            }
            ChangeExpression::CreateIndex(CreateIndex { index }) => {
                check_table(&index.table).or_else(|r| invalid(r))?;
                if index.name.is_empty() {
                    return invalid("index name is empty");
                }
                if index.columns.is_empty() {
                    return invalid("index has no columns");
                }
            }
            ChangeExpression::DeleteIndex(DeleteIndex { table, name })
            | ChangeExpression::DeleteForeignKey(DeleteForeignKey { table, name }) => {
                check_table(table).or_else(|r| invalid(r))?;
                if name.is_empty() {
                    return invalid("name is empty");
                }
            }
            ChangeExpression::CreateForeignKey(CreateForeignKey { foreign_key: fk }) => {
                check_table(&fk.foreign_table).or_else(|r| invalid(r))?;
                check_table(&fk.primary_table).or_else(|r| invalid(r))?;
                if fk.name.is_empty() {
                    return invalid("foreign key name is empty");
                }
                if fk.foreign_columns.is_empty() {
                    return invalid("foreign key has no columns");
                }
                if fk.foreign_columns.len() != fk.primary_columns.len() {
                    return invalid("foreign and primary column counts differ");
                }
            }
            ChangeExpression::CreateConstraint(e) => {
                check_table(&e.table).or_else(|r| invalid(r))?;
                if e.name.is_empty() {
                    return invalid("constraint name is empty");
                }
                if e.columns.is_empty() {
                    return invalid("constraint has no columns");
                }
            }
            ChangeExpression::DeleteConstraint(e) => {
                check_table(&e.table).or_else(|r| invalid(r))?;
                if e.name.is_empty() {
                    return invalid("constraint name is empty");
                }
            }
            ChangeExpression::InsertData(e) => {
                check_table(&e.table).or_else(|r| invalid(r))?;
                if e.rows.is_empty() {
                    return invalid("no rows to insert");
                }
                if e.rows.iter().any(DataRow::is_empty) {
                    return invalid("insert row has no values");
                }
            }
            ChangeExpression::DeleteData(e) => {
                check_table(&e.table).or_else(|r| invalid(r))?;
                if !e.all_rows && (e.rows.is_empty() || e.rows.iter().any(DataRow::is_empty)) {
                    return invalid("no row filter given");
                }
            }
            ChangeExpression::ExecuteSql(ExecuteSql { sql }) => {
                if sql.trim().is_empty() {
                    return invalid("sql is empty");
                }
            }
        }
        Ok(())
    }
}

fn check_table(table: &TableName) -> Result<(), &'static str> {
    if table.name.is_empty() {
        Err("table name is empty")
    } else {
        Ok(())
    }
}

impl fmt::Display for ChangeExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeExpression::CreateSchema(e) => write!(f, "CreateSchema {}", e.name),
            ChangeExpression::DeleteSchema(e) => write!(f, "DeleteSchema {}", e.name),
            ChangeExpression::CreateTable(e) => write!(f, "CreateTable {}", e.table),
            ChangeExpression::DeleteTable(e) => write!(f, "DeleteTable {}", e.table),
            ChangeExpression::RenameTable(e) => {
                write!(f, "RenameTable {} {}", e.table, e.new_name)
            }
            ChangeExpression::CreateColumn(e) => {
                write!(f, "CreateColumn {} {}", e.table, e.column.name)
            }
            ChangeExpression::DeleteColumn(e) => {
                write!(f, "DeleteColumn {} {}", e.table, e.columns.join(", "))
            }
            ChangeExpression::RenameColumn(e) => {
                write!(f, "RenameColumn {} {} to {}", e.table, e.old_name, e.new_name)
            }
            ChangeExpression::AlterColumn(e) => {
                write!(f, "AlterColumn {} {}", e.table, e.column.name)
            }
            ChangeExpression::AlterDefaultConstraint(e) => {
                write!(f, "AlterDefaultConstraint {} {}", e.table, e.column)
            }
            ChangeExpression::CreateIndex(e) => {
                write!(f, "CreateIndex {} ({})", e.index.table, e.index.name)
            }
            ChangeExpression::DeleteIndex(e) => write!(f, "DeleteIndex {} ({})", e.table, e.name),
            ChangeExpression::CreateForeignKey(e) => write!(
                f,
                "CreateForeignKey {} {}",
                e.foreign_key.foreign_table, e.foreign_key.name
            ),
            ChangeExpression::DeleteForeignKey(e) => {
                write!(f, "DeleteForeignKey {} {}", e.table, e.name)
            }
            ChangeExpression::CreateConstraint(e) => {
                write!(f, "CreateConstraint {} {}", e.table, e.name)
            }
            ChangeExpression::DeleteConstraint(e) => {
                write!(f, "DeleteConstraint {} {}", e.table, e.name)
            }
            ChangeExpression::InsertData(e) => {
                write!(f, "InsertData {} ({} row(s))", e.table, e.rows.len())
            }
            ChangeExpression::DeleteData(e) => write!(f, "DeleteData {}", e.table),
            ChangeExpression::ExecuteSql(e) => {
                let first = e.sql.lines().next().unwrap_or_default();
                write!(f, "ExecuteSql {first}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        let expr = ChangeExpression::from(RenameColumn {
            table: "Users".into(),
            old_name: "Name".into(),
            new_name: "FullName".into(),
        });
        assert_eq!(expr.kind(), "RenameColumn");
        assert!(!expr.is_bulk_insert());
    }

    #[test]
    fn test_insert_is_bulk() {
        let expr = ChangeExpression::from(InsertData {
            table: "Users".into(),
            rows: vec![DataRow::new().set("Id", 1)],
        });
        assert!(expr.is_bulk_insert());
        assert!(expr.validate().is_ok());
        assert_eq!(expr.to_string(), "InsertData Users (1 row(s))");
    }

    #[test]
    fn test_validate_rejects_empty_table_name() {
        let expr = ChangeExpression::from(DeleteTable { table: "".into() });
        let err = expr.validate().unwrap_err();
        assert!(err.to_string().contains("table name is empty"));
    }

    #[test]
    fn test_validate_rejects_index_without_columns() {
        let expr = ChangeExpression::from(CreateIndex {
            index: IndexDefinition::new("Users").named("IX_Users"),
        });
        let err = expr.validate().unwrap_err();
        assert!(err.to_string().contains("index has no columns"));
    }

    #[test]
    fn test_validate_rejects_mismatched_foreign_key() {
        let mut fk = ForeignKeyDefinition::new("Orders", "UserId", "Users", "Id").named("FK_x");
        fk.primary_columns.push("TenantId".into());
        let expr = ChangeExpression::from(CreateForeignKey { foreign_key: fk });
        let err = expr.validate().unwrap_err();
        assert!(err.to_string().contains("column counts differ"));
    }

    #[test]
    fn test_validate_rejects_empty_insert_row() {
        let expr = ChangeExpression::from(InsertData {
            table: "Users".into(),
            rows: vec![DataRow::new()],
        });
        assert!(expr.validate().is_err());
    }

    #[test]
    fn test_delete_all_rows_needs_no_filter() {
        let expr = ChangeExpression::from(DeleteData {
            table: "Users".into(),
            rows: Vec::new(),
            all_rows: true,
        });
        assert!(expr.validate().is_ok());
    }
}
