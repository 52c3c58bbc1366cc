//! SchemaManager - collects the expressions of one migration direction

use crate::expression::*;

/// Collects change expressions in the order a migration describes them
///
/// # Example
///
/// ```rust
/// use tidemark::expression::{ColumnDefinition, DbType, IndexDefinition};
/// use tidemark::migration::SchemaManager;
///
/// let mut schema = SchemaManager::new();
/// schema
///     .create_table(
///         "Users",
///         vec![
///             ColumnDefinition::new("Id", DbType::Int32).primary_key().identity(),
///             ColumnDefinition::new("Email", DbType::String).size(255).not_null(),
///         ],
///     )
///     .create_index(IndexDefinition::new("Users").column("Email").unique());
///
/// assert_eq!(schema.expressions().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct SchemaManager {
    expressions: Vec<ChangeExpression>,
}

impl SchemaManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append any expression
    pub fn push(&mut self, expression: impl Into<ChangeExpression>) -> &mut Self {
        self.expressions.push(expression.into());
        self
    }

    pub fn create_schema(&mut self, name: impl Into<String>) -> &mut Self {
        self.push(CreateSchema { name: name.into() })
    }

    pub fn drop_schema(&mut self, name: impl Into<String>) -> &mut Self {
        self.push(DeleteSchema { name: name.into() })
    }

    /// Create a table
    ///
    /// Columns flagged as primary key form the key; with more than one, a
    /// composite constraint named by conventions is added.
    pub fn create_table(
        &mut self,
        table: impl Into<TableName>,
        columns: Vec<ColumnDefinition>,
    ) -> &mut Self {
        self.push(CreateTable {
            table: table.into(),
            columns,
            primary_key_name: None,
        })
    }

    pub fn drop_table(&mut self, table: impl Into<TableName>) -> &mut Self {
        self.push(DeleteTable { table: table.into() })
    }

    pub fn rename_table(&mut self, table: impl Into<TableName>, new_name: impl Into<String>) -> &mut Self {
        self.push(RenameTable {
            table: table.into(),
            new_name: new_name.into(),
        })
    }

    pub fn add_column(&mut self, table: impl Into<TableName>, column: ColumnDefinition) -> &mut Self {
        self.push(CreateColumn {
            table: table.into(),
            column,
        })
    }

    pub fn drop_column(&mut self, table: impl Into<TableName>, column: impl Into<String>) -> &mut Self {
        self.push(DeleteColumn {
            table: table.into(),
            columns: vec![column.into()],
        })
    }

    pub fn rename_column(
        &mut self,
        table: impl Into<TableName>,
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> &mut Self {
        self.push(RenameColumn {
            table: table.into(),
            old_name: old_name.into(),
            new_name: new_name.into(),
        })
    }

    pub fn alter_column(&mut self, table: impl Into<TableName>, column: ColumnDefinition) -> &mut Self {
        self.push(AlterColumn {
            table: table.into(),
            column,
        })
    }

    /// Replace a column's default; `None` removes it
    pub fn alter_default(
        &mut self,
        table: impl Into<TableName>,
        column: impl Into<String>,
        default: Option<DefaultValue>,
    ) -> &mut Self {
        self.push(AlterDefaultConstraint {
            table: table.into(),
            column: column.into(),
            default,
            constraint_name: None,
        })
    }

    pub fn create_index(&mut self, index: IndexDefinition) -> &mut Self {
        self.push(CreateIndex { index })
    }

    pub fn drop_index(&mut self, table: impl Into<TableName>, name: impl Into<String>) -> &mut Self {
        self.push(DeleteIndex {
            table: table.into(),
            name: name.into(),
        })
    }

    pub fn create_foreign_key(&mut self, foreign_key: ForeignKeyDefinition) -> &mut Self {
        self.push(CreateForeignKey { foreign_key })
    }

    pub fn drop_foreign_key(&mut self, table: impl Into<TableName>, name: impl Into<String>) -> &mut Self {
        self.push(DeleteForeignKey {
            table: table.into(),
            name: name.into(),
        })
    }

    pub fn create_unique_constraint(
        &mut self,
        table: impl Into<TableName>,
        columns: &[&str],
    ) -> &mut Self {
        self.push(CreateConstraint {
            table: table.into(),
            name: String::new(),
            kind: ConstraintKind::Unique,
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        })
    }

    pub fn create_primary_key(&mut self, table: impl Into<TableName>, columns: &[&str]) -> &mut Self {
        self.push(CreateConstraint {
            table: table.into(),
            name: String::new(),
            kind: ConstraintKind::PrimaryKey,
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        })
    }

    pub fn drop_constraint(
        &mut self,
        table: impl Into<TableName>,
        name: impl Into<String>,
        kind: ConstraintKind,
    ) -> &mut Self {
        self.push(DeleteConstraint {
            table: table.into(),
            name: name.into(),
            kind,
        })
    }

    /// Insert one row
    pub fn insert(&mut self, table: impl Into<TableName>, row: DataRow) -> &mut Self {
        self.push(InsertData {
            table: table.into(),
            rows: vec![row],
        })
    }

    /// Delete the rows matching every column/value pair of `row`
    pub fn delete_rows(&mut self, table: impl Into<TableName>, row: DataRow) -> &mut Self {
        self.push(DeleteData {
            table: table.into(),
            rows: vec![row],
            all_rows: false,
        })
    }

    pub fn delete_all_rows(&mut self, table: impl Into<TableName>) -> &mut Self {
        self.push(DeleteData {
            table: table.into(),
            rows: Vec::new(),
            all_rows: true,
        })
    }

    /// Execute raw SQL as-is on every dialect
    pub fn execute(&mut self, sql: impl Into<String>) -> &mut Self {
        self.push(ExecuteSql { sql: sql.into() })
    }

    pub fn expressions(&self) -> &[ChangeExpression] {
        &self.expressions
    }

    pub fn into_expressions(self) -> Vec<ChangeExpression> {
        self.expressions
    }
}
