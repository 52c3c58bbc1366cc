//! Naming conventions applied to expressions before generation
//!
//! Migrations may leave constraint and index names empty and tables unqualified;
//! conventions fill them in. Explicit names and schemas are never overridden.

use crate::expression::*;

/// Default names and the default schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conventions {
    pub default_schema: Option<String>,
}

impl Conventions {
    pub fn with_default_schema(schema: impl Into<String>) -> Self {
        Self {
            default_schema: Some(schema.into()),
        }
    }

    /// `PK_{table}`
    pub fn primary_key_name(table: &TableName) -> String {
        format!("PK_{}", table.name)
    }

    /// `FK_{foreign table}_{foreign columns}_{primary table}_{primary columns}`
    pub fn foreign_key_name(fk: &ForeignKeyDefinition) -> String {
        format!(
            "FK_{}_{}_{}_{}",
            fk.foreign_table.name,
            fk.foreign_columns.join("_"),
            fk.primary_table.name,
            fk.primary_columns.join("_")
        )
    }

    /// `IX_{table}_{columns}`
    pub fn index_name(index: &IndexDefinition) -> String {
        let columns: Vec<&str> = index.columns.iter().map(|c| c.name.as_str()).collect();
        format!("IX_{}_{}", index.table.name, columns.join("_"))
    }

    /// `UC_{table}_{columns}`
    pub fn unique_constraint_name(table: &TableName, columns: &[String]) -> String {
        format!("UC_{}_{}", table.name, columns.join("_"))
    }

    /// `DF_{table}_{column}`
    pub fn default_constraint_name(table: &TableName, column: &str) -> String {
        format!("DF_{}_{}", table.name, column)
    }

    fn table(&self, table: TableName) -> TableName {
        table.or_schema(self.default_schema.as_deref())
    }

    /// Return `expression` with missing names and schemas filled in
    #[must_use]
    pub fn apply(&self, expression: ChangeExpression) -> ChangeExpression {
        match expression {
            ChangeExpression::CreateTable(mut e) => {
                e.table = self.table(e.table);
                if e.primary_key_name.is_none() && e.columns.iter().any(|c| c.primary_key) {
                    e.primary_key_name = Some(Self::primary_key_name(&e.table));
                }
                e.into()
            }
            ChangeExpression::DeleteTable(mut e) => {
                e.table = self.table(e.table);
                e.into()
            }
            ChangeExpression::RenameTable(mut e) => {
                e.table = self.table(e.table);
                e.into()
            }
            ChangeExpression::CreateColumn(mut e) => {
                e.table = self.table(e.table);
                e.into()
            }
            ChangeExpression::DeleteColumn(mut e) => {
                e.table = self.table(e.table);
                e.into()
            }
            ChangeExpression::RenameColumn(mut e) => {
                e.table = self.table(e.table);
                e.into()
            }
            ChangeExpression::AlterColumn(mut e) => {
                e.table = self.table(e.table);
                e.into()
            }
            ChangeExpression::AlterDefaultConstraint(mut e) => {
                e.table = self.table(e.table);
                if e.constraint_name.is_none() {
                    e.constraint_name = Some(Self::default_constraint_name(&e.table, &e.column));
                }
                e.into()
            }
            ChangeExpression::CreateIndex(mut e) => {
                e.index.table = self.table(e.index.table);
                if e.index.name.is_empty() {
                    e.index.name = Self::index_name(&e.index);
                }
                e.into()
            }
            ChangeExpression::DeleteIndex(mut e) => {
                e.table = self.table(e.table);
                e.into()
            }
            ChangeExpression::CreateForeignKey(mut e) => {
                let fk = &mut e.foreign_key;
                fk.foreign_table = self.table(std::mem::replace(&mut fk.foreign_table, TableName::new("")));
                fk.primary_table = self.table(std::mem::replace(&mut fk.primary_table, TableName::new("")));
                if fk.name.is_empty() {
                    fk.name = Self::foreign_key_name(fk);
                }
                e.into()
            }
            ChangeExpression::DeleteForeignKey(mut e) => {
                e.table = self.table(e.table);
                e.into()
            }
            ChangeExpression::CreateConstraint(mut e) => {
                e.table = self.table(e.table);
                if e.name.is_empty() {
                    e.name = match e.kind {
                        ConstraintKind::PrimaryKey => Self::primary_key_name(&e.table),
                        ConstraintKind::Unique => Self::unique_constraint_name(&e.table, &e.columns),
                    };
                }
                e.into()
            }
            ChangeExpression::DeleteConstraint(mut e) => {
                e.table = self.table(e.table);
                if e.name.is_empty() && e.kind == ConstraintKind::PrimaryKey {
                    e.name = Self::primary_key_name(&e.table);
                }
                e.into()
            }
            ChangeExpression::InsertData(mut e) => {
                e.table = self.table(e.table);
                e.into()
            }
            ChangeExpression::DeleteData(mut e) => {
                e.table = self.table(e.table);
                e.into()
            }
            other @ (ChangeExpression::CreateSchema(_)
            | ChangeExpression::DeleteSchema(_)
            | ChangeExpression::ExecuteSql(_)) => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_index_name_and_schema() {
        let conventions = Conventions::with_default_schema("app");
        let expr = conventions.apply(
            CreateIndex {
                index: IndexDefinition::new("Users").column("Email").column("TenantId"),
            }
            .into(),
        );
        let ChangeExpression::CreateIndex(e) = expr else {
            panic!("kind changed");
        };
        assert_eq!(e.index.name, "IX_Users_Email_TenantId");
        assert_eq!(e.index.table.schema.as_deref(), Some("app"));
    }

    #[test]
    fn test_keeps_explicit_names() {
        let conventions = Conventions::default();
        let fk = ForeignKeyDefinition::new("Orders", "UserId", "Users", "Id").named("FK_custom");
        let ChangeExpression::CreateForeignKey(e) =
            conventions.apply(CreateForeignKey { foreign_key: fk }.into())
        else {
            panic!("kind changed");
        };
        assert_eq!(e.foreign_key.name, "FK_custom");
        assert_eq!(e.foreign_key.foreign_table.name, "Orders");
    }

    #[test]
    fn test_foreign_key_name() {
        let fk = ForeignKeyDefinition::new("Orders", "UserId", "Users", "Id");
        let ChangeExpression::CreateForeignKey(e) =
            Conventions::default().apply(CreateForeignKey { foreign_key: fk }.into())
        else {
            panic!("kind changed");
        };
        assert_eq!(e.foreign_key.name, "FK_Orders_UserId_Users_Id");
    }

    #[test]
    fn test_constraint_and_default_names() {
        let conventions = Conventions::default();
        let ChangeExpression::CreateConstraint(c) = conventions.apply(
            CreateConstraint {
                table: "Users".into(),
                name: String::new(),
                kind: ConstraintKind::Unique,
                columns: vec!["Email".into()],
            }
            .into(),
        ) else {
            panic!("kind changed");
        };
        assert_eq!(c.name, "UC_Users_Email");

        let ChangeExpression::AlterDefaultConstraint(d) = conventions.apply(
            AlterDefaultConstraint {
                table: "Users".into(),
                column: "Active".into(),
                default: None,
                constraint_name: None,
            }
            .into(),
        ) else {
            panic!("kind changed");
        };
        assert_eq!(d.constraint_name.as_deref(), Some("DF_Users_Active"));
    }

    #[test]
    fn test_primary_key_name_on_create_table() {
        let ChangeExpression::CreateTable(t) = Conventions::default().apply(
            CreateTable {
                table: "Users".into(),
                columns: vec![ColumnDefinition::new("Id", DbType::Int32).primary_key()],
                primary_key_name: None,
            }
            .into(),
        ) else {
            panic!("kind changed");
        };
        assert_eq!(t.primary_key_name.as_deref(), Some("PK_Users"));
    }

    #[test]
    fn test_execute_sql_untouched() {
        let expr: ChangeExpression = ExecuteSql { sql: "SELECT 1".into() }.into();
        assert_eq!(Conventions::with_default_schema("x").apply(expr.clone()), expr);
    }
}
