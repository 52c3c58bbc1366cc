//! PostgreSQL dialect

use super::column::{decimal, sized, sized_or, Clause, ColumnSyntax};
use super::{generic, sql, DialectSyntax, Generator, RenderTable, Statement};
use crate::expression::{operations::*, ColumnDefinition, DbType};
use crate::migration::MigrationError;

pub(crate) static SYNTAX: DialectSyntax = DialectSyntax {
    create_schema: Some("CREATE SCHEMA {name}"),
    drop_schema: Some("DROP SCHEMA {name}"),
    rename_table: Some("ALTER TABLE {table} RENAME TO {new_name}"),
    add_column: "ALTER TABLE {table} ADD COLUMN {column}",
    drop_column: "ALTER TABLE {table} DROP COLUMN {column}",
    alter_column: None,
    drop_index: "DROP INDEX {name}",
    drop_foreign_key: Some("ALTER TABLE {table} DROP CONSTRAINT {name}"),
    drop_unique: Some("ALTER TABLE {table} DROP CONSTRAINT {name}"),
    drop_primary_key: Some("ALTER TABLE {table} DROP CONSTRAINT {name}"),
    add_constraint: true,
    pluggable_engines: false,
    schema_scoped_indexes: true,
};

pub(crate) static COLUMNS: ColumnSyntax = ColumnSyntax {
    type_map,
    clauses: &[
        Clause::Type,
        Clause::Identity,
        Clause::Nullability,
        Clause::Default,
        Clause::PrimaryKey,
        Clause::Unique,
    ],
    identity: "GENERATED BY DEFAULT AS IDENTITY",
    identity_needs_inline_key: false,
    current_timestamp: "CURRENT_TIMESTAMP",
    new_guid: "gen_random_uuid()",
};

pub(crate) static RENDER: RenderTable = RenderTable {
    alter_column,
    alter_default_constraint,
    ..generic::RENDER
};

fn type_map(column: &ColumnDefinition) -> String {
    match column.db_type {
        DbType::AnsiString | DbType::String => sized_or("VARCHAR", column.size, "TEXT"),
        DbType::FixedString => sized("CHAR", column.size, 255),
        DbType::Text => "TEXT".to_string(),
        DbType::Boolean => "BOOLEAN".to_string(),
        DbType::Byte | DbType::Int16 => "SMALLINT".to_string(),
        DbType::Int32 => "INTEGER".to_string(),
        DbType::Int64 => "BIGINT".to_string(),
        DbType::Decimal => decimal("DECIMAL", column),
        DbType::Float => "REAL".to_string(),
        DbType::Double => "DOUBLE PRECISION".to_string(),
        DbType::Date => "DATE".to_string(),
        DbType::Time => "TIME".to_string(),
        DbType::DateTime => "TIMESTAMP".to_string(),
        DbType::DateTimeOffset => "TIMESTAMPTZ".to_string(),
        DbType::Guid => "UUID".to_string(),
        DbType::Binary => "BYTEA".to_string(),
        DbType::Json => "JSONB".to_string(),
    }
}

/// One `ALTER TABLE` with an `ALTER COLUMN` action per changed property
fn alter_column(g: &Generator, e: &AlterColumn) -> Result<Vec<Statement>, MigrationError> {
    let column = g.quote(&e.column.name);
    let mut actions = vec![format!(
        "ALTER COLUMN {column} TYPE {}",
        g.column_type(&e.column)
    )];
    match e.column.is_nullable() {
        Some(false) => actions.push(format!("ALTER COLUMN {column} SET NOT NULL")),
        Some(true) => actions.push(format!("ALTER COLUMN {column} DROP NOT NULL")),
        None => {}
    }
    if let Some(default) = &e.column.default {
        actions.push(format!(
            "ALTER COLUMN {column} SET DEFAULT {}",
            g.default_value(default)
        ));
    }
    sql(format!("ALTER TABLE {} {}", g.table(&e.table), actions.join(", ")))
}

fn alter_default_constraint(
    g: &Generator,
    e: &AlterDefaultConstraint,
) -> Result<Vec<Statement>, MigrationError> {
    let action = match &e.default {
        Some(default) => format!("SET DEFAULT {}", g.default_value(default)),
        None => "DROP DEFAULT".to_string(),
    };
    sql(format!(
        "ALTER TABLE {} ALTER COLUMN {} {}",
        g.table(&e.table),
        g.quote(&e.column),
        action
    ))
}

#[cfg(test)]
mod tests {
    use crate::expression::*;
    use crate::generator::Generator;

    fn sql_of(expr: impl Into<ChangeExpression>) -> String {
        Generator::postgres().generate_sql(&expr.into()).unwrap()
    }

    #[test]
    fn test_create_table_with_identity() {
        let sql = sql_of(CreateTable {
            table: TableName::with_schema("public", "Users"),
            columns: vec![
                ColumnDefinition::new("Id", DbType::Int64).primary_key().identity(),
                ColumnDefinition::new("ExternalId", DbType::Guid).default(DefaultValue::NewGuid),
                ColumnDefinition::new("Payload", DbType::Json).null(),
            ],
            primary_key_name: None,
        });
        assert_eq!(
            sql,
            "CREATE TABLE \"public\".\"Users\" (\"Id\" BIGINT GENERATED BY DEFAULT AS IDENTITY NOT NULL PRIMARY KEY, \
             \"ExternalId\" UUID DEFAULT gen_random_uuid(), \"Payload\" JSONB NULL);"
        );
    }

    #[test]
    fn test_alter_column_combines_actions() {
        let sql = sql_of(AlterColumn {
            table: "Users".into(),
            column: ColumnDefinition::new("Name", DbType::String)
                .size(200)
                .not_null()
                .default(""),
        });
        assert_eq!(
            sql,
            "ALTER TABLE \"Users\" ALTER COLUMN \"Name\" TYPE VARCHAR(200), \
             ALTER COLUMN \"Name\" SET NOT NULL, ALTER COLUMN \"Name\" SET DEFAULT '';"
        );
    }

    #[test]
    fn test_alter_default_set_and_drop() {
        assert_eq!(
            sql_of(AlterDefaultConstraint {
                table: "Users".into(),
                column: "Active".into(),
                default: Some(true.into()),
                constraint_name: None,
            }),
            "ALTER TABLE \"Users\" ALTER COLUMN \"Active\" SET DEFAULT TRUE;"
        );
        assert_eq!(
            sql_of(AlterDefaultConstraint {
                table: "Users".into(),
                column: "Active".into(),
                default: None,
                constraint_name: None,
            }),
            "ALTER TABLE \"Users\" ALTER COLUMN \"Active\" DROP DEFAULT;"
        );
    }

    #[test]
    fn test_drop_index_is_schema_qualified() {
        assert_eq!(
            sql_of(DeleteIndex {
                table: TableName::with_schema("auth", "Users"),
                name: "IX_Users_Email".into(),
            }),
            "DROP INDEX \"auth\".\"IX_Users_Email\";"
        );
    }

    #[test]
    fn test_schema_operations() {
        assert_eq!(sql_of(CreateSchema { name: "auth".into() }), "CREATE SCHEMA \"auth\";");
        assert_eq!(sql_of(DeleteSchema { name: "auth".into() }), "DROP SCHEMA \"auth\";");
    }
}
