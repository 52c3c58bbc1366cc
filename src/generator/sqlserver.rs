//! SQL Server dialect

use super::column::{decimal, sized, sized_or, Clause, ColumnMode, ColumnSyntax};
use super::{fill, generic, sql, DialectSyntax, Generator, RenderTable, Statement};
use crate::expression::{operations::*, ColumnDefinition, DbType, TableName};
use crate::migration::MigrationError;

pub(crate) static SYNTAX: DialectSyntax = DialectSyntax {
    create_schema: Some("CREATE SCHEMA {name}"),
    drop_schema: Some("DROP SCHEMA {name}"),
    rename_table: None,
    add_column: "ALTER TABLE {table} ADD {column}",
    drop_column: "ALTER TABLE {table} DROP COLUMN {column}",
    alter_column: Some("ALTER TABLE {table} ALTER COLUMN {column}"),
    drop_index: "DROP INDEX {name} ON {table}",
    drop_foreign_key: Some("ALTER TABLE {table} DROP CONSTRAINT {name}"),
    drop_unique: Some("ALTER TABLE {table} DROP CONSTRAINT {name}"),
    drop_primary_key: Some("ALTER TABLE {table} DROP CONSTRAINT {name}"),
    add_constraint: true,
    pluggable_engines: false,
    schema_scoped_indexes: false,
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
    identity: "IDENTITY(1,1)",
    identity_needs_inline_key: false,
    current_timestamp: "GETDATE()",
    new_guid: "NEWID()",
};

pub(crate) static RENDER: RenderTable = RenderTable {
    rename_table,
    rename_column,
    delete_column,
    alter_column,
    alter_default_constraint,
    ..generic::RENDER
};

fn type_map(column: &ColumnDefinition) -> String {
    match column.db_type {
        DbType::AnsiString => sized_or("VARCHAR", column.size, "VARCHAR(MAX)"),
        DbType::String => sized("NVARCHAR", column.size, 255),
        DbType::FixedString => sized("NCHAR", column.size, 255),
        DbType::Text | DbType::Json => "NVARCHAR(MAX)".to_string(),
        DbType::Boolean => "BIT".to_string(),
        DbType::Byte => "TINYINT".to_string(),
        DbType::Int16 => "SMALLINT".to_string(),
        DbType::Int32 => "INT".to_string(),
        DbType::Int64 => "BIGINT".to_string(),
        DbType::Decimal => decimal("DECIMAL", column),
        DbType::Float => "REAL".to_string(),
        DbType::Double => "FLOAT".to_string(),
        DbType::Date => "DATE".to_string(),
        DbType::Time => "TIME".to_string(),
        DbType::DateTime => "DATETIME2".to_string(),
        DbType::DateTimeOffset => "DATETIMEOFFSET".to_string(),
        DbType::Guid => "UNIQUEIDENTIFIER".to_string(),
        DbType::Binary => sized_or("VARBINARY", column.size, "VARBINARY(MAX)"),
    }
}

fn rename_table(g: &Generator, e: &RenameTable) -> Result<Vec<Statement>, MigrationError> {
    let q = g.quoter();
    sql(format!(
        "EXEC sp_rename {}, {}",
        q.quote_string(&g.table(&e.table)),
        q.quote_string(&e.new_name)
    ))
}

fn rename_column(g: &Generator, e: &RenameColumn) -> Result<Vec<Statement>, MigrationError> {
    let q = g.quoter();
    let qualified = format!("{}.{}", g.table(&e.table), g.quote(&e.old_name));
    sql(format!(
        "EXEC sp_rename {}, {}, 'COLUMN'",
        q.quote_string(&qualified),
        q.quote_string(&e.new_name)
    ))
}

/// Drop whatever default constraint currently sits on a column
///
/// Default constraints have generated names unless one was given, so the name is
/// looked up in `sys.default_constraints` and the drop is run through
/// `sp_executesql`.
fn drop_default_constraint(g: &Generator, table: &TableName, column: &str) -> Statement {
    let q = g.quoter();
    let quoted_table = g.table(table);
    Statement::Sql(fill(
        "DECLARE @default sysname, @sql nvarchar(max);\n\
         SELECT @default = name FROM sys.default_constraints \
         WHERE parent_object_id = object_id({table_string}) \
         AND parent_column_id = columnproperty(object_id({table_string}), {column_string}, 'ColumnId');\n\
         IF @default IS NOT NULL\n\
         BEGIN\n\
         SET @sql = N'ALTER TABLE {table_command} DROP CONSTRAINT ' + QUOTENAME(@default);\n\
         EXEC sp_executesql @sql;\n\
         END",
        &[
            ("table_string", &q.quote_string(&quoted_table)),
            ("column_string", &q.quote_string(column)),
            ("table_command", &q.quote_command(&quoted_table)),
        ],
    ))
}

/// Columns with a default cannot be dropped until the default constraint is gone
fn delete_column(g: &Generator, e: &DeleteColumn) -> Result<Vec<Statement>, MigrationError> {
    let table = g.table(&e.table);
    let mut statements = Vec::with_capacity(e.columns.len() * 2);
    for column in &e.columns {
        statements.push(drop_default_constraint(g, &e.table, column));
        statements.push(Statement::Sql(format!(
            "ALTER TABLE {} DROP COLUMN {}",
            table,
            g.quote(column)
        )));
    }
    Ok(statements)
}

/// `ALTER COLUMN` cannot carry a default; it is replaced separately
fn alter_column(g: &Generator, e: &AlterColumn) -> Result<Vec<Statement>, MigrationError> {
    let without_default = ColumnDefinition {
        default: None,
        ..e.column.clone()
    };
    let mut statements = vec![Statement::Sql(format!(
        "ALTER TABLE {} ALTER COLUMN {}",
        g.table(&e.table),
        g.column(&without_default, ColumnMode::Alter)
    ))];
    if e.column.default.is_some() {
        statements.extend(alter_default_constraint(
            g,
            &AlterDefaultConstraint {
                table: e.table.clone(),
                column: e.column.name.clone(),
                default: e.column.default.clone(),
                constraint_name: None,
            },
        )?);
    }
    Ok(statements)
}

fn alter_default_constraint(
    g: &Generator,
    e: &AlterDefaultConstraint,
) -> Result<Vec<Statement>, MigrationError> {
    let mut statements = vec![drop_default_constraint(g, &e.table, &e.column)];
    if let Some(default) = &e.default {
        let name = e
            .constraint_name
            .clone()
            .unwrap_or_else(|| format!("DF_{}_{}", e.table.name, e.column));
        statements.push(Statement::Sql(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} DEFAULT {} FOR {}",
            g.table(&e.table),
            g.quote(&name),
            g.default_value(default),
            g.quote(&e.column)
        )));
    }
    Ok(statements)
}

#[cfg(test)]
mod tests {
    use crate::expression::*;
    use crate::generator::{Generator, Statement};

    fn statements(expr: impl Into<ChangeExpression>) -> Vec<Statement> {
        Generator::sql_server().generate(&expr.into()).unwrap()
    }

    #[test]
    fn test_rename_through_sp_rename() {
        assert_eq!(
            statements(RenameTable {
                table: TableName::with_schema("dbo", "Users"),
                new_name: "Members".into(),
            }),
            vec![Statement::Sql("EXEC sp_rename '[dbo].[Users]', 'Members'".into())]
        );
        assert_eq!(
            statements(RenameColumn {
                table: "Users".into(),
                old_name: "Name".into(),
                new_name: "FullName".into(),
            }),
            vec![Statement::Sql("EXEC sp_rename '[Users].[Name]', 'FullName', 'COLUMN'".into())]
        );
    }

    #[test]
    fn test_alter_default_drops_then_adds() {
        let out = statements(AlterDefaultConstraint {
            table: "Users".into(),
            column: "Active".into(),
            default: Some(true.into()),
            constraint_name: Some("DF_Users_Active".into()),
        });
        assert_eq!(out.len(), 2);
        let Statement::Sql(lookup) = &out[0] else {
            panic!("expected SQL");
        };
        assert!(lookup.contains("sys.default_constraints"));
        assert!(lookup.contains("object_id('[Users]')"));
        assert!(lookup.contains("sp_executesql"));
        assert_eq!(
            out[1],
            Statement::Sql("ALTER TABLE [Users] ADD CONSTRAINT [DF_Users_Active] DEFAULT 1 FOR [Active]".into())
        );
    }

    #[test]
    fn test_default_lookup_keeps_placeholder_like_names() {
        let out = statements(DeleteColumn {
            table: "{column_string}".into(),
            columns: vec!["{table_string}".into()],
        });
        let Statement::Sql(lookup) = &out[0] else {
            panic!("expected SQL");
        };
        assert!(lookup.contains(
            "WHERE parent_object_id = object_id('[{column_string}]') \
             AND parent_column_id = columnproperty(object_id('[{column_string}]'), '{table_string}', 'ColumnId')"
        ));
        assert!(lookup.contains("N'ALTER TABLE [{column_string}] DROP CONSTRAINT '"));
        assert_eq!(
            out[1],
            Statement::Sql("ALTER TABLE [{column_string}] DROP COLUMN [{table_string}]".into())
        );
    }

    #[test]
    fn test_add_column_without_column_keyword() {
        let out = statements(CreateColumn {
            table: "Users".into(),
            column: ColumnDefinition::new("Id", DbType::Guid).not_null().default(DefaultValue::NewGuid),
        });
        assert_eq!(
            out,
            vec![Statement::Sql(
                "ALTER TABLE [Users] ADD [Id] UNIQUEIDENTIFIER NOT NULL DEFAULT NEWID()".into()
            )]
        );
    }

    #[test]
    fn test_alter_column_moves_default_out() {
        let out = statements(AlterColumn {
            table: "Users".into(),
            column: ColumnDefinition::new("Name", DbType::String).size(80).default("n/a"),
        });
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], Statement::Sql("ALTER TABLE [Users] ALTER COLUMN [Name] NVARCHAR(80)".into()));
        assert!(matches!(&out[2], Statement::Sql(s) if s.ends_with("DEFAULT N'n/a' FOR [Name]")));
    }

    #[test]
    fn test_delete_column_clears_default_first() {
        let out = statements(DeleteColumn {
            table: "Users".into(),
            columns: vec!["Active".into()],
        });
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], Statement::Sql("ALTER TABLE [Users] DROP COLUMN [Active]".into()));
    }
}
