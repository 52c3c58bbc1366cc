//! MySQL dialect

use super::column::{decimal, sized, sized_or, Clause, ColumnSyntax};
use super::{generic, sql, DialectSyntax, Generator, RenderTable, Statement};
use crate::expression::{operations::*, ColumnDefinition, DbType};
use crate::migration::MigrationError;

pub(crate) static SYNTAX: DialectSyntax = DialectSyntax {
    create_schema: None,
    drop_schema: None,
    rename_table: Some("RENAME TABLE {table} TO {new_name}"),
    add_column: "ALTER TABLE {table} ADD COLUMN {column}",
    drop_column: "ALTER TABLE {table} DROP COLUMN {column}",
    alter_column: Some("ALTER TABLE {table} MODIFY COLUMN {column}"),
    drop_index: "DROP INDEX {name} ON {table}",
    drop_foreign_key: Some("ALTER TABLE {table} DROP FOREIGN KEY {name}"),
    drop_unique: Some("ALTER TABLE {table} DROP INDEX {name}"),
    drop_primary_key: Some("ALTER TABLE {table} DROP PRIMARY KEY"),
    add_constraint: true,
    pluggable_engines: true,
    schema_scoped_indexes: false,
};

pub(crate) static COLUMNS: ColumnSyntax = ColumnSyntax {
    type_map,
    clauses: &[
        Clause::Type,
        Clause::Nullability,
        Clause::Default,
        Clause::Identity,
        Clause::PrimaryKey,
        Clause::Unique,
    ],
    identity: "AUTO_INCREMENT",
    identity_needs_inline_key: false,
    current_timestamp: "CURRENT_TIMESTAMP",
    new_guid: "(UUID())",
};

pub(crate) static RENDER: RenderTable = RenderTable {
    rename_table,
    rename_column,
    ..generic::RENDER
};

fn type_map(column: &ColumnDefinition) -> String {
    match column.db_type {
        DbType::AnsiString => format!("{} CHARACTER SET ascii", sized("VARCHAR", column.size, 255)),
        DbType::String => sized("VARCHAR", column.size, 255),
        DbType::FixedString => sized("CHAR", column.size, 255),
        DbType::Text => "LONGTEXT".to_string(),
        DbType::Boolean => "TINYINT(1)".to_string(),
        DbType::Byte => "TINYINT UNSIGNED".to_string(),
        DbType::Int16 => "SMALLINT".to_string(),
        DbType::Int32 => "INTEGER".to_string(),
        DbType::Int64 => "BIGINT".to_string(),
        DbType::Decimal => decimal("DECIMAL", column),
        DbType::Float => "FLOAT".to_string(),
        DbType::Double => "DOUBLE".to_string(),
        DbType::Date => "DATE".to_string(),
        DbType::Time => "TIME".to_string(),
        DbType::DateTime => "DATETIME".to_string(),
        DbType::DateTimeOffset => "TIMESTAMP".to_string(),
        DbType::Guid => "CHAR(36)".to_string(),
        DbType::Binary => sized_or("VARBINARY", column.size, "LONGBLOB"),
        DbType::Json => "JSON".to_string(),
    }
}

fn rename_table(g: &Generator, e: &RenameTable) -> Result<Vec<Statement>, MigrationError> {
    // RENAME TABLE would move an unqualified target into the current database
    let target = g
        .quoter()
        .quote_table_name(e.table.schema.as_deref(), &e.new_name);
    sql(format!("RENAME TABLE {} TO {}", g.table(&e.table), target))
}

/// Rename a column while keeping its full definition
///
/// `CHANGE` needs the complete column definition, which the expression does not
/// carry. The first statement reads it from `INFORMATION_SCHEMA.COLUMNS` and
/// builds the `ALTER TABLE` text into a session variable; the rest prepare and run
/// it. All four must run on the same connection.
fn rename_column(g: &Generator, e: &RenameColumn) -> Result<Vec<Statement>, MigrationError> {
    let q = g.quoter();
    let change = format!(
        "ALTER TABLE {} CHANGE {} {} ",
        g.table(&e.table),
        g.quote(&e.old_name),
        g.quote(&e.new_name)
    );
    let schema = match &e.table.schema {
        Some(schema) => q.quote_string(schema),
        None => "DATABASE()".to_string(),
    };

    let select = format!(
        "SELECT CONCAT('{}', CAST(COLUMN_TYPE AS CHAR), \
         IF(ISNULL(CHARACTER_SET_NAME), '', CONCAT(' CHARACTER SET ', CHARACTER_SET_NAME)), \
         IF(ISNULL(COLLATION_NAME), '', CONCAT(' COLLATE ', COLLATION_NAME)), ' ', \
         IF(IS_NULLABLE = 'NO', 'NOT NULL ', ''), \
         IF(IS_NULLABLE = 'NO' AND COLUMN_DEFAULT IS NULL, '', CONCAT('DEFAULT ', QUOTE(COLUMN_DEFAULT), ' ')), \
         UPPER(EXTRA)) INTO @change_statement \
         FROM INFORMATION_SCHEMA.COLUMNS \
         WHERE TABLE_SCHEMA = {} AND TABLE_NAME = {} AND COLUMN_NAME = {}",
        q.quote_command(&change),
        schema,
        q.quote_string(&e.table.name),
        q.quote_string(&e.old_name)
    );

    Ok(vec![
        Statement::Sql(select),
        Statement::Sql("PREPARE r FROM @change_statement".to_string()),
        Statement::Sql("EXECUTE r".to_string()),
        Statement::Sql("DEALLOCATE PREPARE r".to_string()),
    ])
}
