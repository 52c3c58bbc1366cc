//! Renderers shared by every dialect unless overridden

use super::column::ColumnMode;
use super::{fill, sql, Generator, RenderTable, Statement};
use crate::expression::{operations::*, ConstraintKind, DataRow, IndexDefinition, SortDirection};
use crate::migration::MigrationError;

type Rendered = Result<Vec<Statement>, MigrationError>;

pub(crate) const RENDER: RenderTable = RenderTable {
    create_schema,
    delete_schema,
    create_table,
    delete_table,
    rename_table,
    create_column,
    delete_column,
    rename_column,
    alter_column,
    alter_default_constraint,
    create_index,
    delete_index,
    create_foreign_key,
    delete_foreign_key,
    create_constraint,
    delete_constraint,
    insert_data,
    delete_data,
    execute_sql,
};

pub(crate) fn create_schema(g: &Generator, e: &CreateSchema) -> Rendered {
    match g.syntax().create_schema {
        Some(template) => sql(fill(template, &[("name", &g.quote(&e.name))])),
        None => g.unsupported(&format!("Database schemas are not supported for {}", g.dialect())),
    }
}

pub(crate) fn delete_schema(g: &Generator, e: &DeleteSchema) -> Rendered {
    match g.syntax().drop_schema {
        Some(template) => sql(fill(template, &[("name", &g.quote(&e.name))])),
        None => g.unsupported(&format!("Database schemas are not supported for {}", g.dialect())),
    }
}

pub(crate) fn create_table(g: &Generator, e: &CreateTable) -> Rendered {
    let key_columns: Vec<&str> = e
        .columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| c.name.as_str())
        .collect();
    let inline_primary_key = key_columns.len() == 1;

    let mut definitions: Vec<String> = e
        .columns
        .iter()
        .map(|c| g.column(c, ColumnMode::Create { inline_primary_key }))
        .collect();

    if key_columns.len() > 1 {
        let key = match &e.primary_key_name {
            Some(name) => format!("CONSTRAINT {} PRIMARY KEY ({})", g.quote(name), g.quote_list(&key_columns)),
            None => format!("PRIMARY KEY ({})", g.quote_list(&key_columns)),
        };
        definitions.push(key);
    }

    let mut statement = format!("CREATE TABLE {} ({})", g.table(&e.table), definitions.join(", "));
    if g.syntax().pluggable_engines {
        if let Some(engine) = &g.options().storage_engine {
            statement.push_str(&format!(" ENGINE = {engine}"));
        }
    }
    sql(statement)
}

pub(crate) fn delete_table(g: &Generator, e: &DeleteTable) -> Rendered {
    sql(format!("DROP TABLE {}", g.table(&e.table)))
}

pub(crate) fn rename_table(g: &Generator, e: &RenameTable) -> Rendered {
    match g.syntax().rename_table {
        Some(template) => {
            let new_name = g.quote(&e.new_name);
            sql(fill(template, &[("table", &g.table(&e.table)), ("new_name", &new_name)]))
        }
        None => g.unsupported_kind("RenameTable"),
    }
}

pub(crate) fn create_column(g: &Generator, e: &CreateColumn) -> Rendered {
    let column = g.column(&e.column, ColumnMode::Add);
    sql(fill(
        g.syntax().add_column,
        &[("table", &g.table(&e.table)), ("column", &column)],
    ))
}

pub(crate) fn delete_column(g: &Generator, e: &DeleteColumn) -> Rendered {
    let table = g.table(&e.table);
    Ok(e.columns
        .iter()
        .map(|c| {
            Statement::Sql(fill(
                g.syntax().drop_column,
                &[("table", &table), ("column", &g.quote(c))],
            ))
        })
        .collect())
}

pub(crate) fn rename_column(g: &Generator, e: &RenameColumn) -> Rendered {
    sql(format!(
        "ALTER TABLE {} RENAME COLUMN {} TO {}",
        g.table(&e.table),
        g.quote(&e.old_name),
        g.quote(&e.new_name)
    ))
}

pub(crate) fn alter_column(g: &Generator, e: &AlterColumn) -> Rendered {
    match g.syntax().alter_column {
        Some(template) => {
            let column = g.column(&e.column, ColumnMode::Alter);
            sql(fill(template, &[("table", &g.table(&e.table)), ("column", &column)]))
        }
        None => g.unsupported_kind("AlterColumn"),
    }
}

pub(crate) fn alter_default_constraint(g: &Generator, _e: &AlterDefaultConstraint) -> Rendered {
    g.unsupported(&format!(
        "Altering of default constraints is not supported for {}",
        g.dialect()
    ))
}

pub(crate) fn index_columns(g: &Generator, index: &IndexDefinition) -> String {
    index
        .columns
        .iter()
        .map(|c| match c.direction {
            SortDirection::Ascending => format!("{} ASC", g.quote(&c.name)),
            SortDirection::Descending => format!("{} DESC", g.quote(&c.name)),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn create_index(g: &Generator, e: &CreateIndex) -> Rendered {
    let index = &e.index;
    sql(format!(
        "CREATE {}INDEX {} ON {} ({})",
        if index.unique { "UNIQUE " } else { "" },
        g.quote(&index.name),
        g.table(&index.table),
        index_columns(g, index)
    ))
}

pub(crate) fn delete_index(g: &Generator, e: &DeleteIndex) -> Rendered {
    let name = if g.syntax().schema_scoped_indexes {
        g.quoter().quote_table_name(e.table.schema.as_deref(), &e.name)
    } else {
        g.quote(&e.name)
    };
    sql(fill(
        g.syntax().drop_index,
        &[("name", &name), ("table", &g.table(&e.table))],
    ))
}

pub(crate) fn create_foreign_key(g: &Generator, e: &CreateForeignKey) -> Rendered {
    if !g.syntax().add_constraint {
        return g.unsupported_kind("CreateForeignKey");
    }
    let fk = &e.foreign_key;
    let mut statement = format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
        g.table(&fk.foreign_table),
        g.quote(&fk.name),
        g.quote_list(&fk.foreign_columns),
        g.table(&fk.primary_table),
        g.quote_list(&fk.primary_columns)
    );
    if let Some(rule) = fk.on_delete.as_sql() {
        statement.push_str(&format!(" ON DELETE {rule}"));
    }
    if let Some(rule) = fk.on_update.as_sql() {
        statement.push_str(&format!(" ON UPDATE {rule}"));
    }
    sql(statement)
}

pub(crate) fn delete_foreign_key(g: &Generator, e: &DeleteForeignKey) -> Rendered {
    match g.syntax().drop_foreign_key {
        Some(template) => sql(fill(
            template,
            &[("table", &g.table(&e.table)), ("name", &g.quote(&e.name))],
        )),
        None => g.unsupported_kind("DeleteForeignKey"),
    }
}

pub(crate) fn create_constraint(g: &Generator, e: &CreateConstraint) -> Rendered {
    if !g.syntax().add_constraint {
        return g.unsupported_kind("CreateConstraint");
    }
    let keyword = match e.kind {
        ConstraintKind::PrimaryKey => "PRIMARY KEY",
        ConstraintKind::Unique => "UNIQUE",
    };
    sql(format!(
        "ALTER TABLE {} ADD CONSTRAINT {} {} ({})",
        g.table(&e.table),
        g.quote(&e.name),
        keyword,
        g.quote_list(&e.columns)
    ))
}

pub(crate) fn delete_constraint(g: &Generator, e: &DeleteConstraint) -> Rendered {
    let template = match e.kind {
        ConstraintKind::PrimaryKey => g.syntax().drop_primary_key,
        ConstraintKind::Unique => g.syntax().drop_unique,
    };
    match template {
        Some(template) => sql(fill(
            template,
            &[("table", &g.table(&e.table)), ("name", &g.quote(&e.name))],
        )),
        None => g.unsupported_kind("DeleteConstraint"),
    }
}

pub(crate) fn insert_data(g: &Generator, e: &InsertData) -> Rendered {
    let table = g.table(&e.table);
    Ok(e.rows
        .iter()
        .map(|row| {
            let columns: Vec<&str> = row.columns().collect();
            let values: Vec<String> = row.values().map(|v| g.quoter().quote_value(v)).collect();
            Statement::Sql(format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                g.quote_list(&columns),
                values.join(", ")
            ))
        })
        .collect())
}

fn row_filter(g: &Generator, row: &DataRow) -> String {
    row.0
        .iter()
        .map(|(column, value)| match value {
            crate::expression::Value::Null => format!("{} IS NULL", g.quote(column)),
            value => format!("{} = {}", g.quote(column), g.quoter().quote_value(value)),
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

pub(crate) fn delete_data(g: &Generator, e: &DeleteData) -> Rendered {
    let table = g.table(&e.table);
    if e.all_rows {
        return sql(format!("DELETE FROM {table}"));
    }
    Ok(e.rows
        .iter()
        .map(|row| Statement::Sql(format!("DELETE FROM {} WHERE {}", table, row_filter(g, row))))
        .collect())
}

pub(crate) fn execute_sql(_g: &Generator, e: &ExecuteSql) -> Rendered {
    sql(e.sql.clone())
}

#[cfg(test)]
mod tests {
    use crate::expression::*;
    use crate::generator::{Generator, Statement};

    fn sqls(generator: &Generator, expr: impl Into<ChangeExpression>) -> Vec<String> {
        generator
            .generate(&expr.into())
            .unwrap()
            .into_iter()
            .filter_map(|s| s.as_sql().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_composite_primary_key_is_a_table_constraint() {
        let expr = CreateTable {
            table: "UserRoles".into(),
            columns: vec![
                ColumnDefinition::new("UserId", DbType::Int32).primary_key(),
                ColumnDefinition::new("RoleId", DbType::Int32).primary_key(),
            ],
            primary_key_name: Some("PK_UserRoles".into()),
        };
        let sql = &sqls(&Generator::postgres(), expr)[0];
        assert_eq!(
            sql,
            "CREATE TABLE \"UserRoles\" (\"UserId\" INTEGER NOT NULL, \"RoleId\" INTEGER NOT NULL, \
             CONSTRAINT \"PK_UserRoles\" PRIMARY KEY (\"UserId\", \"RoleId\"))"
        );
    }

    #[test]
    fn test_insert_one_statement_per_row() {
        let expr = InsertData {
            table: TableName::with_schema("public", "Users"),
            rows: vec![
                DataRow::new().set("Id", 1).set("Name", "Ann"),
                DataRow::new().set("Id", 2).set("Name", None::<String>),
            ],
        };
        assert_eq!(
            sqls(&Generator::postgres(), expr),
            vec![
                "INSERT INTO \"public\".\"Users\" (\"Id\", \"Name\") VALUES (1, 'Ann')",
                "INSERT INTO \"public\".\"Users\" (\"Id\", \"Name\") VALUES (2, NULL)",
            ]
        );
    }

    #[test]
    fn test_delete_data_matches_nulls_with_is_null() {
        let expr = DeleteData {
            table: "Users".into(),
            rows: vec![DataRow::new().set("Id", 1).set("Email", Value::Null)],
            all_rows: false,
        };
        assert_eq!(
            sqls(&Generator::sqlite(), expr),
            vec!["DELETE FROM \"Users\" WHERE \"Id\" = 1 AND \"Email\" IS NULL"]
        );
    }

    #[test]
    fn test_foreign_key_rules() {
        let fk = ForeignKeyDefinition::new("Orders", "UserId", "Users", "Id")
            .named("FK_Orders_UserId_Users_Id")
            .on_delete(Rule::Cascade);
        let sql = &sqls(&Generator::postgres(), CreateForeignKey { foreign_key: fk })[0];
        assert_eq!(
            sql,
            "ALTER TABLE \"Orders\" ADD CONSTRAINT \"FK_Orders_UserId_Users_Id\" FOREIGN KEY (\"UserId\") \
             REFERENCES \"Users\" (\"Id\") ON DELETE CASCADE"
        );
    }

    #[test]
    fn test_create_index_directions() {
        let index = IndexDefinition::new("Users")
            .named("IX_Users_Email")
            .column("Email")
            .column_desc("CreatedAt")
            .unique();
        assert_eq!(
            sqls(&Generator::sql_server(), CreateIndex { index }),
            vec!["CREATE UNIQUE INDEX [IX_Users_Email] ON [Users] ([Email] ASC, [CreatedAt] DESC)"]
        );
    }

    #[test]
    fn test_delete_column_one_statement_per_column() {
        let expr = DeleteColumn {
            table: "Users".into(),
            columns: vec!["A".into(), "B".into()],
        };
        let statements = Generator::postgres().generate(&expr.into()).unwrap();
        assert_eq!(statements.len(), 2);
        assert!(matches!(&statements[1], Statement::Sql(s) if s.ends_with("DROP COLUMN \"B\"")));
    }
}
