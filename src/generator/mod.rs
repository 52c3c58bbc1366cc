//! Dialect SQL generation
//!
//! A [`Generator`] renders a [`ChangeExpression`] into statements for one database
//! engine. Each dialect is described by three static tables:
//!
//! - a [`RenderTable`] with one render function per expression kind. The generic
//!   table supplies the common renderers; dialects override individual entries.
//! - a [`DialectSyntax`] with the statement templates that differ per engine.
//! - a [`ColumnSyntax`](column::ColumnSyntax) with the type map and column clause order.
//!
//! Operations a dialect cannot express go through [`CompatibilityMode::handle`].
//!
//! # Example
//!
//! ```rust
//! use tidemark::expression::{ChangeExpression, RenameColumn};
//! use tidemark::generator::Generator;
//!
//! let generator = Generator::postgres();
//! let sql = generator
//!     .generate_sql(&ChangeExpression::from(RenameColumn {
//!         table: "Users".into(),
//!         old_name: "Name".into(),
//!         new_name: "FullName".into(),
//!     }))
//!     .unwrap();
//! assert_eq!(sql, "ALTER TABLE \"Users\" RENAME COLUMN \"Name\" TO \"FullName\";");
//! ```

pub mod column;
pub mod compatibility;
mod generic;
mod mysql;
mod postgres;
pub mod quoter;
mod sqlite;
mod sqlserver;

pub use compatibility::CompatibilityMode;
pub use quoter::Quoter;

use crate::expression::{operations::*, ChangeExpression, ColumnDefinition, TableName};
use crate::migration::MigrationError;
use column::{ColumnMode, ColumnSyntax};
use std::fmt;

/// Supported database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
    SqlServer,
}

impl Dialect {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Dialect::MySql => "MySql",
            Dialect::Postgres => "Postgres",
            Dialect::Sqlite => "Sqlite",
            Dialect::SqlServer => "SqlServer",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One unit of generated output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// SQL to execute
    Sql(String),
    /// Descriptive no-op produced in loose compatibility mode
    Notice(String),
}

impl Statement {
    #[must_use]
    pub fn as_sql(&self) -> Option<&str> {
        match self {
            Statement::Sql(sql) => Some(sql),
            Statement::Notice(_) => None,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Sql(sql) => write!(f, "{};", sql.trim_end().trim_end_matches(';')),
            Statement::Notice(message) => write!(f, "-- {message}"),
        }
    }
}

/// Generator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub compatibility: CompatibilityMode,
    /// Storage engine for `CREATE TABLE` on dialects with pluggable engines
    pub storage_engine: Option<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            compatibility: CompatibilityMode::Strict,
            storage_engine: Some("INNODB".to_string()),
        }
    }
}

impl GeneratorOptions {
    #[must_use]
    pub fn loose() -> Self {
        Self {
            compatibility: CompatibilityMode::Loose,
            ..Self::default()
        }
    }
}

type Render<T> = fn(&Generator, &T) -> Result<Vec<Statement>, MigrationError>;

/// Render functions, one per expression kind
pub(crate) struct RenderTable {
    pub create_schema: Render<CreateSchema>,
    pub delete_schema: Render<DeleteSchema>,
    pub create_table: Render<CreateTable>,
    pub delete_table: Render<DeleteTable>,
    pub rename_table: Render<RenameTable>,
    pub create_column: Render<CreateColumn>,
    pub delete_column: Render<DeleteColumn>,
    pub rename_column: Render<RenameColumn>,
    pub alter_column: Render<AlterColumn>,
    pub alter_default_constraint: Render<AlterDefaultConstraint>,
    pub create_index: Render<CreateIndex>,
    pub delete_index: Render<DeleteIndex>,
    pub create_foreign_key: Render<CreateForeignKey>,
    pub delete_foreign_key: Render<DeleteForeignKey>,
    pub create_constraint: Render<CreateConstraint>,
    pub delete_constraint: Render<DeleteConstraint>,
    pub insert_data: Render<InsertData>,
    pub delete_data: Render<DeleteData>,
    pub execute_sql: Render<ExecuteSql>,
}

/// Statement templates that differ per dialect
///
/// Placeholders are `{table}`, `{name}`, `{column}` and `{new_name}`. `None` marks
/// an operation the dialect cannot express.
pub(crate) struct DialectSyntax {
    pub create_schema: Option<&'static str>,
    pub drop_schema: Option<&'static str>,
    pub rename_table: Option<&'static str>,
    pub add_column: &'static str,
    pub drop_column: &'static str,
    pub alter_column: Option<&'static str>,
    pub drop_index: &'static str,
    pub drop_foreign_key: Option<&'static str>,
    pub drop_unique: Option<&'static str>,
    pub drop_primary_key: Option<&'static str>,
    /// Whether `ALTER TABLE ... ADD CONSTRAINT` is available
    pub add_constraint: bool,
    /// Whether `CREATE TABLE` takes an `ENGINE = ...` clause
    pub pluggable_engines: bool,
    /// Whether index names live in the table's schema rather than on the table
    pub schema_scoped_indexes: bool,
}

/// Renders change expressions for one dialect
#[derive(Clone)]
pub struct Generator {
    dialect: Dialect,
    quoter: Quoter,
    syntax: &'static DialectSyntax,
    render: &'static RenderTable,
    columns: &'static ColumnSyntax,
    options: GeneratorOptions,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("dialect", &self.dialect)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Generator {
    #[must_use]
    pub fn new(dialect: Dialect, options: GeneratorOptions) -> Self {
        let (quoter, syntax, render, columns) = match dialect {
            Dialect::MySql => (Quoter::MYSQL, &mysql::SYNTAX, &mysql::RENDER, &mysql::COLUMNS),
            Dialect::Postgres => (
                Quoter::POSTGRES,
                &postgres::SYNTAX,
                &postgres::RENDER,
                &postgres::COLUMNS,
            ),
            Dialect::Sqlite => (Quoter::SQLITE, &sqlite::SYNTAX, &sqlite::RENDER, &sqlite::COLUMNS),
            Dialect::SqlServer => (
                Quoter::SQL_SERVER,
                &sqlserver::SYNTAX,
                &sqlserver::RENDER,
                &sqlserver::COLUMNS,
            ),
        };
        Self {
            dialect,
            quoter,
            syntax,
            render,
            columns,
            options,
        }
    }

    #[must_use]
    pub fn mysql() -> Self {
        Self::new(Dialect::MySql, GeneratorOptions::default())
    }

    #[must_use]
    pub fn postgres() -> Self {
        Self::new(Dialect::Postgres, GeneratorOptions::default())
    }

    #[must_use]
    pub fn sqlite() -> Self {
        Self::new(Dialect::Sqlite, GeneratorOptions::default())
    }

    #[must_use]
    pub fn sql_server() -> Self {
        Self::new(Dialect::SqlServer, GeneratorOptions::default())
    }

    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    #[must_use]
    pub fn quoter(&self) -> &Quoter {
        &self.quoter
    }

    #[must_use]
    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Render one expression into statements, in execution order
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::UnsupportedOperation` when the dialect cannot
    /// express the operation and compatibility mode is strict.
    pub fn generate(&self, expression: &ChangeExpression) -> Result<Vec<Statement>, MigrationError> {
        let r = self.render;
        match expression {
            ChangeExpression::CreateSchema(e) => (r.create_schema)(self, e),
            ChangeExpression::DeleteSchema(e) => (r.delete_schema)(self, e),
            ChangeExpression::CreateTable(e) => (r.create_table)(self, e),
            ChangeExpression::DeleteTable(e) => (r.delete_table)(self, e),
            ChangeExpression::RenameTable(e) => (r.rename_table)(self, e),
            ChangeExpression::CreateColumn(e) => (r.create_column)(self, e),
            ChangeExpression::DeleteColumn(e) => (r.delete_column)(self, e),
            ChangeExpression::RenameColumn(e) => (r.rename_column)(self, e),
            ChangeExpression::AlterColumn(e) => (r.alter_column)(self, e),
            ChangeExpression::AlterDefaultConstraint(e) => (r.alter_default_constraint)(self, e),
            ChangeExpression::CreateIndex(e) => (r.create_index)(self, e),
            ChangeExpression::DeleteIndex(e) => (r.delete_index)(self, e),
            ChangeExpression::CreateForeignKey(e) => (r.create_foreign_key)(self, e),
            ChangeExpression::DeleteForeignKey(e) => (r.delete_foreign_key)(self, e),
            ChangeExpression::CreateConstraint(e) => (r.create_constraint)(self, e),
            ChangeExpression::DeleteConstraint(e) => (r.delete_constraint)(self, e),
            ChangeExpression::InsertData(e) => (r.insert_data)(self, e),
            ChangeExpression::DeleteData(e) => (r.delete_data)(self, e),
            ChangeExpression::ExecuteSql(e) => (r.execute_sql)(self, e),
        }
    }

    /// Render one expression as script text, one statement per line
    ///
    /// Notices become SQL comments.
    ///
    /// # Errors
    ///
    /// Same as [`Generator::generate`].
    pub fn generate_sql(&self, expression: &ChangeExpression) -> Result<String, MigrationError> {
        let statements = self.generate(expression)?;
        Ok(statements
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    pub(crate) fn syntax(&self) -> &'static DialectSyntax {
        self.syntax
    }

    pub(crate) fn unsupported(&self, message: &str) -> Result<Vec<Statement>, MigrationError> {
        self.options.compatibility.handle(self.dialect, message)
    }

    pub(crate) fn unsupported_kind(&self, kind: &str) -> Result<Vec<Statement>, MigrationError> {
        self.unsupported(&format!("{kind} is not supported for {}", self.dialect))
    }

    /// Quoted, possibly schema-qualified table name
    pub(crate) fn table(&self, table: &TableName) -> String {
        self.quoter.quote_table_name(table.schema.as_deref(), &table.name)
    }

    pub(crate) fn quote(&self, identifier: &str) -> String {
        self.quoter.quote(identifier)
    }

    pub(crate) fn quote_list<S: AsRef<str>>(&self, identifiers: &[S]) -> String {
        identifiers
            .iter()
            .map(|i| self.quoter.quote(i.as_ref()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Render a full column definition
    pub(crate) fn column(&self, column: &ColumnDefinition, mode: ColumnMode) -> String {
        self.columns.render(self, column, mode)
    }

    /// Render only the column type
    pub(crate) fn column_type(&self, column: &ColumnDefinition) -> String {
        self.columns.type_name(column)
    }

    pub(crate) fn default_value(&self, default: &crate::expression::DefaultValue) -> String {
        self.columns.default_value(&self.quoter, default)
    }
}

/// Replace `{key}` placeholders in a statement template
///
/// The template is scanned once, so text substituted for one placeholder is
/// never searched for another. Unknown placeholders are kept as written.
pub(crate) fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

pub(crate) fn sql(statement: String) -> Result<Vec<Statement>, MigrationError> {
    Ok(vec![Statement::Sql(statement)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{DbType, ExecuteSql};

    fn create_users() -> ChangeExpression {
        ChangeExpression::from(CreateTable {
            table: "Users".into(),
            columns: vec![
                ColumnDefinition::new("Id", DbType::Int32).primary_key().identity(),
                ColumnDefinition::new("Name", DbType::String).size(100).not_null(),
            ],
            primary_key_name: None,
        })
    }

    #[test]
    fn test_fill_replaces_every_placeholder() {
        assert_eq!(
            fill("DROP INDEX {name} ON {table}", &[("name", "`ix`"), ("table", "`t`")]),
            "DROP INDEX `ix` ON `t`"
        );
    }

    #[test]
    fn test_fill_does_not_rescan_substituted_text() {
        assert_eq!(
            fill("DROP INDEX {name} ON {table}", &[("name", "`{table}`"), ("table", "`Users`")]),
            "DROP INDEX `{table}` ON `Users`"
        );
        assert_eq!(
            fill("{table}.{column}", &[("table", "{column}"), ("column", "{name}")]),
            "{column}.{name}"
        );
        assert_eq!(fill("{missing} {table", &[("table", "t")]), "{missing} {table");
    }

    #[test]
    fn test_generate_sql_renders_notices_as_comments() {
        let generator = Generator::new(Dialect::MySql, GeneratorOptions::loose());
        let expr = ChangeExpression::from(AlterDefaultConstraint {
            table: "Users".into(),
            column: "Name".into(),
            default: Some("x".into()),
            constraint_name: None,
        });
        let sql = generator.generate_sql(&expr).unwrap();
        assert!(sql.starts_with("-- "));
        assert!(sql.contains("not supported"));
    }

    #[test]
    fn test_statement_display_does_not_double_semicolons() {
        assert_eq!(Statement::Sql("SELECT 1;".into()).to_string(), "SELECT 1;");
        assert_eq!(Statement::Sql("SELECT 1".into()).to_string(), "SELECT 1;");
    }

    #[test]
    fn test_execute_sql_is_verbatim_everywhere() {
        let expr = ChangeExpression::from(ExecuteSql {
            sql: "UPDATE x SET y = 1".into(),
        });
        for generator in [
            Generator::mysql(),
            Generator::postgres(),
            Generator::sqlite(),
            Generator::sql_server(),
        ] {
            assert_eq!(
                generator.generate(&expr).unwrap(),
                vec![Statement::Sql("UPDATE x SET y = 1".into())]
            );
        }
    }

    #[test]
    fn test_engine_clause_only_for_pluggable_engines() {
        let expr = create_users();
        let mysql = Generator::mysql().generate_sql(&expr).unwrap();
        assert!(mysql.ends_with(" ENGINE = INNODB;"), "{mysql}");

        for generator in [Generator::postgres(), Generator::sqlite(), Generator::sql_server()] {
            let sql = generator.generate_sql(&expr).unwrap();
            assert!(!sql.contains("ENGINE"), "{sql}");
        }
    }

    #[test]
    fn test_engine_clause_across_table_names() {
        for name in ["Users", "order", "weird`name", "x"] {
            let expr = ChangeExpression::from(CreateTable {
                table: name.into(),
                columns: vec![ColumnDefinition::new("Id", DbType::Int64)],
                primary_key_name: None,
            });
            let mysql = Generator::mysql().generate_sql(&expr).unwrap();
            assert_eq!(mysql.matches("ENGINE = INNODB").count(), 1, "{mysql}");
            let pg = Generator::postgres().generate_sql(&expr).unwrap();
            assert!(!pg.contains("ENGINE"));
        }
    }

    #[test]
    fn test_no_storage_engine_configured() {
        let generator = Generator::new(
            Dialect::MySql,
            GeneratorOptions {
                storage_engine: None,
                ..GeneratorOptions::default()
            },
        );
        let sql = generator.generate_sql(&create_users()).unwrap();
        assert!(!sql.contains("ENGINE"));
    }
}
