//! Building blocks shared by change expressions
//!
//! Tables, columns, indexes, foreign keys and literal values are described here
//! without reference to any SQL dialect. Rendering happens in [`crate::generator`].

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use uuid::Uuid;

/// A table name, optionally qualified by a schema
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    /// Schema (or database, on MySQL) the table lives in
    pub schema: Option<String>,
    /// Unqualified table name
    pub name: String,
}

impl TableName {
    /// An unqualified table name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    /// A schema-qualified table name
    pub fn with_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Fill in `schema` when the name is unqualified
    #[must_use]
    pub fn or_schema(mut self, schema: Option<&str>) -> Self {
        if self.schema.is_none() {
            self.schema = schema.map(str::to_string);
        }
        self
    }
}

impl From<&str> for TableName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TableName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Dialect-neutral column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbType {
    /// Variable-length non-unicode string
    AnsiString,
    /// Variable-length unicode string
    String,
    /// Fixed-length string
    FixedString,
    /// Unbounded text
    Text,
    Boolean,
    Byte,
    Int16,
    Int32,
    Int64,
    /// Exact numeric with precision and scale
    Decimal,
    Float,
    Double,
    Date,
    Time,
    DateTime,
    DateTimeOffset,
    Guid,
    Binary,
    Json,
}

impl DbType {
    /// Whether the type maps to an integer type that can carry an identity
    #[must_use]
    pub fn is_integer(self) -> bool {
        matches!(self, DbType::Byte | DbType::Int16 | DbType::Int32 | DbType::Int64)
    }
}

/// A literal value used in defaults and data expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact decimal kept in its textual form
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Guid(Uuid),
    /// Inserted verbatim; the caller is responsible for its validity
    Raw(String),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Guid(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Default value of a column
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// A literal
    Value(Value),
    /// The engine's current date/time function
    CurrentTimestamp,
    /// The engine's GUID/UUID generator
    NewGuid,
    /// A raw SQL expression
    Raw(String),
}

macro_rules! default_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for DefaultValue {
                fn from(v: $ty) -> Self {
                    DefaultValue::Value(v.into())
                }
            }
        )*
    };
}

default_from!(Value, bool, i32, i64, f64, &str, String, NaiveDate, NaiveDateTime, Uuid);

/// Column definition used by table creation and column changes
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub db_type: DbType,
    /// Length for strings and binaries
    pub size: Option<u32>,
    /// `(precision, scale)` for decimals
    pub precision: Option<(u32, u32)>,
    /// Overrides the type map with a literal type name
    pub custom_type: Option<String>,
    /// `None` leaves nullability to the engine default
    pub nullable: Option<bool>,
    pub primary_key: bool,
    pub identity: bool,
    pub unique: bool,
    pub default: Option<DefaultValue>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, db_type: DbType) -> Self {
        Self {
            name: name.into(),
            db_type,
            size: None,
            precision: None,
            custom_type: None,
            nullable: None,
            primary_key: false,
            identity: false,
            unique: false,
            default: None,
        }
    }

    #[must_use]
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some((precision, scale));
        self
    }

    #[must_use]
    pub fn custom_type(mut self, type_name: impl Into<String>) -> Self {
        self.custom_type = Some(type_name.into());
        self
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = Some(false);
        self
    }

    #[must_use]
    pub fn null(mut self) -> Self {
        self.nullable = Some(true);
        self
    }

    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    #[must_use]
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn default(mut self, default: impl Into<DefaultValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Effective nullability: primary keys are never nullable
    #[must_use]
    pub fn is_nullable(&self) -> Option<bool> {
        if self.primary_key {
            Some(false)
        } else {
            self.nullable
        }
    }
}

/// Sort direction of an index column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// One column of an index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    pub name: String,
    pub direction: SortDirection,
}

/// Index descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    /// Empty until conventions assign a name
    pub name: String,
    pub table: TableName,
    pub columns: Vec<IndexColumn>,
    pub unique: bool,
}

impl IndexDefinition {
    pub fn new(table: impl Into<TableName>) -> Self {
        Self {
            name: String::new(),
            table: table.into(),
            columns: Vec::new(),
            unique: false,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.columns.push(IndexColumn {
            name: name.into(),
            direction: SortDirection::Ascending,
        });
        self
    }

    #[must_use]
    pub fn column_desc(mut self, name: impl Into<String>) -> Self {
        self.columns.push(IndexColumn {
            name: name.into(),
            direction: SortDirection::Descending,
        });
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Referential action of a foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rule {
    /// No clause is emitted; the engine default applies
    #[default]
    None,
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
}

impl Rule {
    pub(crate) fn as_sql(self) -> Option<&'static str> {
        match self {
            Rule::None => None,
            Rule::Cascade => Some("CASCADE"),
            Rule::SetNull => Some("SET NULL"),
            Rule::SetDefault => Some("SET DEFAULT"),
            Rule::Restrict => Some("RESTRICT"),
        }
    }
}

/// Foreign key descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDefinition {
    /// Empty until conventions assign a name
    pub name: String,
    /// Referencing table
    pub foreign_table: TableName,
    pub foreign_columns: Vec<String>,
    /// Referenced table
    pub primary_table: TableName,
    pub primary_columns: Vec<String>,
    pub on_delete: Rule,
    pub on_update: Rule,
}

impl ForeignKeyDefinition {
    pub fn new(
        foreign_table: impl Into<TableName>,
        foreign_column: impl Into<String>,
        primary_table: impl Into<TableName>,
        primary_column: impl Into<String>,
    ) -> Self {
        Self {
            name: String::new(),
            foreign_table: foreign_table.into(),
            foreign_columns: vec![foreign_column.into()],
            primary_table: primary_table.into(),
            primary_columns: vec![primary_column.into()],
            on_delete: Rule::None,
            on_update: Rule::None,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn on_delete(mut self, rule: Rule) -> Self {
        self.on_delete = rule;
        self
    }

    #[must_use]
    pub fn on_update(mut self, rule: Rule) -> Self {
        self.on_update = rule;
        self
    }
}

/// Kind of a named table constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
}

/// One row of column/value pairs, kept in insertion order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataRow(pub Vec<(String, Value)>);

impl DataRow {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.push((column.into(), value.into()));
        self
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(c, _)| c.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, v)| v)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_display() {
        assert_eq!(TableName::new("Users").to_string(), "Users");
        assert_eq!(TableName::with_schema("auth", "Users").to_string(), "auth.Users");
    }

    #[test]
    fn test_or_schema_keeps_explicit_schema() {
        let explicit = TableName::with_schema("auth", "Users").or_schema(Some("public"));
        assert_eq!(explicit.schema.as_deref(), Some("auth"));

        let filled = TableName::new("Users").or_schema(Some("public"));
        assert_eq!(filled.schema.as_deref(), Some("public"));
    }

    #[test]
    fn test_primary_key_is_never_nullable() {
        let column = ColumnDefinition::new("Id", DbType::Int32).null().primary_key();
        assert_eq!(column.is_nullable(), Some(false));
    }

    #[test]
    fn test_value_from_option() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".to_string()));
    }

    #[test]
    fn test_data_row_preserves_order() {
        let row = DataRow::new().set("b", 2).set("a", 1);
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["b", "a"]);
    }
}
