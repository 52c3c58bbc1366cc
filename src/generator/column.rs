//! Column definition rendering

use super::{Generator, Quoter};
use crate::expression::{ColumnDefinition, DefaultValue};

/// Where a column definition is being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnMode {
    /// Inside `CREATE TABLE`; the primary key is inline only for single-column keys
    Create { inline_primary_key: bool },
    /// `ALTER TABLE ... ADD`
    Add,
    /// `ALTER TABLE ... ALTER/MODIFY`; keys and identity are left alone
    Alter,
}

/// One clause of a column definition after its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Clause {
    Type,
    Identity,
    Nullability,
    Default,
    PrimaryKey,
    Unique,
}

/// Per-dialect column syntax
pub struct ColumnSyntax {
    pub(crate) type_map: fn(&ColumnDefinition) -> String,
    pub(crate) clauses: &'static [Clause],
    pub(crate) identity: &'static str,
    /// SQLite only accepts AUTOINCREMENT on an inline INTEGER PRIMARY KEY
    pub(crate) identity_needs_inline_key: bool,
    pub(crate) current_timestamp: &'static str,
    pub(crate) new_guid: &'static str,
}

impl ColumnSyntax {
    pub(crate) fn type_name(&self, column: &ColumnDefinition) -> String {
        match &column.custom_type {
            Some(custom) => custom.clone(),
            None => (self.type_map)(column),
        }
    }

    pub(crate) fn default_value(&self, quoter: &Quoter, default: &DefaultValue) -> String {
        match default {
            DefaultValue::Value(value) => quoter.quote_value(value),
            DefaultValue::CurrentTimestamp => self.current_timestamp.to_string(),
            DefaultValue::NewGuid => self.new_guid.to_string(),
            DefaultValue::Raw(raw) => raw.clone(),
        }
    }

    pub(crate) fn render(
        &self,
        generator: &Generator,
        column: &ColumnDefinition,
        mode: ColumnMode,
    ) -> String {
        let inline_key = column.primary_key
            && match mode {
                ColumnMode::Create { inline_primary_key } => inline_primary_key,
                ColumnMode::Add => true,
                ColumnMode::Alter => false,
            };
        let altering = mode == ColumnMode::Alter;

        let mut parts = vec![generator.quote(&column.name)];
        for clause in self.clauses {
            match clause {
                Clause::Type => parts.push(self.type_name(column)),
                Clause::Identity => {
                    if column.identity
                        && !altering
                        && (inline_key || !self.identity_needs_inline_key)
                    {
                        parts.push(self.identity.to_string());
                    }
                }
                Clause::Nullability => match column.is_nullable() {
                    Some(false) => parts.push("NOT NULL".to_string()),
                    Some(true) => parts.push("NULL".to_string()),
                    None => {}
                },
                Clause::Default => {
                    if let Some(default) = &column.default {
                        parts.push(format!(
                            "DEFAULT {}",
                            self.default_value(generator.quoter(), default)
                        ));
                    }
                }
                Clause::PrimaryKey => {
                    if inline_key {
                        parts.push("PRIMARY KEY".to_string());
                    }
                }
                Clause::Unique => {
                    if column.unique && !altering && !inline_key {
                        parts.push("UNIQUE".to_string());
                    }
                }
            }
        }
        parts.join(" ")
    }
}

/// `NAME(size)`, falling back to `fallback` when no size was given
pub(crate) fn sized(name: &str, size: Option<u32>, fallback: u32) -> String {
    format!("{name}({})", size.unwrap_or(fallback))
}

/// `NAME(size)`, or `unbounded` when no size was given
pub(crate) fn sized_or(name: &str, size: Option<u32>, unbounded: &str) -> String {
    match size {
        Some(size) => format!("{name}({size})"),
        None => unbounded.to_string(),
    }
}

/// `DECIMAL(p,s)` with a default of `(19,5)`
pub(crate) fn decimal(name: &str, column: &ColumnDefinition) -> String {
    let (precision, scale) = column.precision.unwrap_or((19, 5));
    format!("{name}({precision},{scale})")
}
