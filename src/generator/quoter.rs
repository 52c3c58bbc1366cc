//! Identifier and literal quoting per dialect

use crate::expression::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteLiteral {
    /// `X'0aff'`
    HexString,
    /// `decode('0aff', 'hex')`
    Decode,
    /// `0x0AFF`
    HexNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoolLiteral {
    Numeric,
    Keyword,
}

/// Escapes identifiers, values and meta-SQL fragments for one dialect
///
/// Quoting an identifier wraps it in the dialect's quote characters and doubles
/// any closing quote inside it, so distinct names always produce distinct output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quoter {
    open: char,
    close: char,
    backslash_escapes: bool,
    unicode_prefix: bool,
    bytes: ByteLiteral,
    booleans: BoolLiteral,
}

impl Quoter {
    pub const MYSQL: Quoter = Quoter {
        open: '`',
        close: '`',
        backslash_escapes: true,
        unicode_prefix: false,
        bytes: ByteLiteral::HexString,
        booleans: BoolLiteral::Numeric,
    };

    pub const POSTGRES: Quoter = Quoter {
        open: '"',
        close: '"',
        backslash_escapes: false,
        unicode_prefix: false,
        bytes: ByteLiteral::Decode,
        booleans: BoolLiteral::Keyword,
    };

    pub const SQLITE: Quoter = Quoter {
        open: '"',
        close: '"',
        backslash_escapes: false,
        unicode_prefix: false,
        bytes: ByteLiteral::HexString,
        booleans: BoolLiteral::Numeric,
    };

    pub const SQL_SERVER: Quoter = Quoter {
        open: '[',
        close: ']',
        backslash_escapes: false,
        unicode_prefix: true,
        bytes: ByteLiteral::HexNumber,
        booleans: BoolLiteral::Numeric,
    };

    /// Quote an identifier
    #[must_use]
    pub fn quote(&self, identifier: &str) -> String {
        let mut quoted = String::with_capacity(identifier.len() + 2);
        quoted.push(self.open);
        for ch in identifier.chars() {
            if ch == self.close {
                quoted.push(ch);
            }
            quoted.push(ch);
        }
        quoted.push(self.close);
        quoted
    }

    /// Quote a table name, qualified by `schema` when given
    #[must_use]
    pub fn quote_table_name(&self, schema: Option<&str>, name: &str) -> String {
        match schema {
            Some(schema) if !schema.is_empty() => {
                format!("{}.{}", self.quote(schema), self.quote(name))
            }
            _ => self.quote(name),
        }
    }

    /// Quote a string literal
    #[must_use]
    pub fn quote_string(&self, value: &str) -> String {
        format!("'{}'", self.quote_command(value))
    }

    /// Escape a fragment that will be embedded inside a string literal
    ///
    /// Used for meta-SQL, where generated SQL text is itself a string value that
    /// the engine later prepares and executes.
    #[must_use]
    pub fn quote_command(&self, fragment: &str) -> String {
        let escaped = if self.backslash_escapes {
            fragment.replace('\\', "\\\\")
        } else {
            fragment.to_string()
        };
        escaped.replace('\'', "''")
    }

    /// Render a literal value
    #[must_use]
    pub fn quote_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => match (self.booleans, b) {
                (BoolLiteral::Numeric, true) => "1".to_string(),
                (BoolLiteral::Numeric, false) => "0".to_string(),
                (BoolLiteral::Keyword, true) => "TRUE".to_string(),
                (BoolLiteral::Keyword, false) => "FALSE".to_string(),
            },
            Value::Int(i) => i.to_string(),
            Value::Float(f) if f.is_finite() => f.to_string(),
            Value::Float(f) => self.quote_string(&f.to_string()),
            Value::Decimal(d) => d.clone(),
            Value::Text(s) if self.unicode_prefix => format!("N{}", self.quote_string(s)),
            Value::Text(s) => self.quote_string(s),
            Value::Bytes(bytes) => self.quote_bytes(bytes),
            Value::Date(d) => self.quote_string(&d.format("%Y-%m-%d").to_string()),
            Value::DateTime(dt) => {
                self.quote_string(&dt.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            }
            Value::Guid(g) => self.quote_string(&g.to_string()),
            Value::Raw(raw) => raw.clone(),
        }
    }

    fn quote_bytes(&self, bytes: &[u8]) -> String {
        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        match self.bytes {
            ByteLiteral::HexString => format!("X'{hex}'"),
            ByteLiteral::Decode => format!("decode('{hex}', 'hex')"),
            ByteLiteral::HexNumber if hex.is_empty() => "0x".to_string(),
            ByteLiteral::HexNumber => format!("0x{}", hex.to_uppercase()),
        }
    }
}
