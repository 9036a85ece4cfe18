//! Value codec: dialect-aware rendering of literals and identifiers.
//!
//! Literal and identifier escaping are separate code paths. Nothing rendered
//! by [`quote_identifier`] passes through [`format_sql_string`] unless the
//! caller explicitly needs an identifier as a string literal (e.g. a
//! `regclass` argument).

mod value;

pub use value::*;

use value::format_float;

use crate::schema::FieldType;
use serde::{Deserialize, Serialize};

/// Target SQL dialect for generated statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    #[default]
    Postgres,
    #[serde(rename = "mysql")]
    MySql,
    Sqlite,
    Mssql,
}

impl std::str::FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(SqlDialect::Postgres),
            "mysql" | "mariadb" => Ok(SqlDialect::MySql),
            "sqlite" | "sqlite3" => Ok(SqlDialect::Sqlite),
            "mssql" | "sqlserver" | "tsql" => Ok(SqlDialect::Mssql),
            _ => Err(format!(
                "Unknown dialect: {}. Valid options: postgres, mysql, sqlite, mssql",
                s
            )),
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlDialect::Postgres => write!(f, "postgres"),
            SqlDialect::MySql => write!(f, "mysql"),
            SqlDialect::Sqlite => write!(f, "sqlite"),
            SqlDialect::Mssql => write!(f, "mssql"),
        }
    }
}

impl SqlDialect {
    /// Whether `DEFAULT` may appear inside a `VALUES` list.
    pub fn supports_default_keyword(&self) -> bool {
        !matches!(self, SqlDialect::Sqlite)
    }
}

/// A rendered value slot in a statement.
///
/// `Default` is the "use schema default" marker. It is kept as a distinct
/// token until the statement is assembled, so no user value can ever be
/// mistaken for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlLiteral {
    Rendered(String),
    Default,
}

impl SqlLiteral {
    pub fn null() -> Self {
        SqlLiteral::Rendered("NULL".to_string())
    }

    pub fn is_default(&self) -> bool {
        matches!(self, SqlLiteral::Default)
    }

    /// Final SQL text of this slot.
    pub fn as_sql(&self) -> &str {
        match self {
            SqlLiteral::Rendered(s) => s,
            SqlLiteral::Default => "DEFAULT",
        }
    }
}

/// Quote an identifier based on dialect
pub fn quote_identifier(dialect: SqlDialect, name: &str) -> String {
    match dialect {
        SqlDialect::MySql => format!("`{}`", name.replace('`', "``")),
        SqlDialect::Postgres | SqlDialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
        SqlDialect::Mssql => format!("[{}]", name.replace(']', "]]")),
    }
}

/// Quote a possibly schema-qualified name.
pub fn qualified_name(dialect: SqlDialect, schema: Option<&str>, name: &str) -> String {
    match schema {
        Some(s) if !s.is_empty() => format!(
            "{}.{}",
            quote_identifier(dialect, s),
            quote_identifier(dialect, name)
        ),
        _ => quote_identifier(dialect, name),
    }
}

/// Format a string for SQL with proper escaping based on dialect
pub fn format_sql_string(dialect: SqlDialect, value: &str) -> String {
    match dialect {
        SqlDialect::MySql => {
            // MySQL uses backslash escaping
            let escaped = value
                .replace('\\', "\\\\")
                .replace('\'', "\\'")
                .replace('\n', "\\n")
                .replace('\r', "\\r")
                .replace('\t', "\\t")
                .replace('\0', "\\0");
            format!("'{}'", escaped)
        }
        SqlDialect::Postgres | SqlDialect::Sqlite => {
            let escaped = value.replace('\'', "''");
            format!("'{}'", escaped)
        }
        SqlDialect::Mssql => {
            let escaped = value.replace('\'', "''");
            if value.bytes().any(|b| b > 127) {
                format!("N'{}'", escaped)
            } else {
                format!("'{}'", escaped)
            }
        }
    }
}

/// Render an optional value as a literal for a column of the given type.
pub fn render_value(dialect: SqlDialect, ty: &FieldType, value: Option<&Value>) -> String {
    match value {
        None => "NULL".to_string(),
        Some(v) => render_typed(dialect, ty, v),
    }
}

fn render_typed(dialect: SqlDialect, ty: &FieldType, value: &Value) -> String {
    match ty {
        FieldType::Int | FieldType::BigInt | FieldType::Float | FieldType::Decimal => {
            render_number(dialect, value)
        }
        FieldType::Bool => render_bool(dialect, value),
        FieldType::Text | FieldType::Uuid | FieldType::Enum(_) => {
            format_sql_string(dialect, &value.to_text())
        }
        FieldType::DateTimeTz => render_temporal(dialect, value),
        FieldType::Date | FieldType::Time | FieldType::DateTime => {
            format_sql_string(dialect, &value.to_text())
        }
        FieldType::Json => format_sql_string(dialect, &value.to_json().to_string()),
        FieldType::Bytes => match value {
            Value::Bytes(b) => render_bytes(dialect, b),
            other => format_sql_string(dialect, &other.to_text()),
        },
        FieldType::Array(element) => render_array(dialect, element, value),
        FieldType::Other(_) => render_untyped(dialect, value),
    }
}

/// Render a value using only its own runtime type.
fn render_untyped(dialect: SqlDialect, value: &Value) -> String {
    match value {
        Value::Bool(_) => render_bool(dialect, value),
        Value::Int(_) | Value::Float(_) => render_number(dialect, value),
        Value::Bytes(b) => render_bytes(dialect, b),
        Value::DateTimeTz(_) => render_temporal(dialect, value),
        Value::Array(_) => render_array(dialect, &FieldType::Other(String::new()), value),
        Value::Json(j) => format_sql_string(dialect, &j.to_string()),
        other => format_sql_string(dialect, &other.to_text()),
    }
}

fn render_number(dialect: SqlDialect, value: &Value) -> String {
    match value {
        Value::Int(i) => i.to_string(),
        Value::Float(f) if f.is_finite() => format_float(*f),
        Value::Float(f) => format_sql_string(dialect, &format_float(*f)),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Text(s) if is_numeric_literal(s) => s.trim().to_string(),
        other => format_sql_string(dialect, &other.to_text()),
    }
}

fn render_bool(dialect: SqlDialect, value: &Value) -> String {
    let b = match value {
        Value::Bool(b) => Some(*b),
        Value::Int(i) => Some(*i != 0),
        Value::Text(s) => match s.to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Some(true),
            "false" | "f" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };

    match b {
        Some(b) => bool_literal(dialect, b).to_string(),
        None => format_sql_string(dialect, &value.to_text()),
    }
}

fn bool_literal(dialect: SqlDialect, b: bool) -> &'static str {
    match (dialect, b) {
        (SqlDialect::Postgres, true) => "TRUE",
        (SqlDialect::Postgres, false) => "FALSE",
        (_, true) => "1",
        (_, false) => "0",
    }
}

fn render_temporal(dialect: SqlDialect, value: &Value) -> String {
    match (dialect, value) {
        // MySQL and SQLite have no offset-aware timestamp literal; store UTC.
        (SqlDialect::MySql | SqlDialect::Sqlite, Value::DateTimeTz(dt)) => format_sql_string(
            dialect,
            &dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.f").to_string(),
        ),
        _ => format_sql_string(dialect, &value.to_text()),
    }
}

fn render_bytes(dialect: SqlDialect, bytes: &[u8]) -> String {
    match dialect {
        SqlDialect::Postgres => format!("'\\x{}'", hex::encode(bytes)),
        SqlDialect::MySql | SqlDialect::Sqlite => format!("X'{}'", hex::encode(bytes)),
        SqlDialect::Mssql => format!("0x{}", hex::encode(bytes)),
    }
}

fn render_array(dialect: SqlDialect, element: &FieldType, value: &Value) -> String {
    let Value::Array(items) = value else {
        return render_typed(dialect, element, value);
    };

    match dialect {
        // Array input literals are untyped and coerce to the column's array type.
        SqlDialect::Postgres => format_sql_string(dialect, &pg_array_literal(element, items)),
        _ => format_sql_string(dialect, &value.to_json().to_string()),
    }
}

/// Postgres array input syntax: `{"a","b",NULL}`, nested for inner arrays.
fn pg_array_literal(element: &FieldType, items: &[Option<Value>]) -> String {
    let mut out = String::from("{");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        match item {
            None => out.push_str("NULL"),
            Some(Value::Array(inner)) => {
                let inner_element = match element {
                    FieldType::Array(e) => e.as_ref(),
                    other => other,
                };
                out.push_str(&pg_array_literal(inner_element, inner));
            }
            Some(v) => {
                let text = match (element, v) {
                    (_, Value::Bytes(b)) => format!("\\x{}", hex::encode(b)),
                    (FieldType::Json, v) => v.to_json().to_string(),
                    (_, v) => v.to_text(),
                };
                out.push('"');
                for c in text.chars() {
                    if matches!(c, '"' | '\\') {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push('"');
            }
        }
    }
    out.push('}');
    out
}

/// Whether text can be emitted as an unquoted numeric literal.
fn is_numeric_literal(s: &str) -> bool {
    let s = s.trim();
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    !digits.is_empty()
        && digits.chars().any(|c| c.is_ascii_digit())
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+'))
        && s.parse::<f64>().map(|f| f.is_finite()).unwrap_or(false)
}
