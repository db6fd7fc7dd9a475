//! Bindable values, raw expressions, and the column/table references built
//! from them.
//!
//! A [`Value`] always compiles to a `?` placeholder and travels separately as a
//! binding. An [`Expression`] is literal SQL: it is emitted verbatim and never
//! produces a binding.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::query::Query;

// =============================================================================
// Values
// =============================================================================

/// A value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// A JSON document. Grammars decide how it is bound.
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert into a JSON value, used when building JSON payloads for
    /// bindings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Json(v) => v.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(ryu::Buffer::new().format(*x)),
            Value::Text(s) => f.write_str(s),
            Value::Json(v) => write!(f, "{}", v),
        }
    }
}

macro_rules! impl_value_from {
    ($($t:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(<$conv>::from(v))
                }
            }

            impl From<$t> for Operand {
                fn from(v: $t) -> Self {
                    Operand::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_value_from! {
    bool => Bool as bool,
    i32 => Int as i64,
    i64 => Int as i64,
    u32 => Int as i64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => Text as String,
    &str => Text as String,
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Json(other),
        }
    }
}

impl From<serde_json::Value> for Operand {
    fn from(v: serde_json::Value) -> Self {
        Operand::Value(Value::from(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        Operand::Value(Value::from(v))
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

// =============================================================================
// Raw expressions
// =============================================================================

/// A fragment of SQL emitted exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Expression {
    raw: String,
}

impl Expression {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { raw: sql.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Shorthand for [`Expression::new`].
pub fn raw(sql: impl Into<String>) -> Expression {
    Expression::new(sql)
}

/// Either literal SQL or a bound value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Raw(Expression),
    Value(Value),
}

impl Operand {
    /// The bound value, if this operand produces a binding.
    pub fn binding(&self) -> Option<&Value> {
        match self {
            Operand::Raw(_) => None,
            Operand::Value(v) => Some(v),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Operand::Value(Value::Null))
    }
}

impl From<Expression> for Operand {
    fn from(e: Expression) -> Self {
        Operand::Raw(e)
    }
}

/// One row of an insert or the assignments of an update.
///
/// Keys are kept sorted so every record of a batch lines up with the same
/// column list.
pub type Record = BTreeMap<String, Operand>;

/// A row returned by a connection.
pub type Row = BTreeMap<String, Value>;

/// Build a [`Record`] from `(column, value)` pairs.
pub fn record<K, V, I>(pairs: I) -> Record
where
    K: Into<String>,
    V: Into<Operand>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

// =============================================================================
// Column and table references
// =============================================================================

/// A column reference: a (possibly qualified, aliased or JSON-path) name, raw
/// SQL, or an aliased sub-select.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Column {
    Name(String),
    Raw(Expression),
    Sub { query: Box<Query>, alias: String },
}

impl Column {
    /// The plain name, if this is a named column.
    pub fn name(&self) -> Option<&str> {
        match self {
            Column::Name(n) => Some(n),
            _ => None,
        }
    }
}

impl From<&str> for Column {
    fn from(s: &str) -> Self {
        Column::Name(s.to_string())
    }
}

impl From<String> for Column {
    fn from(s: String) -> Self {
        Column::Name(s)
    }
}

impl From<&String> for Column {
    fn from(s: &String) -> Self {
        Column::Name(s.clone())
    }
}

impl From<Expression> for Column {
    fn from(e: Expression) -> Self {
        Column::Raw(e)
    }
}

/// A table reference in `from` or `join`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableRef {
    Name(String),
    Raw(Expression),
    Sub { query: Box<Query>, alias: String },
}

impl TableRef {
    pub fn name(&self) -> Option<&str> {
        match self {
            TableRef::Name(n) => Some(n),
            _ => None,
        }
    }
}

impl From<&str> for TableRef {
    fn from(s: &str) -> Self {
        TableRef::Name(s.to_string())
    }
}

impl From<String> for TableRef {
    fn from(s: String) -> Self {
        TableRef::Name(s)
    }
}

impl From<Expression> for TableRef {
    fn from(e: Expression) -> Self {
        TableRef::Raw(e)
    }
}
