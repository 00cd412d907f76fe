//! Values held by a [`ScimData`] container.

use super::ScimData;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde_json::{Number, Value};

/// A single SCIM value.
///
/// Unlike [`serde_json::Value`], date-times are a kind of their own, integers and
/// decimals are distinct, and objects are case-insensitive [`ScimData`]
/// containers.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScimValue {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    String(String),
    DateTime(DateTime<FixedOffset>),
    Complex(ScimData),
    List(Vec<ScimValue>),
}

impl ScimValue {
    /// Convert a JSON value. Strings are kept as strings; date-time coercion is
    /// done by schema-aware deserialization.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Decimal(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Complex(ScimData::from(map)),
        }
    }

    /// Plain JSON rendering. Date-times render as RFC 3339 strings.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Boolean(b) => Value::Bool(*b),
            Self::Integer(i) => Value::Number((*i).into()),
            Self::Decimal(d) => Number::from_f64(*d).map_or(Value::Null, Value::Number),
            Self::String(s) => Value::String(s.clone()),
            Self::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Complex(data) => data.to_plain(),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }

    /// Name of the value's kind, as used in type errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Decimal(_) => "decimal",
            Self::String(_) => "string",
            Self::DateTime(_) => "dateTime",
            Self::Complex(_) => "complex",
            Self::List(_) => "list",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the value counts as present: not null, not an empty string,
    /// not an empty list and not an empty container.
    pub fn is_present(&self) -> bool {
        match self {
            Self::Null => false,
            Self::String(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Complex(data) => !data.is_empty(),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of integers and decimals.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<&ScimData> {
        match self {
            Self::Complex(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_complex_mut(&mut self) -> Option<&mut ScimData> {
        match self {
            Self::Complex(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ScimValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<Value> for ScimValue {
    fn from(value: Value) -> Self {
        Self::from_json(value)
    }
}

impl From<&str> for ScimValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ScimValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ScimValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for ScimValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ScimValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for ScimValue {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<DateTime<FixedOffset>> for ScimValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::DateTime(value)
    }
}

impl From<ScimData> for ScimValue {
    fn from(value: ScimData) -> Self {
        Self::Complex(value)
    }
}

impl<T: Into<ScimValue>> From<Vec<T>> for ScimValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}
