//! Typed cells of a parsed query response.

use chrono::{DateTime, FixedOffset};
use ordered_float::OrderedFloat;

/// A single cell of a parsed query row.
///
/// Only three column kinds are distinguished: `_value` is numeric,
/// `_start`, `_stop` and `_time` are timestamps, and everything else stays a
/// string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    /// Raw string token.
    String(String),

    /// 64-bit floating point value. Holds NaN when the token was not a number.
    Double(OrderedFloat<f64>),

    /// RFC3339 timestamp. `None` when the token was not a valid date.
    Time(Option<DateTime<FixedOffset>>),
}

impl Value {
    /// Returns the value as a string reference if it is a `String` variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a f64 if it is a `Double` variant.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(f.into_inner()),
            _ => None,
        }
    }

    /// Returns the timestamp if it is a valid `Time` variant.
    pub fn as_time(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Value::Time(t) => t.as_ref(),
            _ => None,
        }
    }

    /// Returns true for NaN doubles and invalid dates.
    pub fn is_invalid(&self) -> bool {
        match self {
            Value::String(_) => false,
            Value::Double(d) => d.is_nan(),
            Value::Time(t) => t.is_none(),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Double(d) => write!(f, "{}", d),
            Value::Time(Some(t)) => write!(f, "{}", t.to_rfc3339()),
            Value::Time(None) => write!(f, "Invalid Date"),
        }
    }
}
