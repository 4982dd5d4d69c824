//! Points and their line-protocol encoding.
//!
//! `measurement[,tag_key=tag_value]* field_key=field_value[,field_key=field_value]* [timestamp]`
//!
//! Tags and fields are written in the order they were added. Values are
//! written as-is; no escaping is applied.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A field value of a [`Point`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Boolean(bool),
    Integer(i64),
    UnsignedInteger(u64),
    Float(f64),
    String(String),
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Boolean(v) => write!(f, "{}", v),
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::UnsignedInteger(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::String(v) => write!(f, "\"{}\"", v),
        }
    }
}

macro_rules! from_impl {
        ( $variant:ident => $( $typ:ident ),* ) => (
            $(
                impl From<$typ> for FieldValue {
                    fn from(b: $typ) -> Self {
                        FieldValue::$variant(b.into())
                    }
                }
            )*
        )
}
from_impl! {Float => f32, f64}
from_impl! {Integer => i8, i16, i32, i64}
from_impl! {UnsignedInteger => u8, u16, u32, u64}
from_impl! {Boolean => bool}
from_impl! {String => String}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

/// Point timestamp, interpreted by the server according to the write precision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Integer(i64),
    Text(String),
}

impl Timestamp {
    /// True for an empty `Text` timestamp, which is written as if absent.
    pub fn is_empty(&self) -> bool {
        matches!(self, Timestamp::Text(v) if v.is_empty())
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Integer(v) => write!(f, "{}", v),
            Timestamp::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Timestamp {
    fn from(v: i64) -> Self {
        Timestamp::Integer(v)
    }
}

impl From<i32> for Timestamp {
    fn from(v: i32) -> Self {
        Timestamp::Integer(v.into())
    }
}

impl From<String> for Timestamp {
    fn from(v: String) -> Self {
        Timestamp::Text(v)
    }
}

impl From<&str> for Timestamp {
    fn from(v: &str) -> Self {
        Timestamp::Text(v.to_string())
    }
}

/// A single point to write.
///
/// ```
/// use influxdb_http::Point;
///
/// let point = Point::new("m")
///     .add_tag("t1", "v1")
///     .add_field("f1", 1.5)
///     .add_field("f2", "s")
///     .timestamp(1000);
///
/// assert_eq!(point.to_line().unwrap(), r#"m,t1=v1 f1=1.5,f2="s" 1000"#);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub measurement: String,
    #[serde(default)]
    pub tags: Vec<(String, String)>,
    pub fields: Vec<(String, FieldValue)>,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

impl Point {
    /// Point with no tags, fields or timestamp.
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: Vec::new(),
            fields: Vec::new(),
            timestamp: None,
        }
    }

    /// Append a tag; tags are written in insertion order.
    #[must_use = "Creating a point is pointless if it isn't written"]
    pub fn add_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    /// Append a field; a point needs at least one to be written.
    #[must_use = "Creating a point is pointless if it isn't written"]
    pub fn add_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// Set the timestamp, in the unit given by the write precision.
    #[must_use = "Creating a point is pointless if it isn't written"]
    pub fn timestamp(mut self, timestamp: impl Into<Timestamp>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Render this point as one line of line protocol.
    ///
    /// Fails with [`Error::InvalidPoint`] if the point has no fields, since the
    /// server rejects such lines.
    pub fn to_line(&self) -> Result<String> {
        if self.fields.is_empty() {
            return Err(Error::InvalidPoint {
                message: format!("point `{}` has no fields", self.measurement),
            });
        }

        let tags = self
            .tags
            .iter()
            .map(|(key, value)| format!(",{}={}", key, value))
            .collect::<String>();

        let fields = self
            .fields
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<String>>()
            .join(",");

        let timestamp = match &self.timestamp {
            Some(ts) if !ts.is_empty() => format!(" {}", ts),
            _ => String::new(),
        };

        Ok(format!("{}{} {}{}", self.measurement, tags, fields, timestamp))
    }
}

/// Render a batch of points, one line each, joined by `\n`.
pub fn to_line_protocol(points: &[Point]) -> Result<String> {
    let lines = points
        .iter()
        .map(Point::to_line)
        .collect::<Result<Vec<String>>>()?;
    Ok(lines.join("\n"))
}
