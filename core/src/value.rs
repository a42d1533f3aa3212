//! Typed values produced by value parsers.
//!
//! The set of supported scalar kinds is closed: every argument binds either
//! one [`Value`], an ordered sequence of them, or nothing at all (see
//! [`BoundValue`]). Custom parsers still produce one of these kinds.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

/// Semantic type tag of a bound value.
///
/// # Examples
///
/// ```
/// use cmdbind_core::{Value, ValueKind};
///
/// assert_eq!(Value::Int(3).kind(), ValueKind::Int);
/// assert_eq!(ValueKind::Float.name(), "Float");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// `true` / `false`.
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// 64-bit floating point number.
    Float,
    /// Arbitrary text, taken verbatim.
    String,
    /// Filesystem path.
    Path,
    /// Network endpoint (IP address plus port).
    Endpoint,
}

impl ValueKind {
    /// Human-readable type name used in error messages and usage text.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "Boolean",
            Self::Int => "Integer",
            Self::Float => "Float",
            Self::String => "String",
            Self::Path => "Path",
            Self::Endpoint => "Endpoint",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Path(PathBuf),
    Endpoint(SocketAddr),
}

impl Value {
    /// Returns the kind tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::Path(_) => ValueKind::Path,
            Self::Endpoint(_) => ValueKind::Endpoint,
        }
    }

    /// Renders the value back into a token the matching built-in parser
    /// accepts.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdbind_core::Value;
    ///
    /// assert_eq!(Value::Float(123.0).render(), "123");
    /// assert_eq!(Value::Bool(false).render(), "false");
    /// ```
    pub fn render(&self) -> String {
        match self {
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::String(value) => value.clone(),
            Self::Path(value) => value.display().to_string(),
            Self::Endpoint(value) => value.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Int(value) => serializer.serialize_i64(*value),
            Self::Float(value) => serializer.serialize_f64(*value),
            Self::String(value) => serializer.serialize_str(value),
            Self::Path(_) | Self::Endpoint(_) => serializer.serialize_str(&self.render()),
        }
    }
}

/// What an argument is bound to after a parse.
///
/// Single-valued arguments bind [`BoundValue::Single`], "many" arguments
/// accumulate into [`BoundValue::Many`] in occurrence order, and an optional
/// argument without a declared default binds [`BoundValue::Absent`].
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// Optional argument that was neither supplied nor defaulted.
    Absent,
    /// One value.
    Single(Value),
    /// Ordered sequence of values.
    Many(Vec<Value>),
}

impl BoundValue {
    /// Returns the single value, if this is [`BoundValue::Single`].
    pub fn as_single(&self) -> Option<&Value> {
        match self {
            Self::Single(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the values of a sequence, if this is [`BoundValue::Many`].
    pub fn as_many(&self) -> Option<&[Value]> {
        match self {
            Self::Many(values) => Some(values),
            _ => None,
        }
    }

    /// Short description of the shape, used in mismatch errors.
    pub fn describe(&self) -> String {
        match self {
            Self::Absent => "no value".to_string(),
            Self::Single(value) => format!("a value of type {}", value.kind()),
            Self::Many(_) => "a sequence".to_string(),
        }
    }

    /// Returns `true` if every contained value has the given kind.
    pub(crate) fn has_kind(&self, kind: ValueKind) -> bool {
        match self {
            Self::Absent => true,
            Self::Single(value) => value.kind() == kind,
            Self::Many(values) => values.iter().all(|value| value.kind() == kind),
        }
    }
}

impl fmt::Display for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("<none>"),
            Self::Single(value) => value.fmt(f),
            Self::Many(values) => {
                let rendered = values.iter().map(Value::render).collect::<Vec<_>>();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

impl Serialize for BoundValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absent => serializer.serialize_none(),
            Self::Single(value) => value.serialize(serializer),
            Self::Many(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
        }
    }
}
