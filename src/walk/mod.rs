//! Path resolution over nested values
//!
//! Two walkers share one contract: given a root and a [`PathExpression`],
//! produce a [`Resolved`] value. Neither ever fails. Any step that cannot be
//! taken (missing field, index out of range, missing key, nil indirection,
//! descending into a scalar) ends the walk with [`Resolved::Absent`].

mod native;
mod tree;

use std::fmt;

use serde_json::Value;

use crate::path::PathExpression;

pub use native::{resolve_native, to_value, Inspect, Kind, Mapping, Record, Sequence};
pub use tree::resolve_tree;

/// Outcome of walking a path.
///
/// `Absent` means the walk stopped early. A path that reaches a null leaf
/// resolves to `Value(Value::Null)`, which is a different thing.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Value(Value),
    Absent,
}

impl Resolved {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Absent => None,
        }
    }

    /// Kind name used in defect messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Value(value) => json_kind_name(value),
            Self::Absent => "absent",
        }
    }
}

impl From<Value> for Resolved {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Absent => f.write_str("<absent>"),
        }
    }
}

/// Root a scenario's assertions are resolved against.
#[derive(Clone, Copy)]
pub enum Root<'r> {
    /// Decoded response payload.
    Tree(&'r Value),
    /// Arbitrary in-memory result.
    Native(&'r dyn Inspect),
    /// The scenario produced nothing to resolve against.
    Empty,
}

impl Root<'_> {
    /// Resolve `path` with the walker that matches this root.
    pub fn resolve(&self, path: &PathExpression) -> Resolved {
        match self {
            Self::Tree(value) => resolve_tree(value, path),
            Self::Native(value) => resolve_native(*value, path),
            Self::Empty => Resolved::Absent,
        }
    }

    /// The whole root as a plain value.
    pub fn to_value(&self) -> Resolved {
        match self {
            Self::Tree(value) => Resolved::Value((*value).clone()),
            Self::Native(value) => Resolved::Value(to_value(*value)),
            Self::Empty => Resolved::Absent,
        }
    }
}

impl fmt::Debug for Root<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree(value) => f.debug_tuple("Tree").field(value).finish(),
            Self::Native(value) => f.debug_tuple("Native").field(&to_value(*value)).finish(),
            Self::Empty => f.write_str("Empty"),
        }
    }
}

/// Reason a walk stopped. Never leaves this module as an error; the
/// walkers log it and return `Absent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fault {
    NilIndirection,
    NoSuchField { record: &'static str },
    NotAnIndex,
    IndexOutOfBounds { len: usize },
    NoSuchKey,
    Scalar,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NilIndirection => f.write_str("nil indirection"),
            Self::NoSuchField { record } => write!(f, "no such field on {record}"),
            Self::NotAnIndex => f.write_str("segment is not a sequence index"),
            Self::IndexOutOfBounds { len } => write!(f, "index out of bounds (len {len})"),
            Self::NoSuchKey => f.write_str("no such key"),
            Self::Scalar => f.write_str("cannot descend into a scalar"),
        }
    }
}

pub(crate) fn json_kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "map",
    }
}
