//! Walker over in-memory values
//!
//! Introspection goes through the narrow [`Inspect`] trait: every value
//! describes itself as one of five [`Kind`]s. Records are usually wired up
//! with [`impl_record!`](crate::impl_record); std containers and scalars are
//! covered here.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt::Display;
use std::hash::Hash;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use super::{Fault, Resolved};
use crate::path::{segment_index, PathExpression};

/// A value that can describe its own shape.
pub trait Inspect {
    fn kind(&self) -> Kind<'_>;
}

/// The closed set of shapes the native walker understands.
pub enum Kind<'a> {
    Record(&'a dyn Record),
    Sequence(&'a dyn Sequence),
    Map(&'a dyn Mapping),
    /// Optional or pointer-like value; `None` is a nil indirection.
    Indirection(Option<&'a dyn Inspect>),
    Scalar(Value),
}

/// Structured type with named fields. Field lookup is exact and
/// case-sensitive.
pub trait Record {
    fn type_name(&self) -> &'static str;
    fn field_names(&self) -> &'static [&'static str];
    fn field(&self, name: &str) -> Option<&dyn Inspect>;
}

/// Ordered sequence addressed by index.
pub trait Sequence {
    fn len(&self) -> usize;
    fn get(&self, index: usize) -> Option<&dyn Inspect>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keyed map. Keys are compared in their string form.
pub trait Mapping {
    fn get(&self, key: &str) -> Option<&dyn Inspect>;
    fn entries(&self) -> Vec<(String, &dyn Inspect)>;
}

/// Resolve `path` against an in-memory value. Never fails; any step that
/// cannot be taken yields [`Resolved::Absent`].
pub fn resolve_native(root: &dyn Inspect, path: &PathExpression) -> Resolved {
    match walk(root, path) {
        Ok(value) => Resolved::Value(value),
        Err((segment, fault)) => {
            trace!(path = %path, segment = segment, %fault, "native path unresolved");
            Resolved::Absent
        }
    }
}

fn walk<'r>(root: &'r dyn Inspect, path: &PathExpression) -> Result<Value, (usize, Fault)> {
    let mut current = root;
    for (position, segment) in path.segments().iter().enumerate() {
        current = step(current, segment).map_err(|fault| (position, fault))?;
    }
    Ok(to_value(current))
}

fn step<'r>(current: &'r dyn Inspect, segment: &str) -> Result<&'r dyn Inspect, Fault> {
    match deref(current)?.kind() {
        Kind::Record(record) => record.field(segment).ok_or(Fault::NoSuchField {
            record: record.type_name(),
        }),
        Kind::Sequence(sequence) => {
            let index = segment_index(segment).ok_or(Fault::NotAnIndex)?;
            sequence.get(index).ok_or(Fault::IndexOutOfBounds {
                len: sequence.len(),
            })
        }
        Kind::Map(map) => map.get(segment).ok_or(Fault::NoSuchKey),
        Kind::Scalar(_) => Err(Fault::Scalar),
        // deref never stops on an indirection
        Kind::Indirection(_) => Err(Fault::NilIndirection),
    }
}

fn deref(mut value: &dyn Inspect) -> Result<&dyn Inspect, Fault> {
    loop {
        match value.kind() {
            Kind::Indirection(Some(inner)) => value = inner,
            Kind::Indirection(None) => return Err(Fault::NilIndirection),
            _ => return Ok(value),
        }
    }
}

/// Convert any inspectable value into a plain JSON-like value. Records and
/// maps become objects, sequences become arrays, nil indirections become
/// null.
pub fn to_value(value: &dyn Inspect) -> Value {
    match value.kind() {
        Kind::Scalar(value) => value,
        Kind::Indirection(None) => Value::Null,
        Kind::Indirection(Some(inner)) => to_value(inner),
        Kind::Sequence(sequence) => Value::Array(
            (0..sequence.len())
                .filter_map(|index| sequence.get(index))
                .map(to_value)
                .collect(),
        ),
        Kind::Record(record) => Value::Object(
            record
                .field_names()
                .iter()
                .filter_map(|name| {
                    record
                        .field(name)
                        .map(|field| (name.to_string(), to_value(field)))
                })
                .collect(),
        ),
        Kind::Map(map) => Value::Object(
            map.entries()
                .into_iter()
                .map(|(key, entry)| (key, to_value(entry)))
                .collect(),
        ),
    }
}

/// Implement [`Record`] and [`Inspect`] for a struct.
///
/// Fields are listed by name (or tuple index); `as "Name"` exposes a field
/// under a different path segment.
///
/// ```
/// use apicheck::impl_record;
///
/// struct Item {
///     name: String,
///     tags: Vec<String>,
/// }
///
/// impl_record!(Item { name as "Name", tags });
/// ```
#[macro_export]
macro_rules! impl_record {
    ($ty:ty { $($field:tt $(as $name:literal)?),* $(,)? }) => {
        impl $crate::walk::Record for $ty {
            fn type_name(&self) -> &'static str {
                stringify!($ty)
            }

            fn field_names(&self) -> &'static [&'static str] {
                &[$($crate::__record_field_name!($field $(, $name)?)),*]
            }

            fn field(&self, name: &str) -> Option<&dyn $crate::walk::Inspect> {
                $(
                    if name == $crate::__record_field_name!($field $(, $name)?) {
                        return Some(&self.$field);
                    }
                )*
                None
            }
        }

        impl $crate::walk::Inspect for $ty {
            fn kind(&self) -> $crate::walk::Kind<'_> {
                $crate::walk::Kind::Record(self)
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_field_name {
    ($field:tt) => {
        stringify!($field)
    };
    ($field:tt, $name:literal) => {
        $name
    };
}

macro_rules! scalar_inspect {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Inspect for $ty {
                fn kind(&self) -> Kind<'_> {
                    Kind::Scalar(Value::from(*self))
                }
            }
        )*
    };
}

scalar_inspect!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl Inspect for () {
    fn kind(&self) -> Kind<'_> {
        Kind::Scalar(Value::Null)
    }
}

impl Inspect for char {
    fn kind(&self) -> Kind<'_> {
        Kind::Scalar(Value::String(self.to_string()))
    }
}

impl Inspect for String {
    fn kind(&self) -> Kind<'_> {
        Kind::Scalar(Value::String(self.clone()))
    }
}

impl Inspect for str {
    fn kind(&self) -> Kind<'_> {
        Kind::Scalar(Value::String(self.to_owned()))
    }
}

impl Inspect for Cow<'_, str> {
    fn kind(&self) -> Kind<'_> {
        Kind::Scalar(Value::String(self.to_string()))
    }
}

impl Inspect for Value {
    fn kind(&self) -> Kind<'_> {
        match self {
            Value::Array(items) => Kind::Sequence(items),
            Value::Object(map) => Kind::Map(map),
            scalar => Kind::Scalar(scalar.clone()),
        }
    }
}

impl<T: Inspect> Inspect for Option<T> {
    fn kind(&self) -> Kind<'_> {
        Kind::Indirection(self.as_ref().map(|inner| inner as &dyn Inspect))
    }
}

/// References are never nil, so they take the shape of their target.
impl<T: Inspect + ?Sized> Inspect for &T {
    fn kind(&self) -> Kind<'_> {
        (**self).kind()
    }
}

impl<T: Inspect> Inspect for Box<T> {
    fn kind(&self) -> Kind<'_> {
        Kind::Indirection(Some(&**self as &dyn Inspect))
    }
}

impl<T: Inspect> Inspect for Rc<T> {
    fn kind(&self) -> Kind<'_> {
        Kind::Indirection(Some(&**self as &dyn Inspect))
    }
}

impl<T: Inspect> Inspect for Arc<T> {
    fn kind(&self) -> Kind<'_> {
        Kind::Indirection(Some(&**self as &dyn Inspect))
    }
}

impl<T: Inspect> Sequence for Vec<T> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn get(&self, index: usize) -> Option<&dyn Inspect> {
        self.as_slice().get(index).map(|item| item as &dyn Inspect)
    }
}

impl<T: Inspect> Inspect for Vec<T> {
    fn kind(&self) -> Kind<'_> {
        Kind::Sequence(self)
    }
}

impl<T: Inspect, const N: usize> Sequence for [T; N] {
    fn len(&self) -> usize {
        N
    }

    fn get(&self, index: usize) -> Option<&dyn Inspect> {
        self.as_slice().get(index).map(|item| item as &dyn Inspect)
    }
}

impl<T: Inspect, const N: usize> Inspect for [T; N] {
    fn kind(&self) -> Kind<'_> {
        Kind::Sequence(self)
    }
}

impl<T: Inspect> Sequence for VecDeque<T> {
    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn get(&self, index: usize) -> Option<&dyn Inspect> {
        VecDeque::get(self, index).map(|item| item as &dyn Inspect)
    }
}

impl<T: Inspect> Inspect for VecDeque<T> {
    fn kind(&self) -> Kind<'_> {
        Kind::Sequence(self)
    }
}

impl<K: Display + Eq + Hash, V: Inspect> Mapping for HashMap<K, V> {
    fn get(&self, key: &str) -> Option<&dyn Inspect> {
        self.iter()
            .find(|(candidate, _)| candidate.to_string() == key)
            .map(|(_, value)| value as &dyn Inspect)
    }

    fn entries(&self) -> Vec<(String, &dyn Inspect)> {
        self.iter()
            .map(|(key, value)| (key.to_string(), value as &dyn Inspect))
            .collect()
    }
}

impl<K: Display + Eq + Hash, V: Inspect> Inspect for HashMap<K, V> {
    fn kind(&self) -> Kind<'_> {
        Kind::Map(self)
    }
}

impl<K: Display + Ord, V: Inspect> Mapping for BTreeMap<K, V> {
    fn get(&self, key: &str) -> Option<&dyn Inspect> {
        self.iter()
            .find(|(candidate, _)| candidate.to_string() == key)
            .map(|(_, value)| value as &dyn Inspect)
    }

    fn entries(&self) -> Vec<(String, &dyn Inspect)> {
        self.iter()
            .map(|(key, value)| (key.to_string(), value as &dyn Inspect))
            .collect()
    }
}

impl<K: Display + Ord, V: Inspect> Inspect for BTreeMap<K, V> {
    fn kind(&self) -> Kind<'_> {
        Kind::Map(self)
    }
}

impl Mapping for serde_json::Map<String, Value> {
    fn get(&self, key: &str) -> Option<&dyn Inspect> {
        serde_json::Map::get(self, key).map(|value| value as &dyn Inspect)
    }

    fn entries(&self) -> Vec<(String, &dyn Inspect)> {
        self.iter()
            .map(|(key, value)| (key.clone(), value as &dyn Inspect))
            .collect()
    }
}
