//! Walker over decoded payload trees
//!
//! Response bodies decode into nested objects, arrays, and scalars. A
//! numeric segment indexes an array; on an object every segment is a key,
//! numeric or not.

use serde_json::Value;
use tracing::trace;

use super::{Fault, Resolved};
use crate::path::{segment_index, PathExpression};

/// Resolve `path` inside a decoded payload. Never fails; any step that
/// cannot be taken yields [`Resolved::Absent`].
pub fn resolve_tree(root: &Value, path: &PathExpression) -> Resolved {
    let mut current = root;
    for (position, segment) in path.segments().iter().enumerate() {
        match step(current, segment) {
            Ok(next) => current = next,
            Err(fault) => {
                trace!(path = %path, segment = position, %fault, "tree path unresolved");
                return Resolved::Absent;
            }
        }
    }
    Resolved::Value(current.clone())
}

fn step<'r>(current: &'r Value, segment: &str) -> Result<&'r Value, Fault> {
    match current {
        Value::Array(items) => {
            let index = segment_index(segment).ok_or(Fault::NotAnIndex)?;
            items
                .get(index)
                .ok_or(Fault::IndexOutOfBounds { len: items.len() })
        }
        Value::Object(map) => map.get(segment).ok_or(Fault::NoSuchKey),
        _ => Err(Fault::Scalar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(root: &Value, path: &str) -> Resolved {
        resolve_tree(root, &PathExpression::parse(path).unwrap())
    }

    fn body() -> Value {
        json!({"result": {"status": "ok", "list": ["foo", "bar"], "note": null}})
    }

    #[test]
    fn test_resolves_keys_and_indices() {
        let root = body();
        assert_eq!(resolve(&root, "result.status"), Resolved::Value(json!("ok")));
        assert_eq!(resolve(&root, "result.list.1"), Resolved::Value(json!("bar")));
        assert_eq!(resolve(&root, "result.list"), Resolved::Value(json!(["foo", "bar"])));
    }

    #[test]
    fn test_unwalkable_paths_are_absent() {
        let root = body();
        assert_eq!(resolve(&root, "result.list.5"), Resolved::Absent);
        assert_eq!(resolve(&root, "result.list.x"), Resolved::Absent);
        assert_eq!(resolve(&root, "result.missing"), Resolved::Absent);
        assert_eq!(resolve(&root, "result.status.more"), Resolved::Absent);
        assert_eq!(resolve(&root, "result.note.more"), Resolved::Absent);
    }

    #[test]
    fn test_null_leaf_is_present() {
        assert_eq!(resolve(&body(), "result.note"), Resolved::Value(Value::Null));
    }

    #[test]
    fn test_numeric_key_on_object() {
        let root = json!({"codes": {"404": "not found"}});
        assert_eq!(resolve(&root, "codes.404"), Resolved::Value(json!("not found")));
    }
}
