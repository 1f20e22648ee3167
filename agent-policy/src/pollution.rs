//! Prototype-pollution screening for untrusted JSON.
//!
//! Arguments produced by a model may later be merged into objects by
//! downstream consumers written in other runtimes. Keys that rewrite shared
//! prototype state there are rejected outright.

use serde_json::Value;

/// Key names rejected anywhere in an argument document.
pub const DANGEROUS_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Deepest nesting level whose keys are inspected; deeper keys are treated
/// as safe so hostile documents cannot force unbounded recursion.
pub const MAX_SCAN_DEPTH: usize = 10;

/// Returns `true` when `value` contains a dangerous key within
/// [`MAX_SCAN_DEPTH`] levels. Objects and arrays each count as one level.
#[must_use]
pub fn contains_dangerous_keys(value: &Value) -> bool {
    scan(value, 0)
}

fn scan(value: &Value, depth: usize) -> bool {
    if depth > MAX_SCAN_DEPTH {
        return false;
    }

    match value {
        Value::Object(map) => map
            .iter()
            .any(|(key, nested)| is_dangerous(key) || scan(nested, depth + 1)),
        Value::Array(items) => items.iter().any(|item| scan(item, depth + 1)),
        _ => false,
    }
}

fn is_dangerous(key: &str) -> bool {
    DANGEROUS_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nested(levels: usize, leaf: Value) -> Value {
        (0..levels).fold(leaf, |inner, _| json!({ "n": inner }))
    }

    #[test]
    fn flags_dangerous_keys_at_any_shallow_level() {
        assert!(contains_dangerous_keys(&json!({ "__proto__": { "x": 1 } })));
        assert!(contains_dangerous_keys(&json!({ "constructor": { "prototype": {} } })));
        assert!(contains_dangerous_keys(&json!({ "a": { "b": { "__proto__": {} } } })));
        assert!(contains_dangerous_keys(&json!({ "list": [{ "ok": 1 }, { "prototype": 2 }] })));
    }

    #[test]
    fn accepts_clean_documents() {
        assert!(!contains_dangerous_keys(&json!({ "a": 1, "b": [1, 2, { "c": "proto" }] })));
        assert!(!contains_dangerous_keys(&json!({ "description": "__proto__" })));
    }

    #[test]
    fn stops_scanning_past_depth_limit() {
        let shallow = nested(MAX_SCAN_DEPTH, json!({ "__proto__": 1 }));
        assert!(contains_dangerous_keys(&shallow));

        let deep = nested(MAX_SCAN_DEPTH + 1, json!({ "__proto__": 1 }));
        assert!(!contains_dangerous_keys(&deep));
    }
}
