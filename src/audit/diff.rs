//! Field-level diffs for audit entries

use serde_json::{Map, Value};

/// Fields that change on every write and would drown out real changes
const IGNORED_FIELDS: &[&str] = &["updated_at", "last_used_at"];

/// Summarise the changes between two JSON snapshots
///
/// Nested objects are walked and reported with dotted paths
/// (`scope.user_id: ...`); arrays are compared by length. Returns `None`
/// when nothing but ignored bookkeeping fields changed.
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let mut changes = Vec::new();
    collect_changes(before, after, "", &mut changes);

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn collect_changes(before: &Value, after: &Value, path: &str, changes: &mut Vec<String>) {
    match (before, after) {
        (Value::Object(b), Value::Object(a)) => diff_objects(b, a, path, changes),
        (Value::Array(b), Value::Array(a)) if b.len() != a.len() => {
            changes.push(format!(
                "{}: [{} items] -> [{} items]",
                label(path),
                b.len(),
                a.len()
            ));
        }
        _ if before != after => {
            changes.push(format!(
                "{}: {} -> {}",
                label(path),
                format_value(before),
                format_value(after)
            ));
        }
        _ => {}
    }
}

fn diff_objects(
    before: &Map<String, Value>,
    after: &Map<String, Value>,
    path: &str,
    changes: &mut Vec<String>,
) {
    for (key, old) in before {
        if IGNORED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        let field = join(path, key);
        match after.get(key) {
            Some(new) => collect_changes(old, new, &field, changes),
            None => changes.push(format!("{}: {} -> (removed)", field, format_value(old))),
        }
    }

    for (key, new) in after {
        if !before.contains_key(key) && !IGNORED_FIELDS.contains(&key.as_str()) {
            changes.push(format!(
                "{}: (added) -> {}",
                join(path, key),
                format_value(new)
            ));
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn label(path: &str) -> &str {
    if path.is_empty() {
        "value"
    } else {
        path
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.chars().count() > 50 => {
            let head: String = s.chars().take(47).collect();
            format!("\"{}...\"", head)
        }
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_changed_field() {
        let before = json!({"limit": 50000, "notes": ""});
        let after = json!({"limit": 35000, "notes": ""});
        assert_eq!(
            generate_diff(&before, &after),
            Some("limit: 50000 -> 35000".to_string())
        );
    }

    #[test]
    fn test_no_changes() {
        let value = json!({"name": "Groceries"});
        assert_eq!(generate_diff(&value, &value), None);
    }

    #[test]
    fn test_bookkeeping_fields_ignored() {
        let before = json!({"name": "Car", "updated_at": "2025-01-01T00:00:00Z"});
        let after = json!({"name": "Car", "updated_at": "2025-02-01T00:00:00Z"});
        assert_eq!(generate_diff(&before, &after), None);
    }

    #[test]
    fn test_nested_and_added_removed() {
        let before = json!({"scope": {"type": "personal"}, "old": 1});
        let after = json!({"scope": {"type": "family"}, "new": true});
        let diff = generate_diff(&before, &after).unwrap();

        assert!(diff.contains("scope.type: \"personal\" -> \"family\""));
        assert!(diff.contains("old: 1 -> (removed)"));
        assert!(diff.contains("new: (added) -> true"));
    }

    #[test]
    fn test_array_length_change() {
        let before = json!({"payments": [1]});
        let after = json!({"payments": [1, 2]});
        assert_eq!(
            generate_diff(&before, &after),
            Some("payments: [1 items] -> [2 items]".to_string())
        );
    }

    #[test]
    fn test_long_strings_truncated() {
        let long = "x".repeat(80);
        let diff = generate_diff(&json!({"d": ""}), &json!({"d": long})).unwrap();
        assert!(diff.ends_with("...\""));
    }

    #[test]
    fn test_scalar_values() {
        assert_eq!(
            generate_diff(&json!(1), &json!(2)),
            Some("value: 1 -> 2".to_string())
        );
    }
}
