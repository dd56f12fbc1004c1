//! Canonical serialization for audit-entry `data`. The same form is
//! used on write and on verify; divergence between the two breaks the
//! chain for every entry appended after the bug is introduced.

use std::collections::BTreeMap;

use serde_json::Value;

/// Render `value` as a JSON string with object keys sorted, recursively.
/// Arrays keep their original order; scalars stringify via their normal
/// `serde_json` form.
pub fn canonical_json(value: &Value) -> String {
    serde_json::to_string(&sorted(value)).expect("canonicalized value always serializes")
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted_map: BTreeMap<String, Value> =
                map.iter().map(|(k, v)| (k.clone(), sorted(v))).collect();
            serde_json::to_value(sorted_map).expect("BTreeMap<String, Value> always serializes")
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_top_level_keys() {
        let value = json!({"b": 1, "a": 2});
        assert_eq!(canonical_json(&value), r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn sorts_nested_keys() {
        let value = json!({"z": {"b": 1, "a": 2}, "y": 3});
        assert_eq!(canonical_json(&value), r#"{"y":3,"z":{"a":2,"b":1}}"#);
    }

    #[test]
    fn preserves_array_order() {
        let value = json!({"items": [3, 1, 2]});
        assert_eq!(canonical_json(&value), r#"{"items":[3,1,2]}"#);
    }

    #[test]
    fn is_stable_across_equivalent_input_orderings() {
        let a = json!({"a": 1, "b": 2});
        let b = json!({"b": 2, "a": 1});
        assert_eq!(canonical_json(&a), canonical_json(&b));
    }
}
