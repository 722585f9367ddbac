//! Cache Key Module
//!
//! Derives deterministic cache keys from an endpoint name and a JSON
//! parameter object.

use std::collections::BTreeMap;

use serde_json::Value;

/// Builds the cache key `endpoint:canonical-params`.
///
/// Object keys are sorted at every nesting level, so two parameter sets that
/// differ only in key order produce the same key.
pub fn cache_key(endpoint: &str, params: &Value) -> String {
    format!("{}:{}", endpoint, canonical_json(params))
}

/// Serializes a JSON value with object keys sorted lexicographically.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            out.push('{');
            for (i, (key, val)) in sorted.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(val, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    #[test]
    fn test_key_format() {
        let key = cache_key("market-value", &json!({"vin": "1HGCM82633A004352"}));
        assert_eq!(key, r#"market-value:{"vin":"1HGCM82633A004352"}"#);
    }

    #[test]
    fn test_key_ignores_insertion_order() {
        let mut a = Map::new();
        a.insert("zip".into(), json!("90210"));
        a.insert("miles".into(), json!(42000));
        a.insert("vin".into(), json!("1HGCM82633A004352"));

        let mut b = Map::new();
        b.insert("vin".into(), json!("1HGCM82633A004352"));
        b.insert("zip".into(), json!("90210"));
        b.insert("miles".into(), json!(42000));

        assert_eq!(
            cache_key("market-value", &Value::Object(a)),
            cache_key("market-value", &Value::Object(b))
        );
    }

    #[test]
    fn test_nested_objects_are_sorted() {
        let value = json!({"b": {"z": 1, "a": [ {"y": 2, "x": 3} ]}, "a": null});
        assert_eq!(
            canonical_json(&value),
            r#"{"a":null,"b":{"a":[{"x":3,"y":2}],"z":1}}"#
        );
    }

    #[test]
    fn test_different_endpoints_do_not_collide() {
        let params = json!({"vin": "1HGCM82633A004352"});
        assert_ne!(cache_key("mmr", &params), cache_key("market-value", &params));
    }

    #[test]
    fn test_string_keys_are_escaped() {
        let value = json!({"we\"ird": "v"});
        assert_eq!(canonical_json(&value), r#"{"we\"ird":"v"}"#);
    }
}
