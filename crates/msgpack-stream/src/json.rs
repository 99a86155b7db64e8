//! Rendering value trees as JSON.
//!
//! Raw payloads become strings when they are valid UTF-8 and byte arrays
//! otherwise. Map keys that are not text are rendered to their JSON text.
//! Extensions become `{"type": t, "data": [..]}`. Non-finite floats have no
//! JSON form and render as `null`.

use serde_json::{json, Map, Number};

use crate::value::{DecodedValue, Integer, Value};

pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Nil => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Integer(Integer::Unsigned(u)) => json!(u),
        Value::Integer(Integer::Signed(i)) => json!(i),
        Value::Float(f) => Number::from_f64(f.as_f64())
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Raw(bytes) => raw_to_json(bytes),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Map(pairs) => {
            let mut map = Map::with_capacity(pairs.len());
            for (key, val) in pairs {
                map.insert(key_to_string(key), to_json(val));
            }
            serde_json::Value::Object(map)
        }
        Value::Extension { type_tag, payload } => json!({ "type": type_tag, "data": payload }),
    }
}

/// Renders a single token. Headers render as `{"array": n}` or `{"map": n}`.
pub fn token_to_json(token: &DecodedValue) -> serde_json::Value {
    match token {
        DecodedValue::ArrayHeader(n) => json!({ "array": n }),
        DecodedValue::MapHeader(n) => json!({ "map": n }),
        DecodedValue::Nil => serde_json::Value::Null,
        DecodedValue::Bool(b) => serde_json::Value::Bool(*b),
        DecodedValue::Integer(i) => to_json(&Value::Integer(*i)),
        DecodedValue::Float(f) => to_json(&Value::Float(*f)),
        DecodedValue::Raw(bytes) => raw_to_json(bytes),
        DecodedValue::Extension { type_tag, payload } => {
            json!({ "type": type_tag, "data": payload })
        }
    }
}

fn raw_to_json(bytes: &[u8]) -> serde_json::Value {
    match std::str::from_utf8(bytes) {
        Ok(text) => serde_json::Value::String(text.to_owned()),
        Err(_) => json!(bytes),
    }
}

fn key_to_string(key: &Value) -> String {
    match key.as_str() {
        Some(text) => text.to_owned(),
        None => to_json(key).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Float;

    #[test]
    fn renders_nested_tree() {
        let value = Value::Map(vec![
            (Value::from("a"), Value::Array(vec![Value::from(1u64), Value::Nil])),
            (Value::from(2i64), Value::Raw(vec![0xff])),
        ]);
        assert_eq!(to_json(&value), json!({ "a": [1, null], "2": [255] }));
    }

    #[test]
    fn non_finite_floats_are_null() {
        assert_eq!(to_json(&Value::Float(Float::F64(f64::NAN))), json!(null));
        assert_eq!(to_json(&Value::Float(Float::F32(1.5))), json!(1.5));
    }

    #[test]
    fn tokens_render_headers() {
        assert_eq!(token_to_json(&DecodedValue::MapHeader(2)), json!({ "map": 2 }));
        assert_eq!(
            token_to_json(&DecodedValue::Extension {
                type_tag: -1,
                payload: vec![1]
            }),
            json!({ "type": -1, "data": [1] })
        );
    }
}
