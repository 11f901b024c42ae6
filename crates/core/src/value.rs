//! The recursive value universe for variants, context, and tracked payloads.
//!
//! [`Value`] is deliberately narrower than an arbitrary Rust type: anything a
//! caller wants scored or tracked must first be expressed in these six
//! shapes. Unlike `serde_json::Value`, a `Number` may carry NaN — the feature
//! encoder needs to see (and skip) it. The wire boundary is [`Value::to_json`],
//! which rejects non-finite numbers, so nothing un-encodable ever reaches a
//! tracking payload.

use std::collections::BTreeMap;

use crate::error::{RankwerkError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    /// Keys are strings by construction, so a non-string map key cannot
    /// reach the encoder or the wire.
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts to `serde_json::Value`, failing on the first non-finite
    /// number at any nesting depth. This is the "JSON-encodable" validator:
    /// every outgoing payload field passes through here before a network
    /// attempt is made.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        match self {
            Value::Null => Ok(serde_json::Value::Null),
            Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .ok_or_else(|| {
                    RankwerkError::InvalidArgument(format!("number {n} is not JSON encodable"))
                }),
            Value::String(s) => Ok(serde_json::Value::String(s.clone())),
            Value::List(items) => Ok(serde_json::Value::Array(
                items.iter().map(Value::to_json).collect::<Result<_>>()?,
            )),
            Value::Map(map) => {
                let mut object = serde_json::Map::with_capacity(map.len());
                for (key, value) in map {
                    object.insert(key.clone(), value.to_json()?);
                }
                Ok(serde_json::Value::Object(object))
            }
        }
    }

    /// Lossless for null/bool/string/array/object; integers outside the f64
    /// mantissa lose precision, matching what a JSON round-trip would do.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_map() -> Value {
        [
            ("flag".to_string(), Value::Bool(true)),
            ("count".to_string(), Value::from(3i64)),
            (
                "tags".to_string(),
                Value::List(vec![Value::from("a"), Value::Null]),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn nested_values_encode_to_json() {
        let json = sample_map().to_json().unwrap();
        assert_eq!(
            json,
            json!({"flag": true, "count": 3.0, "tags": ["a", null]})
        );
    }

    #[test]
    fn non_finite_numbers_are_rejected_at_any_depth() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let value: Value = [(
                "outer".to_string(),
                Value::List(vec![Value::Map(
                    [("inner".to_string(), Value::Number(bad))].into_iter().collect(),
                )]),
            )]
            .into_iter()
            .collect();
            assert!(matches!(
                value.to_json(),
                Err(RankwerkError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn json_round_trip_preserves_structure() {
        let original = json!({"a": [1.5, false, null], "b": {"c": "x"}});
        let value = Value::from_json(&original);
        assert_eq!(value.to_json().unwrap(), original);
    }
}
