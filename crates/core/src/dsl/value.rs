//! JSON-serializable evaluation results.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::dsl::error::EvalError;

/// A single JSON scalar.
///
/// Non-finite floats are normalized to `Null` at construction time since
/// JSON has no representation for them.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

/// The legal output shapes of expression evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    Scalar(ScalarValue),
    Sequence(Vec<ScalarValue>),
    /// Ordered sequence of (value, label) pairs, serialized as nested arrays.
    Pairs(Vec<(ScalarValue, ScalarValue)>),
    /// Ordered mapping; entry order is preserved in the serialized output.
    Mapping(Vec<(String, ScalarValue)>),
}

impl ScalarValue {
    pub fn float(value: f64) -> Self {
        if value.is_finite() {
            ScalarValue::Float(value)
        } else {
            ScalarValue::Null
        }
    }

    /// Render the scalar as a mapping key.
    pub fn key_string(&self) -> String {
        match self {
            ScalarValue::Null => "null".to_string(),
            ScalarValue::Boolean(b) => b.to_string(),
            ScalarValue::Integer(i) => i.to_string(),
            ScalarValue::Float(f) => f.to_string(),
            ScalarValue::String(s) => s.clone(),
        }
    }
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScalarValue::Null => serializer.serialize_unit(),
            ScalarValue::Boolean(b) => serializer.serialize_bool(*b),
            ScalarValue::Integer(i) => serializer.serialize_i64(*i),
            ScalarValue::Float(f) => serializer.serialize_f64(*f),
            ScalarValue::String(s) => serializer.serialize_str(s),
        }
    }
}

impl Serialize for ResultValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResultValue::Scalar(scalar) => scalar.serialize(serializer),
            ResultValue::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ResultValue::Pairs(pairs) => {
                let mut seq = serializer.serialize_seq(Some(pairs.len()))?;
                for pair in pairs {
                    seq.serialize_element(&[&pair.0, &pair.1])?;
                }
                seq.end()
            }
            ResultValue::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl ResultValue {
    /// Serialize to canonical JSON text.
    pub fn to_json(&self) -> Result<String, EvalError> {
        serde_json::to_string(self).map_err(|error| EvalError::Serialize {
            message: error.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_serializes_as_array() {
        let value = ResultValue::Sequence(vec![
            ScalarValue::Integer(10),
            ScalarValue::Integer(20),
            ScalarValue::Integer(30),
        ]);
        assert_eq!(value.to_json().unwrap(), "[10,20,30]");
    }

    #[test]
    fn mapping_preserves_insertion_order() {
        let value = ResultValue::Mapping(vec![
            ("b".to_string(), ScalarValue::Integer(2)),
            ("a".to_string(), ScalarValue::Integer(1)),
        ]);
        assert_eq!(value.to_json().unwrap(), r#"{"b":2,"a":1}"#);
    }

    #[test]
    fn pairs_serialize_as_nested_arrays() {
        let value = ResultValue::Pairs(vec![
            (
                ScalarValue::String("north".to_string()),
                ScalarValue::String("A".to_string()),
            ),
            (
                ScalarValue::String("south".to_string()),
                ScalarValue::String("B".to_string()),
            ),
        ]);
        assert_eq!(
            value.to_json().unwrap(),
            r#"[["north","A"],["south","B"]]"#
        );
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(ScalarValue::float(f64::NAN), ScalarValue::Null);
        assert_eq!(ScalarValue::float(f64::INFINITY), ScalarValue::Null);
        assert_eq!(ScalarValue::float(1.5), ScalarValue::Float(1.5));
    }

    #[test]
    fn strings_are_escaped() {
        let value = ResultValue::Scalar(ScalarValue::String("a \"b\"".to_string()));
        assert_eq!(value.to_json().unwrap(), r#""a \"b\"""#);
    }
}
