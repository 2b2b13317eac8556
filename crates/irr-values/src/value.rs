//! The dynamic values tree.
//!
//! Chart values arrive from the loader as an untyped document. We give it
//! a tagged shape so that every walker, parser, and assembler in `irr-core`
//! can dispatch on `Value`'s variant instead of re-deriving YAML's type
//! rules at each call site.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A node in a chart's values tree.
///
/// Mirrors the shape of a parsed YAML/JSON document, but with integer and
/// float scalars kept distinct (YAML's `1` and `1.0` should not collapse
/// into the same variant) and map ordering preserved via [`IndexMap`], since
/// the walker's traversal order must be stable within a single run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Seq(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Renders the decimal form of a numeric scalar, the way a Helm
    /// `tag: 1.14` or `tag: 3` value is coerced for use as an image tag.
    ///
    /// Returns `None` for non-numeric values.
    pub fn as_coerced_tag(&self) -> Option<String> {
        match self {
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => {
                // Truncate trailing ".0" the way Helm's `strvals`/sprig
                // coercion does for whole-number floats, but otherwise
                // keep the decimal form (`3.14 -> "3"` per the parser's
                // documented tag-coercion rule, which only keeps the
                // integral part).
                Some((*f as i64).to_string())
            }
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn empty_map() -> Self {
        Value::Map(IndexMap::new())
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(v: serde_yaml::Value) -> Self {
        match v {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or_default())
                }
            }
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(seq) => {
                Value::Seq(seq.into_iter().map(Value::from).collect())
            }
            serde_yaml::Value::Mapping(map) => Value::Map(
                map.into_iter()
                    .filter_map(|(k, v)| {
                        k.as_str().map(|k| (k.to_string(), Value::from(v)))
                    })
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Value::from(tagged.value),
        }
    }
}

impl From<Value> for serde_yaml::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_yaml::Value::Null,
            Value::Bool(b) => serde_yaml::Value::Bool(b),
            Value::Int(i) => serde_yaml::Value::Number(i.into()),
            Value::Float(f) => serde_yaml::Value::Number(f.into()),
            Value::String(s) => serde_yaml::Value::String(s),
            Value::Seq(seq) => {
                serde_yaml::Value::Sequence(seq.into_iter().map(Into::into).collect())
            }
            Value::Map(map) => serde_yaml::Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (serde_yaml::Value::String(k), v.into()))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_serde_yaml() {
        let yaml = "a:\n  b: 1\n  c: [1, \"two\", 3.5]\n  d: null\n";
        let raw: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        let value: Value = raw.into();

        let a = value.as_map().unwrap().get("a").unwrap().as_map().unwrap();
        assert_eq!(a.get("b"), Some(&Value::Int(1)));
        assert_eq!(a.get("d"), Some(&Value::Null));

        let c = a.get("c").unwrap().as_seq().unwrap();
        assert_eq!(c[0], Value::Int(1));
        assert_eq!(c[1], Value::String("two".into()));
        assert_eq!(c[2], Value::Float(3.5));
    }

    #[test]
    fn coerces_numeric_tags_to_decimal_strings() {
        assert_eq!(Value::Float(3.14).as_coerced_tag(), Some("3".to_string()));
        assert_eq!(Value::Int(123).as_coerced_tag(), Some("123".to_string()));
    }
}
