use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Open metadata mapping, one level deep, scalar values only.
pub type Metadata = BTreeMap<String, MetadataValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl MetadataValue {
    /// Converts a JSON value coming back from a remote store; non-scalars are dropped.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float)),
            serde_json::Value::String(s) => Some(Self::Text(s)),
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<usize> for MetadataValue {
    #[allow(clippy::cast_precision_loss)] // only past i64::MAX
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or(Self::Float(value as f64), Self::Integer)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Converts scalar metadata into a JSON object for remote stores.
pub fn to_json_object(metadata: &Metadata) -> serde_json::Map<String, serde_json::Value> {
    metadata
        .iter()
        .map(|(k, v)| {
            let value = match v {
                MetadataValue::Bool(b) => serde_json::Value::Bool(*b),
                MetadataValue::Integer(i) => serde_json::Value::from(*i),
                MetadataValue::Float(x) => serde_json::Value::from(*x),
                MetadataValue::Text(s) => serde_json::Value::String(s.clone()),
            };
            (k.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_untagged_deserialization() {
        let metadata: Metadata =
            serde_json::from_str(r#"{"a": true, "b": 3, "c": 0.5, "d": "x"}"#).unwrap();
        assert_eq!(metadata["a"], MetadataValue::Bool(true));
        assert_eq!(metadata["b"], MetadataValue::Integer(3));
        assert_eq!(metadata["c"], MetadataValue::Float(0.5));
        assert_eq!(metadata["d"], MetadataValue::Text("x".to_string()));
    }

    #[test]
    fn test_from_json_drops_nested_values() {
        assert_eq!(MetadataValue::from_json(serde_json::json!([1, 2])), None);
        assert_eq!(MetadataValue::from_json(serde_json::json!({"k": 1})), None);
        assert_eq!(MetadataValue::from_json(serde_json::Value::Null), None);
        assert_eq!(
            MetadataValue::from_json(serde_json::json!(2.0)),
            Some(MetadataValue::Float(2.0))
        );
    }
}
