use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::SectionError;

/// A single configuration value. Sections only ever store scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Convert an arbitrary JSON value, rejecting anything that is not a scalar.
    pub fn from_json(field: &str, value: Value) -> Result<Self, SectionError> {
        match value {
            Value::Bool(b) => Ok(Self::Bool(b)),
            Value::String(s) => Ok(Self::Text(s)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Float(f))
                } else {
                    Err(SectionError::malformed(field, "number out of range"))
                }
            }
            Value::Null => Err(SectionError::malformed(field, "null is not a valid value")),
            Value::Array(_) => Err(SectionError::malformed(field, "arrays are not supported")),
            Value::Object(_) => Err(SectionError::malformed(field, "objects are not supported")),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// Convert a JSON object into a `ConfigMap`, failing on the first non-scalar value.
pub fn config_from_json(map: serde_json::Map<String, Value>) -> Result<ConfigMap, SectionError> {
    map.into_iter()
        .map(|(key, value)| {
            let converted = ConfigValue::from_json(&key, value)?;
            Ok((key, converted))
        })
        .collect()
}

/// Shallow merge: keys in `edits` replace or extend `base`, other keys survive.
pub fn merge_config(base: &mut ConfigMap, edits: ConfigMap) {
    for (key, value) in edits {
        base.insert(key, value);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionInstance {
    pub id: String,
    pub name: String,
    pub component: String,
    pub enabled: bool,
    pub config: ConfigMap,
    pub order: i64,
    pub author_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a section. Only `component` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub config: ConfigMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
}

impl NewSection {
    pub fn of(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            ..Self::default()
        }
    }
}

/// Partial update. `config` is merged into the stored config, never replacing it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl SectionPatch {
    pub fn without_enabled(&self) -> Self {
        Self {
            enabled: None,
            ..self.clone()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.component.is_none()
            && self.enabled.is_none()
            && self.config.is_none()
            && self.order.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub id: String,
    pub order: i64,
}
