//! Machine context: an opaque key/value record.
//!
//! The engine never interprets context values. The only mutation is a
//! shallow merge, where keys in the patch overwrite and all other keys are
//! preserved.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key/value record owned by a machine.
///
/// # Example
///
/// ```rust
/// use statehook::core::Context;
/// use serde_json::json;
///
/// let mut context = Context::from_value(json!({"applicants": 0, "open": true})).unwrap();
/// context.merge(json!({"applicants": 3}).as_object().cloned().unwrap());
///
/// assert_eq!(context.get("applicants"), Some(&json!(3)));
/// assert_eq!(context.get("open"), Some(&json!(true)));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    values: Map<String, Value>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a JSON value.
    ///
    /// `Null` yields an empty context. Any value other than an object or
    /// `Null` is handed back unchanged as the error.
    pub fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            Value::Null => Ok(Self::default()),
            other => Err(other),
        }
    }

    /// Shallow-merge `patch` into this context in place.
    pub fn merge(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            self.values.insert(key, value);
        }
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the underlying JSON map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Take the underlying JSON map.
    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }
}

impl From<Map<String, Value>> for Context {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

/// Short name of a JSON value's kind, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
