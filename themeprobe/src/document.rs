//! Theme document model
//!
//! The live configuration document is a tagged tree: objects are descended,
//! arrays are opaque, scalars are leaves. Paths are slash-delimited pointers
//! (`/colors/primary`) with JSON Pointer escaping (`~0` for `~`, `~1` for `/`);
//! a leading slash is optional.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Leaf value of the theme document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Number(Number),
    String(String),
}

/// Type tag of a scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Number,
    Boolean,
}

impl ScalarValue {
    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::Bool(_) => ScalarKind::Boolean,
            ScalarValue::Number(_) => ScalarKind::Number,
            ScalarValue::String(_) => ScalarKind::String,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        ScalarValue::String(value.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Number(value.into())
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::String(value.to_string())
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Number(n) => write!(f, "{}", n),
            ScalarValue::String(s) => f.write_str(s),
        }
    }
}

/// Node of the theme document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ThemeNode {
    /// Keyed children in document order
    Object(Vec<(String, ThemeNode)>),
    /// Never descended into; kept verbatim
    Array(Vec<Value>),
    Scalar(ScalarValue),
    Null,
}

impl From<Value> for ThemeNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ThemeNode::Null,
            Value::Bool(b) => ThemeNode::Scalar(ScalarValue::Bool(b)),
            Value::Number(n) => ThemeNode::Scalar(ScalarValue::Number(n)),
            Value::String(s) => ThemeNode::Scalar(ScalarValue::String(s)),
            Value::Array(items) => ThemeNode::Array(items),
            Value::Object(map) => ThemeNode::Object(
                map.into_iter()
                    .map(|(key, child)| (key, ThemeNode::from(child)))
                    .collect(),
            ),
        }
    }
}

impl From<ThemeNode> for Value {
    fn from(node: ThemeNode) -> Self {
        match node {
            ThemeNode::Null => Value::Null,
            ThemeNode::Scalar(ScalarValue::Bool(b)) => Value::Bool(b),
            ThemeNode::Scalar(ScalarValue::Number(n)) => Value::Number(n),
            ThemeNode::Scalar(ScalarValue::String(s)) => Value::String(s),
            ThemeNode::Array(items) => Value::Array(items),
            ThemeNode::Object(children) => {
                let mut map = Map::new();
                for (key, child) in children {
                    map.insert(key, Value::from(child));
                }
                Value::Object(map)
            }
        }
    }
}

/// Escape one object key for use as a path segment
pub fn escape_segment(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// Split a path into its unescaped segments
///
/// `""` and `"/"` address the root. Empty segments after the leading slash
/// are kept, so `/a//color` addresses the `""` key under `a`.
pub fn path_segments(path: &str) -> impl Iterator<Item = String> + '_ {
    let rest = path.strip_prefix('/').unwrap_or(path);
    let segments = if rest.is_empty() { None } else { Some(rest.split('/')) };
    segments
        .into_iter()
        .flatten()
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
}

impl ThemeNode {
    /// Node addressed by `path`, if present
    pub fn get(&self, path: &str) -> Option<&ThemeNode> {
        let mut node = self;
        for segment in path_segments(path) {
            node = match node {
                ThemeNode::Object(children) => children
                    .iter()
                    .find(|(key, _)| *key == segment)
                    .map(|(_, child)| child)?,
                _ => return None,
            };
        }
        Some(node)
    }

    /// Scalar addressed by `path`; `None` if absent or not a scalar
    pub fn scalar_at(&self, path: &str) -> Option<&ScalarValue> {
        match self.get(path)? {
            ThemeNode::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Replace the scalar at `path`, returning the previous value
    ///
    /// The slot must already exist and hold a scalar or null; objects and arrays
    /// are never overwritten.
    pub fn set_scalar(&mut self, path: &str, value: ScalarValue) -> Result<Option<ScalarValue>> {
        let invalid = |reason: &str| Error::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        let mut node = self;
        for segment in path_segments(path) {
            node = match node {
                ThemeNode::Object(children) => children
                    .iter_mut()
                    .find(|(key, _)| *key == segment)
                    .map(|(_, child)| child)
                    .ok_or_else(|| invalid("no such key"))?,
                _ => return Err(invalid("traverses a non-object node")),
            };
        }

        if matches!(node, ThemeNode::Null) {
            *node = ThemeNode::Scalar(value);
            return Ok(None);
        }

        match node {
            ThemeNode::Scalar(previous) => Ok(Some(std::mem::replace(previous, value))),
            _ => Err(invalid("addresses an object or array")),
        }
    }

    pub fn to_json(&self) -> Value {
        Value::from(self.clone())
    }
}
