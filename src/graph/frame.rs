//! Frames: the structural identity of a call-graph node.
//!
//! A frame says *what* a node represents (function name, region type, ...)
//! independent of *where* it sits in the graph. Two nodes with equal frames
//! are candidates for merging during union and normalization.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single frame attribute value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameValue {
    Int(i64),
    Float(FrameFloat),
    Str(String),
}

/// Float attribute compared by bit pattern, so frames stay hashable
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameFloat(pub f64);

impl PartialEq for FrameFloat {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FrameFloat {}

impl Hash for FrameFloat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for FrameFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrameFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for FrameValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameValue::Int(v) => write!(f, "{}", v),
            FrameValue::Float(v) => write!(f, "{}", v.0),
            FrameValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for FrameValue {
    fn from(value: &str) -> Self {
        FrameValue::Str(value.to_string())
    }
}

impl From<String> for FrameValue {
    fn from(value: String) -> Self {
        FrameValue::Str(value)
    }
}

impl From<i64> for FrameValue {
    fn from(value: i64) -> Self {
        FrameValue::Int(value)
    }
}

impl From<f64> for FrameValue {
    fn from(value: f64) -> Self {
        FrameValue::Float(FrameFloat(value))
    }
}

/// Immutable attribute map identifying a node
///
/// Equality, ordering and hashing are structural over all attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frame {
    attrs: BTreeMap<String, FrameValue>,
}

impl Frame {
    /// Build a frame from any set of attributes
    pub fn new<K, V, I>(attrs: I) -> Self
    where
        K: Into<String>,
        V: Into<FrameValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            attrs: attrs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Frame with a single `name` attribute
    pub fn named(name: impl Into<String>) -> Self {
        Self::new([("name", FrameValue::Str(name.into()))])
    }

    /// Frame with `name` and `type` attributes (used for group-by super-nodes)
    pub fn with_type(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new([
            ("name", FrameValue::Str(name.into())),
            ("type", FrameValue::Str(kind.into())),
        ])
    }

    pub fn get(&self, attr: &str) -> Option<&FrameValue> {
        self.attrs.get(attr)
    }

    /// The `name` attribute rendered as text, if present
    pub fn name(&self) -> Option<String> {
        self.attrs.get("name").map(|v| v.to_string())
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &FrameValue)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.attrs.get("name") {
            if self.attrs.len() == 1 {
                return write!(f, "{}", name);
            }
        }
        let parts: Vec<String> = self
            .attrs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_frame_equality_is_structural() {
        let a = Frame::new([("name", "solve"), ("type", "function")]);
        let b = Frame::new([("type", "function"), ("name", "solve")]);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_frame_attributes_keep_their_json_type() {
        let frame: Frame =
            serde_json::from_str(r#"{"name": "solve", "line": 42, "weight": 0.5}"#).unwrap();
        assert_eq!(frame.get("line"), Some(&FrameValue::Int(42)));
        assert_eq!(frame.get("weight"), Some(&FrameValue::from(0.5f64)));

        let same = Frame::new([
            ("name", FrameValue::from("solve")),
            ("line", FrameValue::from(42i64)),
            ("weight", FrameValue::from(0.5f64)),
        ]);
        assert_eq!(frame, same);
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            serde_json::json!({"line": 42, "name": "solve", "weight": 0.5})
        );
    }

    #[test]
    fn test_frame_inequality_on_extra_attribute() {
        let a = Frame::named("solve");
        let b = Frame::with_type("solve", "function");
        assert_ne!(a, b);
    }

    #[test]
    fn test_frame_display() {
        assert_eq!(Frame::named("main").to_string(), "main");
        assert_eq!(
            Frame::with_type("mpi", "module").to_string(),
            "{name=mpi, type=module}"
        );
    }

    #[test]
    fn test_frame_int_attribute() {
        let f = Frame::new([("line", FrameValue::Int(42))]);
        assert_eq!(f.get("line"), Some(&FrameValue::Int(42)));
        assert!(f.name().is_none());
    }
}
