//! Core value and error types for the dispatch library
//!
//! This module defines the two value representations that meet at the analysis
//! boundary: [`NativeValue`], as produced by the host runtime, and [`AnalysisValue`],
//! the neutral form that is safe to hand to an analysis callback.

use crate::category::EventCategory;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for dispatch operations
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Static identifier of an instrumented occurrence (the Jalangi `iid`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub u32);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a heap value owned by the host runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Host-assigned identity, stable for the lifetime of the value
    pub id: u64,
    /// Class name, function name or symbol description (if known)
    #[serde(default)]
    pub label: Option<String>,
}

impl ObjectRef {
    pub fn new(id: u64) -> Self {
        Self { id, label: None }
    }

    pub fn labeled(id: u64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: Some(label.into()),
        }
    }
}

/// A value as the host runtime produces it
///
/// Several variants have no meaning outside the host (object references, ropes,
/// symbols) and must go through [`crate::marshal::convert_result`] before they
/// reach an analysis callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum NativeValue {
    Undefined,
    Null,
    Boolean(bool),
    /// Small integer representation used by the host for int-valued numbers
    Integer(i64),
    Number(f64),
    String(String),
    /// Lazily concatenated string, flattened on conversion
    Rope(Vec<String>),
    Symbol(ObjectRef),
    Object(ObjectRef),
    Function(ObjectRef),
    Array(ObjectRef),
    /// A value that was already exported to the analysis side
    Handle(ValueHandle),
}

impl Default for NativeValue {
    fn default() -> Self {
        NativeValue::Undefined
    }
}

impl From<bool> for NativeValue {
    fn from(v: bool) -> Self {
        NativeValue::Boolean(v)
    }
}

impl From<f64> for NativeValue {
    fn from(v: f64) -> Self {
        NativeValue::Number(v)
    }
}

impl From<i64> for NativeValue {
    fn from(v: i64) -> Self {
        NativeValue::Integer(v)
    }
}

impl From<&str> for NativeValue {
    fn from(v: &str) -> Self {
        NativeValue::String(v.to_string())
    }
}

/// Kind of a host value exported as an opaque handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Object,
    Function,
    Array,
    Symbol,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Object => write!(f, "object"),
            ValueKind::Function => write!(f, "function"),
            ValueKind::Array => write!(f, "array"),
            ValueKind::Symbol => write!(f, "symbol"),
        }
    }
}

/// Neutral descriptor standing in for a host-only value
///
/// Carries enough for the analysis side to print the value or branch on its kind,
/// never the value itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueHandle {
    pub kind: ValueKind,
    pub id: u64,
    #[serde(default)]
    pub label: Option<String>,
}

impl fmt::Display for ValueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "[{} {}#{}]", self.kind, label, self.id),
            None => write!(f, "[{} #{}]", self.kind, self.id),
        }
    }
}

/// A value in the representation analysis callbacks receive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnalysisValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    /// Argument vector; elements are converted one level only
    List(Vec<AnalysisValue>),
    Handle(ValueHandle),
}

impl fmt::Display for AnalysisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisValue::Undefined => write!(f, "undefined"),
            AnalysisValue::Null => write!(f, "null"),
            AnalysisValue::Boolean(v) => write!(f, "{}", v),
            AnalysisValue::Number(v) => write!(f, "{}", v),
            AnalysisValue::String(v) => write!(f, "{:?}", v),
            AnalysisValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            AnalysisValue::Handle(handle) => write!(f, "{}", handle),
        }
    }
}

impl AnalysisValue {
    /// Get the boolean payload, if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnalysisValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the numeric payload, if this is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AnalysisValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnalysisValue::String(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for AnalysisValue {
    fn from(v: bool) -> Self {
        AnalysisValue::Boolean(v)
    }
}

impl From<&str> for AnalysisValue {
    fn from(v: &str) -> Self {
        AnalysisValue::String(v.to_string())
    }
}

impl From<SourceId> for AnalysisValue {
    fn from(id: SourceId) -> Self {
        AnalysisValue::Number(f64::from(id.0))
    }
}

/// Neutral values embed back into the host representation unchanged
impl From<AnalysisValue> for NativeValue {
    fn from(value: AnalysisValue) -> Self {
        match value {
            AnalysisValue::Undefined => NativeValue::Undefined,
            AnalysisValue::Null => NativeValue::Null,
            AnalysisValue::Boolean(v) => NativeValue::Boolean(v),
            AnalysisValue::Number(v) => NativeValue::Number(v),
            AnalysisValue::String(v) => NativeValue::String(v),
            // Lists only exist as argument vectors; the host sees them as an array it never owned
            AnalysisValue::List(_) => NativeValue::Undefined,
            AnalysisValue::Handle(handle) => NativeValue::Handle(handle),
        }
    }
}

/// Errors raised on the analysis side of a callback invocation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CallbackError {
    #[error("analysis callback raised: {0}")]
    Raised(String),

    #[error("callback receiver is not a {expected} analysis module")]
    ReceiverMismatch { expected: &'static str },

    #[error("argument {index} cannot cross the analysis boundary: {reason}")]
    Argument { index: usize, reason: String },
}

/// Errors surfaced to the host runtime by factories and handlers
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("{category} callback `{callback}` failed at source {source_id}")]
    Callback {
        category: EventCategory,
        callback: String,
        source_id: SourceId,
        #[source]
        source: CallbackError,
    },

    #[error("call site {source_id} carries no {expected} metadata required by {category}")]
    MalformedSite {
        category: EventCategory,
        source_id: SourceId,
        expected: &'static str,
    },
}

impl DispatchError {
    /// The analysis-side error, if this failure came from a callback
    pub fn callback_error(&self) -> Option<&CallbackError> {
        match self {
            DispatchError::Callback { source, .. } => Some(source),
            DispatchError::MalformedSite { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_value_display() {
        assert_eq!(format!("{}", AnalysisValue::Number(42.0)), "42");
        assert_eq!(format!("{}", AnalysisValue::from("x")), "\"x\"");
        let handle = ValueHandle {
            kind: ValueKind::Function,
            id: 7,
            label: Some("main".to_string()),
        };
        assert_eq!(format!("{}", AnalysisValue::Handle(handle)), "[function main#7]");
        let list = AnalysisValue::List(vec![AnalysisValue::Null, AnalysisValue::Boolean(true)]);
        assert_eq!(format!("{}", list), "[null, true]");
    }

    #[test]
    fn test_source_id_is_a_number_on_the_analysis_side() {
        assert_eq!(AnalysisValue::from(SourceId(42)), AnalysisValue::Number(42.0));
    }

    #[test]
    fn test_native_value_json_shape() {
        let value: NativeValue =
            serde_json::from_str(r#"{"type":"object","value":{"id":3,"label":"Foo"}}"#).unwrap();
        assert_eq!(value, NativeValue::Object(ObjectRef::labeled(3, "Foo")));

        let undefined: NativeValue = serde_json::from_str(r#"{"type":"undefined"}"#).unwrap();
        assert_eq!(undefined, NativeValue::Undefined);
    }
}
