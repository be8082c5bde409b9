use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Final answer for one test: run it or skip it, with a displayable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationDecision {
    pub enabled: bool,
    pub reason: String,
}

impl EvaluationDecision {
    pub fn enabled(reason: impl Into<String>) -> Self {
        Self { enabled: true, reason: reason.into() }
    }

    pub fn disabled(reason: impl Into<String>) -> Self {
        Self { enabled: false, reason: reason.into() }
    }

    pub fn is_disabled(&self) -> bool {
        !self.enabled
    }
}

/// Raw result of running a script, tagged by the path that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// The script computed its own decision.
    Decision(EvaluationDecision),
    Boolean(bool),
    Text(String),
    /// Anything else (numbers, null, lists, ...).
    Other(Value),
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Boolean(b)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<EvaluationDecision> for RawValue {
    fn from(d: EvaluationDecision) -> Self {
        RawValue::Decision(d)
    }
}

impl From<Value> for RawValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Bool(b) => RawValue::Boolean(b),
            Value::String(s) => RawValue::Text(s),
            other => RawValue::Other(other),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Decision(d) => f.write_str(&d.reason),
            RawValue::Boolean(b) => write!(f, "{b}"),
            RawValue::Text(s) => f.write_str(s),
            RawValue::Other(v) => write!(f, "{v}"),
        }
    }
}
