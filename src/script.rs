use crate::errors::{Result, ScriptError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_REASON: &str = "Script `{source}` evaluated to: {result}";

pub const ANNOTATION_PLACEHOLDER: &str = "{annotation}";
pub const SOURCE_PLACEHOLDER: &str = "{source}";
pub const RESULT_PLACEHOLDER: &str = "{result}";

/// Whether a truthy result runs the test or skips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Enable,
    Disable,
}

impl ConditionKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ConditionKind::Enable => "@EnabledIf",
            ConditionKind::Disable => "@DisabledIf",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ConditionKind {
    type Err = ScriptError;

    /// Accepts `enable`/`disable` and the declaration spellings
    /// `EnabledIf`/`DisabledIf`, with or without a leading `@`.
    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().trim_start_matches('@').to_ascii_lowercase();
        match name.as_str() {
            "enable" | "enabled" | "enabledif" | "enabled_if" | "enabled-if" => {
                Ok(ConditionKind::Enable)
            }
            "disable" | "disabled" | "disabledif" | "disabled_if" | "disabled-if" => {
                Ok(ConditionKind::Disable)
            }
            _ => Err(ScriptError::UnsupportedConditionKind(s.to_string())),
        }
    }
}

/// Immutable identity of a declared script. Equality and hashing cover all
/// four fields, so the compiled cache never merges two declarations that
/// would render different reasons.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Script {
    engine: String,
    source: String,
    kind: ConditionKind,
    reason: String,
}

impl Script {
    pub fn new(
        kind: ConditionKind,
        engine: impl Into<String>,
        source: impl Into<String>,
        reason: impl Into<String>,
    ) -> Result<Self> {
        let engine = engine.into();
        let source = source.into();
        if engine.trim().is_empty() {
            return Err(ScriptError::InvalidDeclaration("engine must not be blank".into()));
        }
        if source.trim().is_empty() {
            return Err(ScriptError::InvalidDeclaration("source must not be blank".into()));
        }
        Ok(Self {
            engine,
            source,
            kind,
            reason: reason.into(),
        })
    }

    /// Script with the default reason template.
    pub fn with_default_reason(
        kind: ConditionKind,
        engine: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Self> {
        Self::new(kind, engine, source, DEFAULT_REASON)
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> ConditionKind {
        self.kind
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Render the reason template for a stringified result.
    pub fn to_reason_string(&self, result: &str) -> String {
        self.reason
            .replace(ANNOTATION_PLACEHOLDER, self.kind.display_name())
            .replace(SOURCE_PLACEHOLDER, &self.source)
            .replace(RESULT_PLACEHOLDER, result)
    }
}
