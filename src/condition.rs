use crate::bindings::{Bindings, TestInfo};
use crate::context::Context;
use crate::decision::EvaluationDecision;
use crate::errors::Result;
use crate::manager::ScriptExecutionManager;
use crate::script::{ConditionKind, Script, DEFAULT_REASON};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_ENGINE: &str = "expression";

pub const NO_SCRIPT_PRESENT: &str = "Neither @EnabledIf nor @DisabledIf is present";

/// Source of a declaration: one expression or several lines joined by `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptSource {
    Single(String),
    Lines(Vec<String>),
}

impl ScriptSource {
    pub fn joined(&self) -> String {
        match self {
            ScriptSource::Single(s) => s.clone(),
            ScriptSource::Lines(lines) => lines.iter().join("\n"),
        }
    }
}

/// A script condition as read from a test element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptDeclaration {
    /// `enable`/`disable`, or the `@EnabledIf`/`@DisabledIf` spelling.
    pub kind: String,
    pub source: ScriptSource,
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default = "default_reason")]
    pub reason: String,
}

fn default_engine() -> String {
    DEFAULT_ENGINE.to_string()
}

fn default_reason() -> String {
    DEFAULT_REASON.to_string()
}

impl ScriptDeclaration {
    pub fn new(kind: ConditionKind, source: impl Into<String>) -> Self {
        let kind = match kind {
            ConditionKind::Enable => "enable",
            ConditionKind::Disable => "disable",
        };
        Self {
            kind: kind.to_string(),
            source: ScriptSource::Single(source.into()),
            engine: default_engine(),
            reason: default_reason(),
        }
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn to_script(&self) -> Result<Script> {
        let kind: ConditionKind = self.kind.parse()?;
        Script::new(kind, self.engine.clone(), self.source.joined(), self.reason.clone())
    }
}

/// Evaluates the script declarations of one test element.
pub struct ScriptCondition {
    manager: Arc<ScriptExecutionManager>,
    ctx: Context,
}

impl ScriptCondition {
    pub fn new(manager: Arc<ScriptExecutionManager>, ctx: Context) -> Self {
        Self { manager, ctx }
    }

    /// Evaluate declarations in order. The first one that disables the test
    /// decides; otherwise the last enabled decision is returned. No
    /// declarations means enabled.
    pub fn evaluate(
        &self,
        declarations: &[ScriptDeclaration],
        test: &TestInfo,
    ) -> Result<EvaluationDecision> {
        let bindings = Bindings::for_test(test, &self.ctx);
        let mut last = EvaluationDecision::enabled(NO_SCRIPT_PRESENT);
        for declaration in declarations {
            let script = declaration.to_script()?;
            let decision = self.manager.evaluate(&script, &bindings)?;
            if decision.is_disabled() {
                return Ok(decision);
            }
            last = decision;
        }
        Ok(last)
    }
}
