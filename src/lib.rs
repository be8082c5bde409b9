pub mod bindings;
pub mod condition;
pub mod context;
pub mod decision;
pub mod engines;
pub mod errors;
pub mod interpreter;
pub mod manager;
pub mod os;
pub mod script;
mod comparison;
mod expression;
mod parser;

pub use bindings::{Binding, Bindings, ScriptAccessor, TestInfo};
pub use condition::{ScriptCondition, ScriptDeclaration, ScriptSource};
pub use context::Context;
pub use decision::{EvaluationDecision, RawValue};
pub use engines::{Compilable, CompiledScript, EngineFactory, EngineRegistry, ScriptEngine};
pub use errors::{EvalError, Result, ScriptError};
pub use interpreter::decide;
pub use manager::ScriptExecutionManager;
pub use os::{evaluate_os, Os, OsDeclaration};
pub use script::{ConditionKind, Script};

/// Convenience: evaluate one expression as an enable condition with the
/// built-in engines and no test metadata.
pub fn eval(source: &str) -> Result<EvaluationDecision> {
    let ctx = Context::default();
    let manager = ScriptExecutionManager::with_builtins(&ctx);
    let script =
        Script::with_default_reason(ConditionKind::Enable, condition::DEFAULT_ENGINE, source)?;
    manager.evaluate(&script, &Bindings::for_test(&TestInfo::default(), &ctx))
}
