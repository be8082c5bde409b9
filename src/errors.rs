use thiserror::Error;

/// Errors raised inside an engine while compiling or running an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Errors surfaced to the test runner. None of these is a "skip"; each one
/// fails initialization of the test being evaluated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    /// No engine matched the name, extension or mime type.
    #[error("script engine not found: {0}")]
    EngineNotFound(String),

    #[error("invalid condition declaration: {0}")]
    InvalidDeclaration(String),

    #[error("script `{script}` failed in engine '{engine}': {cause}")]
    Evaluation {
        engine: String,
        script: String,
        #[source]
        cause: EvalError,
    },

    #[error("unsupported condition kind: {0}")]
    UnsupportedConditionKind(String),
}

impl ScriptError {
    /// True for the configuration class of failures (unresolvable engine or
    /// malformed declaration).
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, ScriptError::EngineNotFound(_) | ScriptError::InvalidDeclaration(_))
    }
}

pub type EvalResult<T> = std::result::Result<T, EvalError>;

pub type Result<T> = std::result::Result<T, ScriptError>;
