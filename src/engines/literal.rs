use super::{EngineFactory, GlobalScope, ScriptEngine};
use crate::bindings::{Binding, Bindings};
use crate::decision::RawValue;
use crate::errors::{EvalError, EvalResult};
use serde_json::Value;
use std::sync::Arc;

/// Engine whose result is the trimmed source text, after `${name}` and
/// `${accessor:key}` placeholders are replaced from the bindings. It has
/// nothing to compile, so every call goes through [`ScriptEngine::eval`].
pub struct LiteralEngine {
    name: String,
    globals: GlobalScope,
}

impl LiteralEngine {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), globals: GlobalScope::default() }
    }
}

impl ScriptEngine for LiteralEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn put_global(&self, name: &str, binding: Binding) {
        self.globals.put(name, binding);
    }

    fn eval(&self, source: &str, bindings: &Bindings) -> EvalResult<RawValue> {
        let mut out = String::new();
        let mut rest = source.trim();
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or_else(|| EvalError::Parse("unterminated placeholder".into()))?;
            out.push_str(&self.placeholder(&after[..end], bindings)?);
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(RawValue::Text(out))
    }
}

impl LiteralEngine {
    fn placeholder(&self, placeholder: &str, bindings: &Bindings) -> EvalResult<String> {
        let (name, key) = match placeholder.split_once(':') {
            Some((name, key)) => (name.trim(), Some(key.trim())),
            None => (placeholder.trim(), None),
        };
        let binding = self
            .globals
            .resolve(bindings, name)
            .ok_or_else(|| EvalError::Runtime(format!("unknown binding '{name}'")))?;
        match (binding, key) {
            (Binding::Accessor(acc), Some(key)) => Ok(acc.get(key).unwrap_or_default()),
            (Binding::Value(Value::String(s)), None) => Ok(s),
            (Binding::Value(v), None) => Ok(v.to_string()),
            (Binding::Accessor(_), None) => Err(EvalError::Runtime(format!(
                "accessor '{name}' needs a key, e.g. ${{{name}:KEY}}"
            ))),
            (Binding::Value(_), Some(_)) => Err(EvalError::Runtime(format!(
                "binding '{name}' is not an accessor"
            ))),
        }
    }
}

pub struct LiteralEngineFactory;

impl EngineFactory for LiteralEngineFactory {
    fn names(&self) -> &[&'static str] {
        &["literal"]
    }

    fn extensions(&self) -> &[&'static str] {
        &["txt"]
    }

    fn mime_types(&self) -> &[&'static str] {
        &["text/plain"]
    }

    fn create(&self) -> Arc<dyn ScriptEngine> {
        Arc::new(LiteralEngine::new("literal"))
    }
}
