use crate::bindings::{Binding, Bindings};
use crate::decision::RawValue;
use crate::errors::EvalResult;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

pub mod expression;
pub mod literal;

/// A named, reusable evaluator. Implementations must tolerate concurrent
/// calls; the manager hands one instance to every thread that asks for it.
pub trait ScriptEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Install a value into the engine-wide scope, visible to every later
    /// evaluation. Call-level bindings shadow it.
    fn put_global(&self, name: &str, binding: Binding);

    fn eval(&self, source: &str, bindings: &Bindings) -> EvalResult<RawValue>;

    /// `Some` when the engine can pre-compile sources.
    fn as_compilable(&self) -> Option<&dyn Compilable> {
        None
    }
}

pub trait Compilable {
    fn compile(&self, source: &str) -> EvalResult<Arc<dyn CompiledScript>>;
}

/// Pre-parsed source, bound to the engine instance that produced it.
pub trait CompiledScript: Send + Sync {
    fn eval(&self, bindings: &Bindings) -> EvalResult<RawValue>;
}

/// Describes an engine and creates fresh instances of it.
pub trait EngineFactory: Send + Sync {
    fn names(&self) -> &[&'static str];
    fn extensions(&self) -> &[&'static str];
    fn mime_types(&self) -> &[&'static str];
    fn create(&self) -> Arc<dyn ScriptEngine>;
}

/// Engine-wide bindings shared by an engine and its compiled scripts.
#[derive(Default)]
pub struct GlobalScope {
    inner: RwLock<HashMap<String, Binding>>,
}

impl GlobalScope {
    pub fn put(&self, name: &str, binding: Binding) {
        self.inner.write().insert(name.to_string(), binding);
    }

    /// Look `name` up in `local` first, then in this scope.
    pub fn resolve(&self, local: &Bindings, name: &str) -> Option<Binding> {
        local
            .get(name)
            .cloned()
            .or_else(|| self.inner.read().get(name).cloned())
    }
}

/// Thread-safe table of engine factories.
#[derive(Clone, Default)]
pub struct EngineRegistry {
    factories: Arc<Vec<Arc<dyn EngineFactory>>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register(expression::ExpressionEngineFactory);
        reg.register(literal::LiteralEngineFactory);
        reg
    }

    /// Later registrations win ties within the same lookup stage.
    pub fn register<F: EngineFactory + 'static>(&mut self, f: F) {
        let factories = Arc::make_mut(&mut self.factories);
        factories.insert(0, Arc::new(f));
    }

    /// Find a factory by engine name, then by extension, then by mime type.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn EngineFactory>> {
        self.find(|f| f.names().iter().any(|n| *n == name))
            .or_else(|| self.find(|f| f.extensions().iter().any(|n| *n == name)))
            .or_else(|| self.find(|f| f.mime_types().iter().any(|n| *n == name)))
    }

    fn find(&self, pred: impl Fn(&dyn EngineFactory) -> bool) -> Option<Arc<dyn EngineFactory>> {
        self.factories.iter().find(|f| pred(f.as_ref())).cloned()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static [&'static str], &'static [&'static str], &'static [&'static str]);

    impl EngineFactory for Named {
        fn names(&self) -> &[&'static str] {
            self.0
        }
        fn extensions(&self) -> &[&'static str] {
            self.1
        }
        fn mime_types(&self) -> &[&'static str] {
            self.2
        }
        fn create(&self) -> Arc<dyn ScriptEngine> {
            Arc::new(literal::LiteralEngine::new(self.0[0]))
        }
    }

    fn engine_name(reg: &EngineRegistry, alias: &str) -> Option<String> {
        reg.resolve(alias).map(|f| f.create().name().to_string())
    }

    #[test]
    fn resolution_order() {
        let mut reg = EngineRegistry::new();
        reg.register(Named(&["alpha"], &["beta"], &["text/gamma"]));
        reg.register(Named(&["beta"], &["b"], &["text/beta"]));

        assert_eq!(engine_name(&reg, "alpha").as_deref(), Some("alpha"));
        // a name match beats an extension match registered earlier
        assert_eq!(engine_name(&reg, "beta").as_deref(), Some("beta"));
        assert_eq!(engine_name(&reg, "b").as_deref(), Some("beta"));
        assert_eq!(engine_name(&reg, "text/gamma").as_deref(), Some("alpha"));
        assert_eq!(engine_name(&reg, "gamma"), None);
    }

    #[test]
    fn builtins_resolve_by_alias() {
        let reg = EngineRegistry::with_builtins();
        assert_eq!(reg.len(), 2);
        assert_eq!(engine_name(&reg, "expr").as_deref(), Some("expression"));
        assert_eq!(
            engine_name(&reg, "application/x-expression").as_deref(),
            Some("expression")
        );
        assert_eq!(engine_name(&reg, "text/plain").as_deref(), Some("literal"));
        assert!(reg.resolve("no-such-engine").is_none());
    }

    #[test]
    fn local_bindings_shadow_globals() {
        use serde_json::json;
        let scope = GlobalScope::default();
        scope.put("a", json!(1).into());
        scope.put("b", json!(2).into());
        let mut local = Bindings::new();
        local.insert("a", json!(10));

        assert!(matches!(scope.resolve(&local, "a"), Some(Binding::Value(v)) if v == json!(10)));
        assert!(matches!(scope.resolve(&local, "b"), Some(Binding::Value(v)) if v == json!(2)));
        assert!(scope.resolve(&local, "c").is_none());
    }
}
