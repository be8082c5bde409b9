use crate::bindings::{
    Binding, Bindings, EnvironmentVariableAccessor, SystemPropertyAccessor, SYSTEM_ENVIRONMENT,
    SYSTEM_PROPERTY,
};
use crate::context::Context;
use crate::decision::{EvaluationDecision, RawValue};
use crate::engines::{CompiledScript, EngineRegistry, ScriptEngine};
use crate::errors::{EvalError, Result, ScriptError};
use crate::interpreter::decide;
use crate::script::Script;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, trace};

/// A cache entry filled at most once. An empty slot is a miss that is
/// being computed, or whose computation failed.
type Slot<T> = Arc<Mutex<Option<T>>>;

/// Owns the engine and compiled-script caches for one test run.
///
/// Both caches are filled lazily and only ever grow until [`close`] is
/// called. Each key has its own slot: the map lock is held only to find or
/// insert the slot, and the work runs under the slot's lock. Concurrent
/// misses on the same key wait for the first one and then share its result,
/// while hits and misses on other keys proceed.
///
/// [`close`]: ScriptExecutionManager::close
pub struct ScriptExecutionManager {
    registry: EngineRegistry,
    engines: RwLock<HashMap<String, Slot<Arc<dyn ScriptEngine>>>>,
    compiled: RwLock<HashMap<Script, Slot<Arc<dyn CompiledScript>>>>,
    system_properties: Arc<SystemPropertyAccessor>,
    environment: Arc<EnvironmentVariableAccessor>,
    force_script_evaluation: bool,
}

impl ScriptExecutionManager {
    pub fn new(registry: EngineRegistry, ctx: &Context) -> Self {
        Self {
            registry,
            engines: RwLock::new(HashMap::new()),
            compiled: RwLock::new(HashMap::new()),
            system_properties: Arc::new(SystemPropertyAccessor::new(
                ctx.property_overrides.clone(),
            )),
            environment: Arc::new(EnvironmentVariableAccessor),
            force_script_evaluation: ctx.force_script_evaluation,
        }
    }

    pub fn with_builtins(ctx: &Context) -> Self {
        Self::new(EngineRegistry::with_builtins(), ctx)
    }

    /// Evaluate `script` against `bindings` and decide run or skip.
    pub fn evaluate(&self, script: &Script, bindings: &Bindings) -> Result<EvaluationDecision> {
        let raw = self.evaluate_raw(script, bindings)?;
        let decision = decide(script, raw);
        trace!(enabled = decision.enabled, reason = %decision.reason, "script decision");
        Ok(decision)
    }

    /// Run `script` and return its raw result, compiling it on first use when
    /// the engine supports it. Failures are never cached.
    pub fn evaluate_raw(&self, script: &Script, bindings: &Bindings) -> Result<RawValue> {
        if let Some(compiled) = filled(&self.compiled, script) {
            trace!(engine = script.engine(), "compiled script cache hit");
            return compiled.eval(bindings).map_err(|e| evaluation_error(script, e));
        }
        let engine = self.engine(script.engine())?;
        let compilable = match engine.as_compilable() {
            Some(c) if !self.force_script_evaluation => c,
            _ => {
                debug!(engine = script.engine(), "evaluating script source directly");
                return engine
                    .eval(script.source(), bindings)
                    .map_err(|e| evaluation_error(script, e));
            }
        };
        let compiled = get_or_try_init(&self.compiled, script, || {
            let compiled = compilable
                .compile(script.source())
                .map_err(|e| evaluation_error(script, e))?;
            debug!(engine = script.engine(), "compiled script");
            Ok(compiled)
        })?;
        compiled.eval(bindings).map_err(|e| evaluation_error(script, e))
    }

    /// Engine for `name`, created and given its global bindings on first use.
    pub fn engine(&self, name: &str) -> Result<Arc<dyn ScriptEngine>> {
        get_or_try_init(&self.engines, &name.to_string(), || self.create_engine(name))
    }

    fn create_engine(&self, name: &str) -> Result<Arc<dyn ScriptEngine>> {
        let factory = self
            .registry
            .resolve(name)
            .ok_or_else(|| ScriptError::EngineNotFound(name.to_string()))?;
        let engine = factory.create();
        engine.put_global(
            SYSTEM_PROPERTY,
            Binding::Accessor(Arc::clone(&self.system_properties) as _),
        );
        engine.put_global(
            SYSTEM_ENVIRONMENT,
            Binding::Accessor(Arc::clone(&self.environment) as _),
        );
        debug!(requested = name, engine = engine.name(), "created script engine");
        Ok(engine)
    }

    pub fn compiled_count(&self) -> usize {
        filled_count(&self.compiled)
    }

    pub fn engine_count(&self) -> usize {
        filled_count(&self.engines)
    }

    /// Drop every cached engine and compiled script. Call once, when the run
    /// that owns this manager ends.
    pub fn close(&self) {
        let scripts = self.compiled_count();
        self.compiled.write().clear();
        let engines = self.engine_count();
        self.engines.write().clear();
        debug!(scripts, engines, "closed script execution manager");
    }
}

fn slot<K, T>(map: &RwLock<HashMap<K, Slot<T>>>, key: &K) -> Slot<T>
where
    K: Eq + Hash + Clone,
{
    let existing = map.read().get(key).cloned();
    match existing {
        Some(slot) => slot,
        None => Arc::clone(map.write().entry(key.clone()).or_default()),
    }
}

fn filled<K, T>(map: &RwLock<HashMap<K, Slot<T>>>, key: &K) -> Option<T>
where
    K: Eq + Hash,
    T: Clone,
{
    let slot = map.read().get(key).cloned()?;
    let value = slot.lock().clone();
    value
}

fn filled_count<K, T>(map: &RwLock<HashMap<K, Slot<T>>>) -> usize {
    let slots: Vec<_> = map.read().values().cloned().collect();
    slots.iter().filter(|slot| slot.lock().is_some()).count()
}

/// Value stored under `key`, computing it with `init` if the slot is empty.
/// Only callers of the same key wait on `init`. An error leaves the slot
/// empty so the next caller retries.
fn get_or_try_init<K, T, F>(map: &RwLock<HashMap<K, Slot<T>>>, key: &K, init: F) -> Result<T>
where
    K: Eq + Hash + Clone,
    T: Clone,
    F: FnOnce() -> Result<T>,
{
    let slot = slot(map, key);
    let mut value = slot.lock();
    if let Some(existing) = value.as_ref() {
        return Ok(existing.clone());
    }
    let created = init()?;
    *value = Some(created.clone());
    Ok(created)
}

fn evaluation_error(script: &Script, cause: EvalError) -> ScriptError {
    ScriptError::Evaluation {
        engine: script.engine().to_string(),
        script: script.source().to_string(),
        cause,
    }
}
