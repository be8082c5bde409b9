#![allow(dead_code)]

use script_conditions::{
    Binding, Bindings, Compilable, CompiledScript, EngineFactory, EngineRegistry, EvalError,
    RawValue, ScriptEngine,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How long the stub takes to compile a source containing `SLOW`.
pub const SLOW_COMPILE: Duration = Duration::from_millis(800);

/// Shared counters observed by the stub engines.
#[derive(Default)]
pub struct Counters {
    pub created: AtomicUsize,
    pub globals: AtomicUsize,
    pub compiles: AtomicUsize,
    pub evals: AtomicUsize,
}

impl Counters {
    pub fn get(&self, c: &AtomicUsize) -> usize {
        c.load(Ordering::SeqCst)
    }
}

/// Engine that echoes the source text; `FAIL` in the source raises an error,
/// `BROKEN` fails to compile and `SLOW` compiles after [`SLOW_COMPILE`].
pub struct StubEngine {
    name: &'static str,
    compiling: bool,
    counters: Arc<Counters>,
}

fn echo(source: &str) -> Result<RawValue, EvalError> {
    if source.contains("FAIL") {
        return Err(EvalError::Runtime("stub failure".into()));
    }
    Ok(RawValue::Text(source.trim().to_string()))
}

impl ScriptEngine for StubEngine {
    fn name(&self) -> &str {
        self.name
    }

    fn put_global(&self, _name: &str, _binding: Binding) {
        self.counters.globals.fetch_add(1, Ordering::SeqCst);
    }

    fn eval(&self, source: &str, _bindings: &Bindings) -> Result<RawValue, EvalError> {
        self.counters.evals.fetch_add(1, Ordering::SeqCst);
        echo(source)
    }

    fn as_compilable(&self) -> Option<&dyn Compilable> {
        if self.compiling {
            Some(self)
        } else {
            None
        }
    }
}

impl Compilable for StubEngine {
    fn compile(&self, source: &str) -> Result<Arc<dyn CompiledScript>, EvalError> {
        self.counters.compiles.fetch_add(1, Ordering::SeqCst);
        if source.contains("SLOW") {
            thread::sleep(SLOW_COMPILE);
        }
        if source.contains("BROKEN") {
            return Err(EvalError::Parse("stub cannot compile".into()));
        }
        Ok(Arc::new(StubCompiled {
            source: source.to_string(),
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct StubCompiled {
    source: String,
    counters: Arc<Counters>,
}

impl CompiledScript for StubCompiled {
    fn eval(&self, _bindings: &Bindings) -> Result<RawValue, EvalError> {
        self.counters.evals.fetch_add(1, Ordering::SeqCst);
        echo(&self.source)
    }
}

pub struct StubFactory {
    pub names: &'static [&'static str],
    pub compiling: bool,
    pub counters: Arc<Counters>,
}

impl EngineFactory for StubFactory {
    fn names(&self) -> &[&'static str] {
        self.names
    }

    fn extensions(&self) -> &[&'static str] {
        &[]
    }

    fn mime_types(&self) -> &[&'static str] {
        &[]
    }

    fn create(&self) -> Arc<dyn ScriptEngine> {
        self.counters.created.fetch_add(1, Ordering::SeqCst);
        Arc::new(StubEngine {
            name: self.names[0],
            compiling: self.compiling,
            counters: Arc::clone(&self.counters),
        })
    }
}

/// Registry with a compiling `groovy` stub and an interpreting `shell` stub.
pub fn stub_registry() -> (EngineRegistry, Arc<Counters>, Arc<Counters>) {
    let compiling = Arc::new(Counters::default());
    let interpreting = Arc::new(Counters::default());
    let mut reg = EngineRegistry::new();
    reg.register(StubFactory {
        names: &["groovy"],
        compiling: true,
        counters: Arc::clone(&compiling),
    });
    reg.register(StubFactory {
        names: &["shell"],
        compiling: false,
        counters: Arc::clone(&interpreting),
    });
    (reg, compiling, interpreting)
}
