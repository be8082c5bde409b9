use crate::context::Context;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const SYSTEM_PROPERTY: &str = "systemProperty";
pub const SYSTEM_ENVIRONMENT: &str = "systemEnvironment";
pub const CONFIGURATION_PARAMETER: &str = "configurationParameter";
pub const TEST_DISPLAY_NAME: &str = "testDisplayName";
pub const TEST_UNIQUE_ID: &str = "testUniqueId";
pub const TEST_TAGS: &str = "testTags";

/// Read-only lookup handed to scripts. Values are resolved when `get` is
/// called, not when the accessor is created.
pub trait ScriptAccessor: Send + Sync {
    fn name(&self) -> &str;
    fn get(&self, key: &str) -> Option<String>;
}

/// Runtime facts of the current process, shadowed by explicit overrides.
#[derive(Clone, Default)]
pub struct SystemPropertyAccessor {
    overrides: Arc<HashMap<String, String>>,
}

impl SystemPropertyAccessor {
    pub fn new(overrides: HashMap<String, String>) -> Self {
        Self { overrides: Arc::new(overrides) }
    }

    fn live(key: &str) -> Option<String> {
        match key {
            "os.name" => Some(std::env::consts::OS.to_string()),
            "os.arch" => Some(std::env::consts::ARCH.to_string()),
            "os.family" => Some(std::env::consts::FAMILY.to_string()),
            "user.dir" => std::env::current_dir()
                .ok()
                .map(|p| p.to_string_lossy().into_owned()),
            "user.home" => std::env::var("HOME")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok(),
            "file.separator" => Some(std::path::MAIN_SEPARATOR.to_string()),
            "path.separator" => Some(if cfg!(windows) { ";" } else { ":" }.to_string()),
            "line.separator" => Some(if cfg!(windows) { "\r\n" } else { "\n" }.to_string()),
            _ => None,
        }
    }
}

impl ScriptAccessor for SystemPropertyAccessor {
    fn name(&self) -> &str {
        SYSTEM_PROPERTY
    }

    fn get(&self, key: &str) -> Option<String> {
        self.overrides
            .get(key)
            .cloned()
            .or_else(|| Self::live(key))
    }
}

#[derive(Clone, Copy, Default)]
pub struct EnvironmentVariableAccessor;

impl ScriptAccessor for EnvironmentVariableAccessor {
    fn name(&self) -> &str {
        SYSTEM_ENVIRONMENT
    }

    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Default)]
pub struct ConfigurationParameterAccessor {
    parameters: Arc<HashMap<String, String>>,
}

impl ConfigurationParameterAccessor {
    pub fn new(parameters: HashMap<String, String>) -> Self {
        Self { parameters: Arc::new(parameters) }
    }
}

impl ScriptAccessor for ConfigurationParameterAccessor {
    fn name(&self) -> &str {
        CONFIGURATION_PARAMETER
    }

    fn get(&self, key: &str) -> Option<String> {
        self.parameters.get(key).cloned()
    }
}

/// A named value visible to a script.
#[derive(Clone)]
pub enum Binding {
    Value(Value),
    Accessor(Arc<dyn ScriptAccessor>),
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Binding::Accessor(a) => f.debug_tuple("Accessor").field(&a.name()).finish(),
        }
    }
}

impl From<Value> for Binding {
    fn from(v: Value) -> Self {
        Binding::Value(v)
    }
}

impl<A: ScriptAccessor + 'static> From<Arc<A>> for Binding {
    fn from(a: Arc<A>) -> Self {
        Binding::Accessor(a)
    }
}

/// Key/value environment for one evaluation.
#[derive(Clone, Debug, Default)]
pub struct Bindings {
    inner: HashMap<String, Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings describing one test, plus the run's configuration parameters.
    pub fn for_test(test: &TestInfo, ctx: &Context) -> Self {
        let mut b = Self::new();
        b.insert(TEST_DISPLAY_NAME, Value::String(test.display_name.clone()));
        b.insert(TEST_UNIQUE_ID, Value::String(test.unique_id.clone()));
        b.insert(
            TEST_TAGS,
            Value::Array(test.tags.iter().cloned().map(Value::String).collect()),
        );
        b.insert(
            CONFIGURATION_PARAMETER,
            Arc::new(ConfigurationParameterAccessor::new(ctx.parameters.clone())),
        );
        b
    }

    pub fn insert(&mut self, name: impl Into<String>, binding: impl Into<Binding>) {
        self.inner.insert(name.into(), binding.into());
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.inner.get(name)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Test metadata the runner exposes to scripts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestInfo {
    pub display_name: String,
    pub unique_id: String,
    pub tags: Vec<String>,
}

impl TestInfo {
    pub fn new(display_name: impl Into<String>, unique_id: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            unique_id: unique_id.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}
