use std::collections::HashMap;

/// Parameter key that turns pre-compilation off for every engine.
pub const FORCE_EVALUATION_KEY: &str = "scripts.force-evaluation";

/// Run-scoped evaluation context and options.
#[derive(Clone, Debug, Default)]
pub struct Context {
    /// Evaluate source directly even when an engine could compile it.
    pub force_script_evaluation: bool,
    /// Configuration parameters of the run, visible to scripts through the
    /// `configurationParameter` accessor.
    pub parameters: HashMap<String, String>,
    /// Values that take precedence over the live system properties.
    pub property_overrides: HashMap<String, String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from raw configuration parameters. The force flag is
    /// read from [`FORCE_EVALUATION_KEY`]; anything but `true` leaves it off.
    pub fn from_parameters(parameters: HashMap<String, String>) -> Self {
        let force_script_evaluation = parameters
            .get(FORCE_EVALUATION_KEY)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self {
            force_script_evaluation,
            parameters,
            property_overrides: HashMap::new(),
        }
    }

    pub fn with_force_script_evaluation(mut self, force: bool) -> Self {
        self.force_script_evaluation = force;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.property_overrides.insert(key.into(), value.into());
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_flag_read_from_parameters() {
        let mut params = HashMap::new();
        params.insert(FORCE_EVALUATION_KEY.to_string(), " TRUE ".to_string());
        assert!(Context::from_parameters(params).force_script_evaluation);

        let mut params = HashMap::new();
        params.insert(FORCE_EVALUATION_KEY.to_string(), "yes".to_string());
        assert!(!Context::from_parameters(params).force_script_evaluation);
        assert!(!Context::from_parameters(HashMap::new()).force_script_evaluation);
    }
}
