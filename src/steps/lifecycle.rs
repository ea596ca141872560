use crate::domain::{ExecutionMode, ModeSource};
use std::collections::HashMap;

/// Context passed to a step command
#[derive(Debug, Clone)]
pub struct StepContext {
    /// Step name as given on the command line, e.g. "unit-tests"
    pub name: String,
    /// Resolved execution mode
    pub mode: ExecutionMode,
    /// Where the mode came from
    pub source: ModeSource,
}

impl StepContext {
    /// Environment for the step command
    ///
    /// Maps context fields to CI_STEP_* environment variables
    pub fn to_env_vars(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("CI_STEP_NAME".to_string(), self.name.clone());
        env.insert("CI_STEP_MODE".to_string(), self.mode.to_string());
        env
    }

    /// Human name used in stub output: "unit-tests" -> "Unit Tests"
    pub fn display_name(&self) -> String {
        self.name
            .split(['-', '_', ' '])
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
