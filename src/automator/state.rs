//! Per-scenario run state shared between steps.
use crate::diagnostics::{log_screen_info, Diagnostics};
use serde_json::Value;
use std::collections::BTreeMap;

/// Step currently executing, for failure attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CurrentStep {
    pub(crate) number: usize,
    pub(crate) name: String,
}

/// Mutable state for one scenario execution.
///
/// Recreated at the start of every scenario and dropped when it ends.
#[derive(Debug, Default)]
pub struct RunState {
    pub(crate) current_step: Option<CurrentStep>,
    pub(crate) deferred_failures: Vec<String>,
    external: BTreeMap<String, Value>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deferred_failures(&self) -> &[String] {
        &self.deferred_failures
    }

    pub(crate) fn set_current_step(&mut self, number: usize, name: String) {
        self.current_step = Some(CurrentStep { number, name });
    }

    pub(crate) fn take_deferred_failures(&mut self) -> Vec<String> {
        std::mem::take(&mut self.deferred_failures)
    }

    fn defer(&mut self, message: &str) {
        let entry = match &self.current_step {
            Some(step) => format!("Step {} ({}): {message}", step.number, step.name),
            None => format!("<Undefined step>: {message}"),
        };
        self.deferred_failures.push(entry);
    }
}

/// Handle passed to action implementations.
///
/// Gives access to the scenario's key/value store and to the
/// deferred-failure channel.
pub struct StepContext<'a> {
    state: &'a mut RunState,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> StepContext<'a> {
    pub fn new(state: &'a mut RunState, diagnostics: &'a dyn Diagnostics) -> Self {
        Self { state, diagnostics }
    }

    pub fn set_state(&mut self, key: &str, value: impl Into<Value>) {
        self.state.external.insert(key.to_string(), value.into());
    }

    pub fn has_state(&self, key: &str) -> bool {
        self.state.external.contains_key(key)
    }

    /// Stored value for `key`, or `default` when nothing was stored.
    pub fn get_state(&self, key: &str, default: Value) -> Value {
        match self.state.external.get(key) {
            Some(value) => value.clone(),
            None => {
                tracing::debug!(key, "run state not found, returning default");
                default
            }
        }
    }

    /// Record a failure without stopping the scenario.
    ///
    /// The message is attributed to the step executing at call time.
    pub fn defer_failure(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::warn!("deferring a failure: {message}");
        log_screen_info(self.diagnostics);
        self.state.defer(message);
    }

    pub fn diagnostics(&self) -> &dyn Diagnostics {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NoDiagnostics;
    use serde_json::json;

    #[test]
    fn deferred_failures_are_attributed_to_current_step() {
        let mut state = RunState::new();
        let diagnostics = NoDiagnostics;
        {
            let mut ctx = StepContext::new(&mut state, &diagnostics);
            ctx.defer_failure("before any step");
        }
        state.set_current_step(2, "home.verifyLabel".to_string());
        {
            let mut ctx = StepContext::new(&mut state, &diagnostics);
            ctx.defer_failure("label mismatch");
        }
        assert_eq!(
            state.deferred_failures(),
            [
                "<Undefined step>: before any step".to_string(),
                "Step 2 (home.verifyLabel): label mismatch".to_string(),
            ]
        );
    }

    #[test]
    fn external_state_round_trips_and_defaults() {
        let mut state = RunState::new();
        let diagnostics = NoDiagnostics;
        let mut ctx = StepContext::new(&mut state, &diagnostics);
        assert!(!ctx.has_state("token"));
        assert_eq!(ctx.get_state("token", json!("none")), json!("none"));
        ctx.set_state("token", "abc");
        assert!(ctx.has_state("token"));
        assert_eq!(ctx.get_state("token", Value::Null), json!("abc"));
    }
}
