//! Lifecycle hooks invoked around a run.
//!
//! Every hook is optional. Only `prepare` and `pre_scenario` failures change
//! what the runner does next; the others are logged and listed in the report.
use crate::config::EntryPoint;
use crate::error::StepFailure;
use serde::Serialize;

pub type HookResult = Result<(), StepFailure>;

/// Timing handed to the pass/fail hooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioTiming {
    pub scenario_name: String,
    pub started_at_epoch_ms: u128,
    pub duration_ms: u128,
}

/// Timing handed to the `complete` hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunTiming {
    pub scenario_count: usize,
    pub started_at_epoch_ms: u128,
    pub duration_ms: u128,
}

#[derive(Default)]
pub struct Callbacks {
    on_init: Option<Box<dyn FnMut(EntryPoint) -> HookResult>>,
    prepare: Option<Box<dyn FnMut() -> HookResult>>,
    pre_scenario: Option<Box<dyn FnMut(&str) -> HookResult>>,
    on_scenario_pass: Option<Box<dyn FnMut(&ScenarioTiming) -> HookResult>>,
    on_scenario_fail: Option<Box<dyn FnMut(&ScenarioTiming) -> HookResult>>,
    complete: Option<Box<dyn FnMut(&RunTiming) -> HookResult>>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once with the selected entry point, after definitions load.
    pub fn set_on_init(&mut self, hook: impl FnMut(EntryPoint) -> HookResult + 'static) {
        self.on_init = Some(Box::new(hook));
    }

    /// Called once before the first scenario; failure aborts the run.
    pub fn set_prepare(&mut self, hook: impl FnMut() -> HookResult + 'static) {
        self.prepare = Some(Box::new(hook));
    }

    /// Called before each scenario with its title; failure is a setup failure.
    pub fn set_pre_scenario(&mut self, hook: impl FnMut(&str) -> HookResult + 'static) {
        self.pre_scenario = Some(Box::new(hook));
    }

    pub fn set_on_scenario_pass(
        &mut self,
        hook: impl FnMut(&ScenarioTiming) -> HookResult + 'static,
    ) {
        self.on_scenario_pass = Some(Box::new(hook));
    }

    pub fn set_on_scenario_fail(
        &mut self,
        hook: impl FnMut(&ScenarioTiming) -> HookResult + 'static,
    ) {
        self.on_scenario_fail = Some(Box::new(hook));
    }

    pub fn set_complete(&mut self, hook: impl FnMut(&RunTiming) -> HookResult + 'static) {
        self.complete = Some(Box::new(hook));
    }

    pub(crate) fn on_init(&mut self, entry_point: EntryPoint) -> HookResult {
        match self.on_init.as_mut() {
            Some(hook) => hook(entry_point),
            None => Ok(()),
        }
    }

    pub(crate) fn prepare(&mut self) -> HookResult {
        match self.prepare.as_mut() {
            Some(hook) => hook(),
            None => Ok(()),
        }
    }

    pub(crate) fn pre_scenario(&mut self, title: &str) -> HookResult {
        match self.pre_scenario.as_mut() {
            Some(hook) => hook(title),
            None => Ok(()),
        }
    }

    pub(crate) fn on_scenario_pass(&mut self, timing: &ScenarioTiming) -> HookResult {
        match self.on_scenario_pass.as_mut() {
            Some(hook) => hook(timing),
            None => Ok(()),
        }
    }

    pub(crate) fn on_scenario_fail(&mut self, timing: &ScenarioTiming) -> HookResult {
        match self.on_scenario_fail.as_mut() {
            Some(hook) => hook(timing),
            None => Ok(()),
        }
    }

    pub(crate) fn complete(&mut self, timing: &RunTiming) -> HookResult {
        match self.complete.as_mut() {
            Some(hook) => hook(timing),
            None => Ok(()),
        }
    }
}
