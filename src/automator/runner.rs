//! Scenario execution.
//!
//! Each scenario moves through `Init -> StepLoop -> {Passed, Failed,
//! SetupFailed}`. A thrown step failure aborts only its own scenario; the run
//! always continues with the next one.
use super::callbacks::{Callbacks, HookResult, RunTiming, ScenarioTiming};
use super::report::{RunReport, ScenarioOutcome, ScenarioStatus};
use super::scenario::{Scenario, Step};
use super::shuffle::shuffle;
use super::state::{RunState, StepContext};
use crate::appmap::{Action, AppMap, Params};
use crate::diagnostics::{capture_failure_screen, log_screen_info, Diagnostics};
use crate::error::{FailureKind, StepFailure};
use crate::util::{now_epoch_ms, write_json};
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Instant;

/// Options for one pass over a scenario list.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Shuffle the list once, before anything runs.
    pub random_seed: Option<i64>,
    /// Where to record the execution order before the first scenario starts.
    pub intended_list_path: Option<PathBuf>,
}

/// `intended_test_list.json`, consumed by supervisors that restart runs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntendedTestList<'a> {
    pub scenario_names: Vec<&'a str>,
}

impl<'a> IntendedTestList<'a> {
    pub fn new(scenarios: &[&'a Scenario]) -> Self {
        Self {
            scenario_names: scenarios.iter().map(|scenario| scenario.title()).collect(),
        }
    }
}

struct Evaluation {
    status: ScenarioStatus,
    message: Option<String>,
    failed_step: Option<usize>,
    steps_run: usize,
}

impl Evaluation {
    fn passed(steps_run: usize) -> Self {
        Self {
            status: ScenarioStatus::Passed,
            message: None,
            failed_step: None,
            steps_run,
        }
    }
}

pub struct ScenarioRunner<'a> {
    appmap: &'a AppMap,
    device: String,
    diagnostics: &'a dyn Diagnostics,
    callbacks: &'a mut Callbacks,
    previous_title: Option<String>,
    callback_failures: Vec<String>,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(
        appmap: &'a AppMap,
        device: &str,
        diagnostics: &'a dyn Diagnostics,
        callbacks: &'a mut Callbacks,
    ) -> Self {
        Self {
            appmap,
            device: device.to_string(),
            diagnostics,
            callbacks,
            previous_title: None,
            callback_failures: Vec::new(),
        }
    }

    /// Run `scenarios` in order (after the optional one-time shuffle).
    ///
    /// Errors are reserved for failing to write the intended test list;
    /// scenario failures are recorded in the returned report.
    pub fn run_list(
        &mut self,
        mut scenarios: Vec<&Scenario>,
        options: &RunOptions,
    ) -> Result<RunReport> {
        if let Some(seed) = options.random_seed {
            tracing::info!(seed, "randomizing scenario order");
            shuffle(&mut scenarios, seed);
        }

        let started_at = now_epoch_ms().unwrap_or_default();
        let callbacks = &mut *self.callbacks;
        if let Err(failure) = guard_hook("prepare", || callbacks.prepare()) {
            let message = format!("Callback 'prepare' failed: {failure}");
            tracing::error!("{message}");
            log_screen_info(self.diagnostics);
            return Ok(RunReport::prepare_failed(
                &self.device,
                options.random_seed,
                started_at,
                message,
            ));
        }

        if let Some(path) = options.intended_list_path.as_deref() {
            write_json(path, &IntendedTestList::new(&scenarios))?;
            tracing::debug!(path = %path.display(), "wrote intended test list");
        }

        let total = scenarios.len();
        tracing::info!(device = self.device.as_str(), "{total} scenarios to run");
        let run_started = Instant::now();
        let mut outcomes = Vec::with_capacity(total);
        for (index, scenario) in scenarios.iter().enumerate() {
            let message = format!("Running scenario {} of {total}", index + 1);
            outcomes.push(self.run_scenario(scenario, Some(&message)));
        }

        let duration_ms = run_started.elapsed().as_millis();
        tracing::info!(
            "Completed running scenario list ({total} scenarios) in {:.2} seconds",
            duration_ms as f64 / 1000.0
        );
        let timing = RunTiming {
            scenario_count: total,
            started_at_epoch_ms: started_at,
            duration_ms,
        };
        let callbacks = &mut *self.callbacks;
        let result = guard_hook("complete", || callbacks.complete(&timing));
        self.note_callback("complete", result);

        let mut report = RunReport::new(&self.device, options.random_seed, started_at, outcomes);
        report.callback_failures = std::mem::take(&mut self.callback_failures);
        Ok(report)
    }

    /// Run one scenario to a terminal state.
    pub fn run_scenario(&mut self, scenario: &Scenario, message: Option<&str>) -> ScenarioOutcome {
        let title = scenario.title();
        let started_at = now_epoch_ms().unwrap_or_default();
        let started = Instant::now();

        tracing::info!(scenario = title, "Running scenario '{title}'");
        if let Some(message) = message {
            tracing::info!("{message}");
        }
        tracing::info!("Scenario tags are [{}]", scenario.tags().join(", "));
        match self.previous_title.replace(title.to_string()) {
            Some(previous) => tracing::info!("(Previous scenario was: {previous})"),
            None => tracing::info!("(No previous scenario)"),
        }

        let mut state = RunState::new();
        tracing::info!("STEP 0: Reset automator for new scenario");
        let callbacks = &mut *self.callbacks;
        let evaluation = match guard_hook("preScenario", || callbacks.pre_scenario(title)) {
            Ok(()) => self.evaluate_steps(scenario, &mut state),
            Err(failure) => {
                let message = format!("Test setup failed: Callback 'preScenario' failed: {failure}");
                tracing::error!(scenario = title, "{message}");
                log_screen_info(self.diagnostics);
                Evaluation {
                    status: ScenarioStatus::SetupFailed,
                    message: Some(message),
                    failed_step: None,
                    steps_run: 0,
                }
            }
        };

        let duration_ms = started.elapsed().as_millis();
        let timing = ScenarioTiming {
            scenario_name: title.to_string(),
            started_at_epoch_ms: started_at,
            duration_ms,
        };
        let callbacks = &mut *self.callbacks;
        if evaluation.status == ScenarioStatus::Passed {
            tracing::info!(scenario = title, "Scenario completed successfully");
            let result = guard_hook("onScenarioPass", || callbacks.on_scenario_pass(&timing));
            self.note_callback("onScenarioPass", result);
        } else {
            let result = guard_hook("onScenarioFail", || callbacks.on_scenario_fail(&timing));
            self.note_callback("onScenarioFail", result);
        }

        ScenarioOutcome {
            title: title.to_string(),
            tags: scenario.tags().to_vec(),
            status: evaluation.status,
            message: evaluation.message,
            failed_step: evaluation.failed_step,
            deferred_failures: state.take_deferred_failures(),
            steps_run: evaluation.steps_run,
            steps_total: scenario.steps().len(),
            started_at_epoch_ms: started_at,
            duration_ms,
        }
    }

    fn note_callback(&mut self, name: &str, result: HookResult) {
        if let Err(failure) = result {
            let message = format!("Callback '{name}' failed: {failure}");
            tracing::error!(callback = name, "{message}");
            self.callback_failures.push(message);
        }
    }

    fn evaluate_steps(&self, scenario: &Scenario, state: &mut RunState) -> Evaluation {
        let total = scenario.steps().len();
        for (index, step) in scenario.steps().iter().enumerate() {
            let number = index + 1;
            state.set_current_step(number, step.action.step_name());
            if let Err(failure) = self.execute_step(step, number, total, state) {
                return self.hard_failure(scenario, step, number, failure, state);
            }
        }

        let deferred = state.deferred_failures();
        if deferred.is_empty() {
            return Evaluation::passed(total);
        }
        let mut message = format!(
            "The test completed all its steps, but {} failures were deferred",
            deferred.len()
        );
        tracing::error!(scenario = scenario.title(), "{message}");
        for (index, failure) in deferred.iter().enumerate() {
            let line = format!("Deferred Failure {}: {failure}", index + 1);
            tracing::error!(scenario = scenario.title(), "{line}");
            message.push('\n');
            message.push_str(&line);
        }
        Evaluation {
            status: ScenarioStatus::Failed,
            message: Some(message),
            failed_step: None,
            steps_run: total,
        }
    }

    fn execute_step(
        &self,
        step: &Step,
        number: usize,
        total: usize,
        state: &mut RunState,
    ) -> Result<(), StepFailure> {
        let action = self.appmap.action(&step.action).ok_or_else(|| {
            StepFailure::invariant(format!("action {} is not defined", step.action))
        })?;
        tracing::info!(
            step = number,
            "STEP {number} of {total}: ({}) {}{}",
            step.action,
            action.description(),
            parameter_summary(action, step.parameters.as_ref())
        );

        self.assert_correct_screen(action)?;

        let implementation = action.implementation_for(&self.device).ok_or_else(|| {
            StepFailure::invariant(format!(
                "no implementation of {} for device {} reached dispatch",
                step.action, self.device
            ))
        })?;
        let mut ctx = StepContext::new(state, self.diagnostics);
        let params = step.parameters.as_ref();
        catch_panic("implementation", || implementation(&mut ctx, params))
            .unwrap_or_else(|message| Err(StepFailure::runtime(message)))
    }

    fn assert_correct_screen(&self, action: &Action) -> Result<(), StepFailure> {
        let screen = action.screen_name();
        let Some(is_active) = action.screen_predicate(&self.device) else {
            return Err(StepFailure::setup(format!(
                "No screenIsActive function defined for screen '{screen}' on {}",
                self.device
            )));
        };
        match catch_panic("screen predicate", || is_active()) {
            Ok(true) => Ok(()),
            Ok(false) => Err(StepFailure::verification(format!(
                "Failed assertion that '{screen}' is active"
            ))),
            Err(message) => Err(StepFailure::verification(format!(
                "Failed assertion that '{screen}' is active: {message}"
            ))),
        }
    }

    fn hard_failure(
        &self,
        scenario: &Scenario,
        step: &Step,
        number: usize,
        failure: StepFailure,
        state: &RunState,
    ) -> Evaluation {
        if failure.kind() == FailureKind::Invariant {
            tracing::error!(
                scenario = scenario.title(),
                step = number,
                "selection and dispatch disagree: {failure}"
            );
        }
        capture_failure_screen(self.diagnostics, &step.action.step_name());
        log_screen_info(self.diagnostics);

        let mut message = format!(
            "Step {number} of {} ({}) failed in scenario: \"{}\" with message: {failure}",
            scenario.steps().len(),
            step.action.step_name(),
            scenario.title()
        );
        let deferred = state.deferred_failures();
        if !deferred.is_empty() {
            message.push_str(&format!(
                " :: {} other failures had been deferred",
                deferred.len()
            ));
            for (index, entry) in deferred.iter().enumerate() {
                tracing::error!("Deferred Failure {}: {entry}", index + 1);
            }
        }
        tracing::error!(scenario = scenario.title(), step = number, "{message}");
        Evaluation {
            status: ScenarioStatus::Failed,
            message: Some(message),
            failed_step: Some(number),
            steps_run: number,
        }
    }
}

/// ` {name: value, ...}` for parameters flagged for the step log, or empty.
pub fn parameter_summary(action: &Action, parameters: Option<&Params>) -> String {
    let Some(parameters) = parameters else {
        return String::new();
    };
    let parts: Vec<String> = parameters
        .iter()
        .filter(|(name, _)| {
            action
                .params()
                .get(name.as_str())
                .is_some_and(|spec| spec.include_in_summary)
        })
        .map(|(name, value)| format!("{name}: {}", summary_value(value)))
        .collect();
    if parts.is_empty() {
        return String::new();
    }
    format!(" {{{}}}", parts.join(", "))
}

fn summary_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Run user code, turning a panic into `"<what> panicked: <payload>"`.
fn catch_panic<T>(what: &str, f: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let payload = payload.as_ref();
        match payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        {
            Some(text) => format!("{what} panicked: {text}"),
            None => format!("{what} panicked"),
        }
    })
}

fn guard_hook(name: &str, hook: impl FnOnce() -> HookResult) -> HookResult {
    catch_panic(&format!("callback '{name}'"), hook)
        .unwrap_or_else(|message| Err(StepFailure::runtime(message)))
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
