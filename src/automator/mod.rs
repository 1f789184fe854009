//! The scenario engine.
//!
//! [`Automator`] owns the app map, the scenario store and the lifecycle hooks,
//! and exposes the two run entry points: by tag criteria and by name.
mod callbacks;
mod report;
mod runner;
mod scenario;
mod select;
mod shuffle;
mod state;

pub use callbacks::{Callbacks, HookResult, RunTiming, ScenarioTiming};
pub use report::{RunReport, RunSummary, ScenarioOutcome, ScenarioStatus};
pub use runner::{parameter_summary, IntendedTestList, RunOptions, ScenarioRunner};
pub use scenario::{Scenario, ScenarioBuilder, ScenarioStore, Step, UNTAGGED};
pub use select::{
    check_device_support, device_supports_scenario, matches_criteria, select_by_names,
    select_by_tags, TagCriteria, UnsupportedReason,
};
pub use shuffle::{shuffle, SHUFFLE_PRIME};
pub use state::{RunState, StepContext};

use crate::appmap::AppMap;
use crate::config::EntryPoint;
use crate::diagnostics::{Diagnostics, NoDiagnostics};
use crate::error::DefinitionError;
use anyhow::Result;

pub struct Automator {
    appmap: AppMap,
    scenarios: ScenarioStore,
    callbacks: Callbacks,
    diagnostics: Box<dyn Diagnostics>,
}

impl Automator {
    pub fn new(appmap: AppMap) -> Self {
        Self {
            appmap,
            scenarios: ScenarioStore::new(),
            callbacks: Callbacks::new(),
            diagnostics: Box::new(NoDiagnostics),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: impl Diagnostics + 'static) -> Self {
        self.diagnostics = Box::new(diagnostics);
        self
    }

    pub fn appmap(&self) -> &AppMap {
        &self.appmap
    }

    pub fn appmap_mut(&mut self) -> &mut AppMap {
        &mut self.appmap
    }

    pub fn scenarios(&self) -> &ScenarioStore {
        &self.scenarios
    }

    pub fn callbacks_mut(&mut self) -> &mut Callbacks {
        &mut self.callbacks
    }

    pub fn create_scenario(
        &mut self,
        title: &str,
        tags: &[&str],
    ) -> Result<ScenarioBuilder<'_>, DefinitionError> {
        self.scenarios.create_scenario(&self.appmap, title, tags)
    }

    /// Signal that definitions are complete and which entry point will run.
    ///
    /// Returns the `onInit` callback's failure, if any; callers decide
    /// whether to continue.
    pub fn init(&mut self, entry_point: EntryPoint) -> HookResult {
        tracing::debug!(entry_point = entry_point.as_str(), "automator initialized");
        self.callbacks.on_init(entry_point)
    }

    /// Run every scenario matching `criteria` that `device` supports.
    pub fn run_by_tags(
        &mut self,
        device: &str,
        criteria: &TagCriteria,
        options: &RunOptions,
    ) -> Result<RunReport> {
        tracing::info!(device, "Automator running scenarios with {criteria}");
        let selected = select_by_tags(&self.scenarios, &self.appmap, criteria, device);
        let mut runner = ScenarioRunner::new(
            &self.appmap,
            device,
            self.diagnostics.as_ref(),
            &mut self.callbacks,
        );
        runner.run_list(selected, options)
    }

    /// Run the named scenarios, in the given order, that `device` supports.
    pub fn run_by_names(
        &mut self,
        device: &str,
        names: &[String],
        options: &RunOptions,
    ) -> Result<RunReport> {
        tracing::info!(device, "Automator running scenarios by name: [{}]", names.join(", "));
        let selected = select_by_names(&self.scenarios, &self.appmap, names, device);
        let mut runner = ScenarioRunner::new(
            &self.appmap,
            device,
            self.diagnostics.as_ref(),
            &mut self.callbacks,
        );
        runner.run_list(selected, options)
    }

    /// Log what is defined instead of running anything.
    pub fn log_info(&self) {
        let tags: Vec<&str> = self.scenarios.defined_tags().into_iter().collect();
        tracing::info!(
            "Automator info: {} scenarios defined across {} apps",
            self.scenarios.len(),
            self.appmap.apps().count()
        );
        tracing::info!("Defined tags: [{}]", tags.join(", "));
    }
}
