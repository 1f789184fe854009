//! Per-scenario outcomes and the aggregated run report.
use serde::{Deserialize, Serialize};
use std::fmt;

pub const RUN_REPORT_SCHEMA_VERSION: u32 = 1;

/// Terminal state of one scenario execution.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    SetupFailed,
}

impl ScenarioStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioStatus::Passed => "passed",
            ScenarioStatus::Failed => "failed",
            ScenarioStatus::SetupFailed => "setup_failed",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ScenarioOutcome {
    pub title: String,
    pub tags: Vec<String>,
    pub status: ScenarioStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// 1-based number of the step that hard-failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<usize>,
    #[serde(default)]
    pub deferred_failures: Vec<String>,
    pub steps_run: usize,
    pub steps_total: usize,
    pub started_at_epoch_ms: u128,
    pub duration_ms: u128,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.status == ScenarioStatus::Passed
    }
}

/// Aggregated results for one run (`results.json`).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub schema_version: u32,
    pub generated_at_epoch_ms: u128,
    pub device: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepare_failure: Option<String>,
    /// Non-fatal lifecycle hook failures, in the order they happened.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub callback_failures: Vec<String>,
    pub scenario_count: usize,
    pub pass_count: usize,
    pub fail_count: usize,
    pub scenarios: Vec<ScenarioOutcome>,
}

impl RunReport {
    pub fn new(
        device: &str,
        random_seed: Option<i64>,
        generated_at_epoch_ms: u128,
        scenarios: Vec<ScenarioOutcome>,
    ) -> Self {
        let pass_count = scenarios.iter().filter(|outcome| outcome.passed()).count();
        Self {
            schema_version: RUN_REPORT_SCHEMA_VERSION,
            generated_at_epoch_ms,
            device: device.to_string(),
            random_seed,
            prepare_failure: None,
            callback_failures: Vec::new(),
            scenario_count: scenarios.len(),
            pass_count,
            fail_count: scenarios.len() - pass_count,
            scenarios,
        }
    }

    /// Report for a run whose `prepare` callback failed before any scenario.
    pub fn prepare_failed(
        device: &str,
        random_seed: Option<i64>,
        generated_at_epoch_ms: u128,
        message: String,
    ) -> Self {
        let mut report = Self::new(device, random_seed, generated_at_epoch_ms, Vec::new());
        report.prepare_failure = Some(message);
        report
    }

    pub fn summary(&self) -> RunSummary {
        if let Some(message) = &self.prepare_failure {
            return RunSummary::PrepareFailed {
                message: message.clone(),
            };
        }
        if self.scenario_count == 0 {
            return RunSummary::NoScenarios;
        }
        if self.fail_count == 0 {
            return RunSummary::AllPassed {
                total: self.scenario_count,
            };
        }
        RunSummary::Failed {
            failed: self.fail_count,
            total: self.scenario_count,
        }
    }

    pub fn failed_titles(&self) -> Vec<&str> {
        self.scenarios
            .iter()
            .filter(|outcome| !outcome.passed())
            .map(|outcome| outcome.title.as_str())
            .collect()
    }
}

/// Run-level verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSummary {
    NoScenarios,
    AllPassed { total: usize },
    Failed { failed: usize, total: usize },
    PrepareFailed { message: String },
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        matches!(self, RunSummary::NoScenarios | RunSummary::AllPassed { .. })
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunSummary::NoScenarios => write!(f, "no scenarios selected"),
            RunSummary::AllPassed { total } => write!(f, "all {total} scenarios passed"),
            RunSummary::Failed { failed, total } => {
                write!(f, "{failed} of {total} scenarios failed")
            }
            RunSummary::PrepareFailed { message } => write!(f, "run preparation failed: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(title: &str, status: ScenarioStatus) -> ScenarioOutcome {
        ScenarioOutcome {
            title: title.to_string(),
            tags: vec!["smoke".to_string()],
            status,
            message: None,
            failed_step: None,
            deferred_failures: Vec::new(),
            steps_run: 1,
            steps_total: 1,
            started_at_epoch_ms: 0,
            duration_ms: 5,
        }
    }

    #[test]
    fn summary_distinguishes_empty_passing_and_failing_runs() {
        let empty = RunReport::new("iPhone", None, 0, Vec::new());
        assert_eq!(empty.summary(), RunSummary::NoScenarios);
        assert_eq!(empty.summary().to_string(), "no scenarios selected");

        let passing = RunReport::new(
            "iPhone",
            None,
            0,
            vec![outcome("a", ScenarioStatus::Passed)],
        );
        assert_eq!(passing.summary(), RunSummary::AllPassed { total: 1 });
        assert!(passing.summary().is_success());

        let failing = RunReport::new(
            "iPhone",
            Some(3),
            0,
            vec![
                outcome("a", ScenarioStatus::Passed),
                outcome("b", ScenarioStatus::Failed),
                outcome("c", ScenarioStatus::SetupFailed),
            ],
        );
        assert_eq!(failing.summary().to_string(), "2 of 3 scenarios failed");
        assert_eq!(failing.failed_titles(), ["b", "c"]);
        assert!(!failing.summary().is_success());
    }

    #[test]
    fn prepare_failure_overrides_counts() {
        let report = RunReport::prepare_failed("iPad", None, 0, "no simulator".to_string());
        assert!(!report.summary().is_success());
        assert_eq!(
            report.summary().to_string(),
            "run preparation failed: no simulator"
        );
    }

    #[test]
    fn report_serializes_status_in_snake_case() {
        let report = RunReport::new(
            "iPhone",
            None,
            0,
            vec![outcome("a", ScenarioStatus::SetupFailed)],
        );
        let json = serde_json::to_value(&report).expect("serialize report");
        assert_eq!(json["scenarios"][0]["status"], "setup_failed");
        assert!(json.get("random_seed").is_none());
    }
}
