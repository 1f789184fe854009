//! Scenario selection by tag criteria or by name, filtered by device support.
use super::scenario::{Scenario, ScenarioStore};
use crate::appmap::AppMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag filters for a run.
///
/// `all` and `none` are hard filters; `any` only applies when non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCriteria {
    #[serde(default)]
    pub any: Vec<String>,
    #[serde(default)]
    pub all: Vec<String>,
    #[serde(default)]
    pub none: Vec<String>,
}

impl TagCriteria {
    pub fn is_empty(&self) -> bool {
        self.any.is_empty() && self.all.is_empty() && self.none.is_empty()
    }
}

impl fmt::Display for TagCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tagsAny: [{}], tagsAll: [{}], tagsNone: [{}]",
            self.any.join(", "),
            self.all.join(", "),
            self.none.join(", ")
        )
    }
}

/// Why a scenario cannot run on a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedReason {
    /// The step's action has no screen predicate for the device.
    NoScreenPredicate { step: usize, screen: String },
    /// The step's action has neither a device nor a default implementation.
    NoImplementation { step: usize, action: String },
    /// The step references an action missing from the app map.
    MissingAction { step: usize, action: String },
}

impl UnsupportedReason {
    fn describe(&self, title: &str, device: &str) -> String {
        match self {
            Self::NoScreenPredicate { screen, .. } => format!(
                "Skipping scenario '{title}' because screen '{screen}' doesn't have a screenIsActive function for {device}"
            ),
            Self::NoImplementation { action, .. } => format!(
                "Skipping scenario '{title}' because action '{action}' isn't supported on {device}"
            ),
            Self::MissingAction { action, .. } => format!(
                "Skipping scenario '{title}' because action '{action}' is not defined"
            ),
        }
    }
}

/// Evaluate tag criteria: `all` must be present, `none` must be absent, then
/// at least one of `any` (or `any` empty).
pub fn matches_criteria(scenario: &Scenario, criteria: &TagCriteria) -> bool {
    if criteria.all.iter().any(|tag| !scenario.has_tag(tag)) {
        return false;
    }
    if criteria.none.iter().any(|tag| scenario.has_tag(tag)) {
        return false;
    }
    if criteria.any.is_empty() {
        return true;
    }
    criteria.any.iter().any(|tag| scenario.has_tag(tag))
}

/// Check every step is runnable on `device`, returning the first obstacle.
pub fn check_device_support(
    scenario: &Scenario,
    appmap: &AppMap,
    device: &str,
) -> Result<(), UnsupportedReason> {
    for (index, step) in scenario.steps().iter().enumerate() {
        let number = index + 1;
        let Some(action) = appmap.action(&step.action) else {
            return Err(UnsupportedReason::MissingAction {
                step: number,
                action: step.action.step_name(),
            });
        };
        if action.screen_predicate(device).is_none() {
            return Err(UnsupportedReason::NoScreenPredicate {
                step: number,
                screen: action.screen_name().to_string(),
            });
        }
        if action.implementation_for(device).is_none() {
            return Err(UnsupportedReason::NoImplementation {
                step: number,
                action: step.action.step_name(),
            });
        }
    }
    Ok(())
}

/// Whether `scenario` can run on `device`; unsupported scenarios are logged.
pub fn device_supports_scenario(scenario: &Scenario, appmap: &AppMap, device: &str) -> bool {
    match check_device_support(scenario, appmap, device) {
        Ok(()) => true,
        Err(reason) => {
            tracing::debug!("{}", reason.describe(scenario.title(), device));
            false
        }
    }
}

/// Scenarios matching `criteria` that run on `device`, in creation order.
pub fn select_by_tags<'s>(
    store: &'s ScenarioStore,
    appmap: &AppMap,
    criteria: &TagCriteria,
    device: &str,
) -> Vec<&'s Scenario> {
    store
        .scenarios()
        .iter()
        .filter(|scenario| {
            matches_criteria(scenario, criteria)
                && device_supports_scenario(scenario, appmap, device)
        })
        .collect()
}

/// Named scenarios that run on `device`, in the order the names were given.
///
/// Unknown names are skipped with a warning.
pub fn select_by_names<'s>(
    store: &'s ScenarioStore,
    appmap: &AppMap,
    names: &[String],
    device: &str,
) -> Vec<&'s Scenario> {
    let mut selected = Vec::new();
    for name in names {
        let Some(scenario) = store.get(name) else {
            tracing::warn!(name = name.as_str(), "no scenario defined with this name; skipping");
            continue;
        };
        if device_supports_scenario(scenario, appmap, device) {
            selected.push(scenario);
        }
    }
    selected
}

#[cfg(test)]
#[path = "select_tests.rs"]
mod tests;
