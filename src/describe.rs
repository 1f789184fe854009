//! Read-only renderings of the definitions: Markdown for people, a JSON
//! manifest for tooling that matches scenario names across runs.
use crate::appmap::AppMap;
use crate::automator::{Scenario, ScenarioStore, Step};
use crate::util::sha256_hex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ScenarioManifest {
    pub schema_version: u32,
    pub scenario_count: usize,
    pub scenarios: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub title: String,
    pub tags: Vec<String>,
    /// `screen.action` per step, when steps were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<String>>,
    /// SHA-256 of the scenario's title, tags and full step list.
    pub digest: String,
}

#[derive(Serialize)]
struct DigestInput<'a> {
    title: &'a str,
    tags: &'a [String],
    steps: &'a [Step],
}

fn scenario_digest(scenario: &Scenario) -> String {
    let input = DigestInput {
        title: scenario.title(),
        tags: scenario.tags(),
        steps: scenario.steps(),
    };
    // Serializing plain strings and JSON maps cannot fail.
    let bytes = serde_json::to_vec(&input).unwrap_or_default();
    sha256_hex(&bytes)
}

pub fn scenario_manifest(store: &ScenarioStore, include_steps: bool) -> ScenarioManifest {
    let scenarios: Vec<ManifestEntry> = store
        .scenarios()
        .iter()
        .map(|scenario| ManifestEntry {
            title: scenario.title().to_string(),
            tags: scenario.tags().to_vec(),
            steps: include_steps.then(|| {
                scenario
                    .steps()
                    .iter()
                    .map(|step| step.action.step_name())
                    .collect()
            }),
            digest: scenario_digest(scenario),
        })
        .collect();
    ScenarioManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        scenario_count: scenarios.len(),
        scenarios,
    }
}

fn push_title(lines: &mut Vec<String>, rank: usize, text: &str) {
    for _ in rank..=4 {
        lines.push(String::new());
    }
    match rank {
        1 => {
            lines.push(text.to_string());
            lines.push("=".repeat(text.chars().count().max(10)));
        }
        2 => {
            lines.push(text.to_string());
            lines.push("-".repeat(text.chars().count().max(10)));
        }
        _ => lines.push(format!("{} {text}", "#".repeat(rank))),
    }
}

/// Markdown value for one step parameter, formatted by JSON type.
fn format_param_value(value: &Value) -> String {
    match value {
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::String(text) => format!("`{text}`"),
        Value::Array(_) => format!("`{value}` (Array)"),
        Value::Object(_) | Value::Null => format!("`{value}` (object)"),
    }
}

fn backticked(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("`{item}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn scenarios_markdown(store: &ScenarioStore, appmap: &AppMap) -> String {
    let mut lines = vec!["The following scenarios are defined in the Illuminator Automator:".to_string()];
    push_title(&mut lines, 1, "Automator Scenarios");
    for scenario in store.scenarios() {
        push_title(&mut lines, 2, scenario.title());
        let tags: Vec<&str> = scenario.tags().iter().map(String::as_str).collect();
        lines.push(format!("Tags: {}", backticked(&tags)));
        lines.push(String::new());

        for (index, step) in scenario.steps().iter().enumerate() {
            let description = appmap
                .action(&step.action)
                .map(|action| action.description())
                .unwrap_or_default();
            lines.push(format!(
                "{}. **{}**: {description}",
                index + 1,
                step.action.step_name()
            ));
            for (name, value) in step.parameters.iter().flatten() {
                lines.push(format!("    * `{name}` = {}", format_param_value(value)));
            }
        }
    }
    lines.join("\n")
}

pub fn appmap_markdown(appmap: &AppMap) -> String {
    let mut lines = vec!["The following apps are defined in the Illuminator AppMap:".to_string()];
    push_title(&mut lines, 1, "Automator App Map");
    for app in appmap.apps() {
        push_title(&mut lines, 2, app.name());
        for screen in app.screens() {
            push_title(&mut lines, 3, screen.name());
            lines.push(format!("Devices: {}", backticked(&screen.devices())));
            for action in screen.actions() {
                push_title(&mut lines, 4, action.name());
                lines.push(action.description().to_string());
                lines.push(String::new());
                lines.push(format!(
                    "Implementations: {}",
                    backticked(&action.implementation_keys())
                ));
                for (name, spec) in action.params() {
                    let kind = if spec.required { "required" } else { "optional" };
                    lines.push(format!("* `{name}` ({kind}): {}", spec.description));
                }
            }
        }
    }
    lines.join("\n")
}
