//! Scenario definitions: titled, tagged, ordered lists of validated steps.
use crate::appmap::{Action, ActionKey, AppMap, Params};
use crate::error::DefinitionError;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::OnceLock;

/// Tag given to scenarios created without any tags.
pub const UNTAGGED: &str = "_untagged";

fn disallowed_tag_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"[!@#$%^&*()\[\]{}<>`~,'"/\\+=;:]"#).expect("regex for disallowed tag characters")
    })
}

/// One invocation of an action with concrete parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub action: ActionKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Params>,
}

#[derive(Debug, Clone)]
pub struct Scenario {
    title: String,
    tags: Vec<String>,
    tag_set: BTreeSet<String>,
    steps: Vec<Step>,
}

impl Scenario {
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Tags in declaration order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_set.contains(tag)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

/// Every defined scenario, in creation order, with globally unique titles.
#[derive(Debug, Default)]
pub struct ScenarioStore {
    scenarios: Vec<Scenario>,
    titles: HashSet<String>,
}

impl ScenarioStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty scenario and return a builder for its steps.
    ///
    /// An empty tag list is replaced by [`UNTAGGED`].
    pub fn create_scenario<'a>(
        &'a mut self,
        appmap: &'a AppMap,
        title: &str,
        tags: &[&str],
    ) -> Result<ScenarioBuilder<'a>, DefinitionError> {
        if self.titles.contains(title) {
            return Err(DefinitionError::DuplicateScenario {
                title: title.to_string(),
            });
        }
        let tags: Vec<String> = if tags.is_empty() {
            vec![UNTAGGED.to_string()]
        } else {
            tags.iter().map(|tag| tag.to_string()).collect()
        };
        for tag in &tags {
            if let Some(found) = disallowed_tag_chars().find(tag) {
                return Err(DefinitionError::DisallowedTagCharacter {
                    title: title.to_string(),
                    tag: tag.clone(),
                    character: found.as_str().chars().next().unwrap_or_default(),
                });
            }
        }

        tracing::debug!(title, tags = ?tags, "creating scenario");
        self.titles.insert(title.to_string());
        let tag_set = tags.iter().cloned().collect();
        self.scenarios.push(Scenario {
            title: title.to_string(),
            tags,
            tag_set,
            steps: Vec::new(),
        });
        let index = self.scenarios.len() - 1;
        Ok(ScenarioBuilder {
            store: self,
            appmap,
            index,
        })
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn get(&self, title: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|scenario| scenario.title == title)
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Union of every scenario's tags.
    pub fn defined_tags(&self) -> BTreeSet<&str> {
        self.scenarios
            .iter()
            .flat_map(|scenario| scenario.tags.iter().map(String::as_str))
            .collect()
    }
}

/// Cursor on the most recently created scenario.
pub struct ScenarioBuilder<'a> {
    store: &'a mut ScenarioStore,
    appmap: &'a AppMap,
    index: usize,
}

impl<'a> ScenarioBuilder<'a> {
    fn scenario(&self) -> &Scenario {
        &self.store.scenarios[self.index]
    }

    pub fn title(&self) -> &str {
        &self.scenario().title
    }

    /// Append a step after checking the action exists and the parameters
    /// match its schema.
    pub fn with_step(
        self,
        action: impl Into<ActionKey>,
        parameters: Option<Params>,
    ) -> Result<Self, DefinitionError> {
        let key = action.into();
        let appmap = self.appmap;
        let scenario = self.scenario();
        let Some(resolved) = appmap.action(&key) else {
            return Err(DefinitionError::UndefinedAction {
                title: scenario.title.clone(),
                action: key.to_string(),
                after: scenario.steps.last().map(|step| step.action.step_name()),
            });
        };
        let step_number = scenario.steps.len() + 1;
        assert_required_parameters(&scenario.title, step_number, resolved, parameters.as_ref())?;
        if let Some(supplied) = parameters.as_ref() {
            assert_known_parameters(&scenario.title, step_number, resolved, supplied)?;
        }

        self.store.scenarios[self.index].steps.push(Step {
            action: key,
            parameters,
        });
        Ok(self)
    }

    /// Append the step only when `condition` holds at authoring time.
    pub fn with_conditional_step(
        self,
        condition: bool,
        action: impl Into<ActionKey>,
        parameters: Option<Params>,
    ) -> Result<Self, DefinitionError> {
        if condition {
            return self.with_step(action, parameters);
        }
        Ok(self)
    }

    /// Append `quantity` copies of a step; parameters are built per 0-based run.
    pub fn with_repeated_step<F>(
        mut self,
        action: impl Into<ActionKey>,
        quantity: usize,
        mut parameters: F,
    ) -> Result<Self, DefinitionError>
    where
        F: FnMut(usize) -> Option<Params>,
    {
        let key = action.into();
        for run in 0..quantity {
            self = self.with_step(key.clone(), parameters(run))?;
        }
        Ok(self)
    }

    /// Let a function append steps, e.g. a shared login sequence.
    pub fn with_generated_steps<F>(self, generate: F) -> Result<Self, DefinitionError>
    where
        F: FnOnce(Self) -> Result<Self, DefinitionError>,
    {
        generate(self)
    }
}

fn assert_required_parameters(
    title: &str,
    step: usize,
    action: &Action,
    supplied: Option<&Params>,
) -> Result<(), DefinitionError> {
    for (name, spec) in action.params() {
        let present = supplied.is_some_and(|params| params.contains_key(name));
        if spec.required && !present {
            return Err(DefinitionError::MissingParameter {
                title: title.to_string(),
                step,
                action: action.name().to_string(),
                param: name.clone(),
                schema: action.params_to_string(),
            });
        }
    }
    Ok(())
}

fn assert_known_parameters(
    title: &str,
    step: usize,
    action: &Action,
    supplied: &Params,
) -> Result<(), DefinitionError> {
    for name in supplied.keys() {
        if !action.params().contains_key(name) {
            return Err(DefinitionError::UnknownParameter {
                title: title.to_string(),
                step,
                action: action.name().to_string(),
                param: name.clone(),
                schema: action.params_to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "scenario_tests.rs"]
mod tests;
