//! Error types for authoring and executing scenarios.
//!
//! Authoring mistakes surface as [`DefinitionError`] the moment a definition
//! is made; problems during a run surface as [`StepFailure`] and only ever
//! abort the scenario that produced them.
use thiserror::Error;

/// Errors raised while building the app map or the scenario list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("Can't create Scenario '{title}', because that name already exists")]
    DuplicateScenario { title: String },

    #[error("Disallowed character '{character}' in tag '{tag}' in scenario '{title}'")]
    DisallowedTagCharacter {
        title: String,
        tag: String,
        character: char,
    },

    #[error("withStep received an undefined screen action '{action}' in scenario '{title}'{}", after_step(.after))]
    UndefinedAction {
        title: String,
        action: String,
        after: Option<String>,
    },

    #[error("In scenario '{title}' in step {step} ({action}) missing required parameter '{param}'; {schema}")]
    MissingParameter {
        title: String,
        step: usize,
        action: String,
        param: String,
        schema: String,
    },

    #[error("In scenario '{title}' in step {step} ({action}) received undefined parameter '{param}'; {schema}")]
    UnknownParameter {
        title: String,
        step: usize,
        action: String,
        param: String,
        schema: String,
    },

    #[error("Screen {app}.{screen} only has devices: '{}' but tried to add an implementation for device '{device}' in action '{action}'", .known.join("', '"))]
    UnknownDevice {
        app: String,
        screen: String,
        action: String,
        device: String,
        known: Vec<String>,
    },
}

fn after_step(after: &Option<String>) -> String {
    match after {
        Some(step) => format!(" after step {step}"),
        None => String::new(),
    }
}

/// Classification of an execution-time failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The environment was not set up for the step (missing predicate, hook failure).
    Setup,
    /// An implementation failed while driving the app.
    Runtime,
    /// An assertion about app state did not hold.
    Verification,
    /// Dispatch reached a step that selection should have filtered out.
    Invariant,
}

/// A failure raised while executing a step or a run hook.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepFailure {
    #[error("{0}")]
    Setup(String),
    #[error("{0}")]
    Runtime(String),
    #[error("{0}")]
    Verification(String),
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl StepFailure {
    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup(message.into())
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }

    pub fn verification(message: impl Into<String>) -> Self {
        Self::Verification(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Setup(_) => FailureKind::Setup,
            Self::Runtime(_) => FailureKind::Runtime,
            Self::Verification(_) => FailureKind::Verification,
            Self::Invariant(_) => FailureKind::Invariant,
        }
    }

    /// The underlying message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Setup(message)
            | Self::Runtime(message)
            | Self::Verification(message)
            | Self::Invariant(message) => message,
        }
    }
}

impl From<anyhow::Error> for StepFailure {
    fn from(err: anyhow::Error) -> Self {
        Self::Runtime(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_action_names_previous_step() {
        let err = DefinitionError::UndefinedAction {
            title: "Login".to_string(),
            action: "app.login.missing".to_string(),
            after: Some("login.enterText".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "withStep received an undefined screen action 'app.login.missing' in scenario 'Login' after step login.enterText"
        );
    }

    #[test]
    fn unknown_device_lists_known_devices() {
        let err = DefinitionError::UnknownDevice {
            app: "sample".to_string(),
            screen: "home".to_string(),
            action: "tap".to_string(),
            device: "iPad".to_string(),
            known: vec!["iPhone".to_string(), "Android".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("only has devices: 'iPhone', 'Android'"));
        assert!(text.contains("device 'iPad'"));
    }

    #[test]
    fn anyhow_errors_become_runtime_failures() {
        let failure: StepFailure = anyhow::anyhow!("element not found").into();
        assert_eq!(failure.kind(), FailureKind::Runtime);
        assert_eq!(failure.message(), "element not found");
    }
}
