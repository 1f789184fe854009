//! The app map: apps own screens, screens own actions, actions own a
//! parameter schema and per-device implementations.
//!
//! Definitions are built through short-lived builder values
//! ([`AppBuilder`], [`ScreenBuilder`], [`ActionBuilder`]) that each carry
//! their own cursor. Re-entering an existing app, screen, or action augments
//! it instead of replacing it.
use crate::automator::StepContext;
use crate::error::{DefinitionError, StepFailure};
use serde::Serialize;
use serde_json::Value;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Implementation key used when an action behaves the same on every device.
pub const DEFAULT_IMPLEMENTATION: &str = "default";
pub const VERIFY_IS_ACTIVE: &str = "verifyIsActive";
pub const VERIFY_NOT_ACTIVE: &str = "verifyNotActive";

/// Time `verifyNotActive` waits for transition animations before checking.
pub const NOT_ACTIVE_SETTLE_DELAY: Duration = Duration::from_millis(350);

/// Concrete argument values supplied to a step.
pub type Params = serde_json::Map<String, Value>;

/// Whether a screen is currently shown on a device.
pub type ScreenPredicate = Rc<dyn Fn() -> bool>;

/// Device implementation of an action.
pub type ActionFn = Rc<dyn Fn(&mut StepContext<'_>, Option<&Params>) -> Result<(), StepFailure>>;

/// Build [`Params`] from a JSON object literal; anything else yields `None`.
pub fn params(value: Value) -> Option<Params> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Fully qualified identity of an action.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ActionKey {
    pub app: String,
    pub screen: String,
    pub action: String,
}

impl ActionKey {
    pub fn new(app: &str, screen: &str, action: &str) -> Self {
        Self {
            app: app.to_string(),
            screen: screen.to_string(),
            action: action.to_string(),
        }
    }

    /// `screen.action`, the form used in step attribution and reports.
    pub fn step_name(&self) -> String {
        format!("{}.{}", self.screen, self.action)
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.app, self.screen, self.action)
    }
}

impl From<(&str, &str, &str)> for ActionKey {
    fn from((app, screen, action): (&str, &str, &str)) -> Self {
        Self::new(app, screen, action)
    }
}

/// Schema entry for one action parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub description: String,
    pub required: bool,
    pub include_in_summary: bool,
}

pub struct Action {
    key: ActionKey,
    description: String,
    params: BTreeMap<String, ParamSpec>,
    implementations: BTreeMap<String, ActionFn>,
    // Copied from the owning screen when the action is created; later
    // on_device calls on the screen do not reach this map.
    screen_predicates: BTreeMap<String, ScreenPredicate>,
}

impl Action {
    fn new(key: ActionKey, description: &str, snapshot: BTreeMap<String, ScreenPredicate>) -> Self {
        Self {
            key,
            description: description.to_string(),
            params: BTreeMap::new(),
            implementations: BTreeMap::new(),
            screen_predicates: snapshot,
        }
    }

    pub fn key(&self) -> &ActionKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.key.action
    }

    pub fn screen_name(&self) -> &str {
        &self.key.screen
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn params(&self) -> &BTreeMap<String, ParamSpec> {
        &self.params
    }

    pub fn screen_predicate(&self, device: &str) -> Option<&ScreenPredicate> {
        self.screen_predicates.get(device)
    }

    /// The device-specific implementation, falling back to the default one.
    pub fn implementation_for(&self, device: &str) -> Option<&ActionFn> {
        self.implementations
            .get(device)
            .or_else(|| self.implementations.get(DEFAULT_IMPLEMENTATION))
    }

    /// Devices this action inherited a screen predicate for.
    pub fn devices(&self) -> Vec<&str> {
        self.screen_predicates.keys().map(String::as_str).collect()
    }

    /// Implementation keys, including `default` when present.
    pub fn implementation_keys(&self) -> Vec<&str> {
        self.implementations.keys().map(String::as_str).collect()
    }

    /// Human-readable parameter schema used in authoring error messages.
    pub fn params_to_string(&self) -> String {
        let list: Vec<String> = self
            .params
            .iter()
            .map(|(name, spec)| {
                let kind = if spec.required { "required" } else { "optional" };
                format!("{name} ({kind}: {})", spec.description)
            })
            .collect();
        format!("parameters are: [{}]", list.join(", "))
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("key", &self.key)
            .field("description", &self.description)
            .field("params", &self.params)
            .field("implementations", &self.implementation_keys())
            .field("devices", &self.devices())
            .finish()
    }
}

pub struct Screen {
    name: String,
    predicates: BTreeMap<String, ScreenPredicate>,
    actions: BTreeMap<String, Action>,
}

impl Screen {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            predicates: BTreeMap::new(),
            actions: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn devices(&self) -> Vec<&str> {
        self.predicates.keys().map(String::as_str).collect()
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.values()
    }

    fn action_entry(&mut self, key: ActionKey, description: &str) -> &mut Action {
        match self.actions.entry(key.action.clone()) {
            Entry::Occupied(entry) => {
                tracing::debug!(action = %key, "augmenting action");
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                tracing::debug!(action = %key, "adding action");
                entry.insert(Action::new(key, description, self.predicates.clone()))
            }
        }
    }
}

impl fmt::Debug for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Screen")
            .field("name", &self.name)
            .field("devices", &self.devices())
            .field("actions", &self.actions)
            .finish()
    }
}

#[derive(Debug)]
pub struct App {
    name: String,
    screens: BTreeMap<String, Screen>,
}

impl App {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn screen(&self, name: &str) -> Option<&Screen> {
        self.screens.get(name)
    }

    pub fn screens(&self) -> impl Iterator<Item = &Screen> {
        self.screens.values()
    }
}

/// Store of every app definition available to scenarios.
#[derive(Debug, Default)]
pub struct AppMap {
    apps: BTreeMap<String, App>,
}

impl AppMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or resume) defining an app.
    pub fn create_or_augment_app(&mut self, name: &str) -> AppBuilder<'_> {
        if !self.apps.contains_key(name) {
            tracing::debug!(app = name, "adding app");
            self.apps.insert(
                name.to_string(),
                App {
                    name: name.to_string(),
                    screens: BTreeMap::new(),
                },
            );
        }
        AppBuilder {
            map: self,
            app: name.to_string(),
        }
    }

    pub fn has_app(&self, app: &str) -> bool {
        self.apps.contains_key(app)
    }

    pub fn has_screen(&self, app: &str, screen: &str) -> bool {
        self.app(app).is_some_and(|found| found.screens.contains_key(screen))
    }

    pub fn has_action(&self, key: &ActionKey) -> bool {
        self.action(key).is_some()
    }

    pub fn app(&self, name: &str) -> Option<&App> {
        self.apps.get(name)
    }

    pub fn apps(&self) -> impl Iterator<Item = &App> {
        self.apps.values()
    }

    pub fn action(&self, key: &ActionKey) -> Option<&Action> {
        self.app(&key.app)?.screen(&key.screen)?.action(&key.action)
    }

    fn screen_entry(&mut self, app: &str, screen: &str) -> &mut Screen {
        let app_entry = self.apps.entry(app.to_string()).or_insert_with(|| App {
            name: app.to_string(),
            screens: BTreeMap::new(),
        });
        app_entry
            .screens
            .entry(screen.to_string())
            .or_insert_with(|| {
                tracing::debug!(app, screen, "adding screen");
                Screen::new(screen)
            })
    }

    fn register_device(&mut self, app: &str, screen: &str, device: &str, is_active: ScreenPredicate) {
        tracing::debug!(app, screen, device, "enabling screen on device");
        let entry = self.screen_entry(app, screen);
        entry.predicates.insert(device.to_string(), is_active.clone());
        let snapshot = entry.predicates.clone();

        // The synthesized actions are re-synced with the screen on every
        // device registration so each registered device stays valid for them.
        let is_active_action = entry.action_entry(
            ActionKey::new(app, screen, VERIFY_IS_ACTIVE),
            &format!("Null op to verify that the {screen} screen is active"),
        );
        is_active_action.screen_predicates = snapshot.clone();
        is_active_action
            .implementations
            .insert(device.to_string(), noop_action());

        // verifyNotActive runs off-screen by definition: its precondition is
        // always satisfied and the real check happens in the implementation.
        let not_active_action = entry.action_entry(
            ActionKey::new(app, screen, VERIFY_NOT_ACTIVE),
            &format!("Verify that the {screen} screen is NOT active"),
        );
        not_active_action.screen_predicates = snapshot
            .keys()
            .map(|device| {
                let always: ScreenPredicate = Rc::new(|| true);
                (device.clone(), always)
            })
            .collect();
        let screen_name = screen.to_string();
        let check: ActionFn = Rc::new(move |_: &mut StepContext<'_>, _: Option<&Params>| {
            std::thread::sleep(NOT_ACTIVE_SETTLE_DELAY);
            if is_active() {
                return Err(StepFailure::verification(format!(
                    "Failed assertion that '{screen_name}' is NOT active"
                )));
            }
            Ok(())
        });
        not_active_action
            .implementations
            .insert(device.to_string(), check);
    }
}

fn noop_action() -> ActionFn {
    Rc::new(
        |_: &mut StepContext<'_>, _: Option<&Params>| -> Result<(), StepFailure> { Ok(()) },
    )
}

/// Cursor positioned on an app.
pub struct AppBuilder<'a> {
    map: &'a mut AppMap,
    app: String,
}

impl<'a> AppBuilder<'a> {
    /// Create the screen, or resume editing it if it already exists.
    pub fn with_screen(self, name: &str) -> ScreenBuilder<'a> {
        self.map.screen_entry(&self.app, name);
        ScreenBuilder {
            map: self.map,
            app: self.app,
            screen: name.to_string(),
        }
    }
}

/// Cursor positioned on a screen.
pub struct ScreenBuilder<'a> {
    map: &'a mut AppMap,
    app: String,
    screen: String,
}

impl<'a> ScreenBuilder<'a> {
    /// Enable the screen on a device.
    ///
    /// Also provides the `verifyIsActive` and `verifyNotActive` actions for
    /// that device.
    pub fn on_device(self, device: &str, is_active: impl Fn() -> bool + 'static) -> Self {
        self.map
            .register_device(&self.app, &self.screen, device, Rc::new(is_active));
        self
    }

    pub fn with_screen(self, name: &str) -> ScreenBuilder<'a> {
        AppBuilder {
            map: self.map,
            app: self.app,
        }
        .with_screen(name)
    }

    /// Create the action, or resume editing it if it already exists.
    pub fn with_action(self, name: &str, description: &str) -> ActionBuilder<'a> {
        let key = ActionKey::new(&self.app, &self.screen, name);
        self.map
            .screen_entry(&self.app, &self.screen)
            .action_entry(key.clone(), description);
        ActionBuilder { map: self.map, key }
    }
}

/// Cursor positioned on an action.
pub struct ActionBuilder<'a> {
    map: &'a mut AppMap,
    key: ActionKey,
}

impl<'a> ActionBuilder<'a> {
    pub fn key(&self) -> &ActionKey {
        &self.key
    }

    fn action_mut(&mut self) -> &mut Action {
        let key = self.key.clone();
        let screen = self.map.screen_entry(&key.app, &key.screen);
        screen
            .actions
            .entry(key.action.clone())
            .or_insert_with(|| Action::new(key, "", screen.predicates.clone()))
    }

    /// Add or overwrite a parameter in the action's schema.
    pub fn with_param(
        mut self,
        name: &str,
        description: &str,
        required: bool,
        include_in_summary: bool,
    ) -> Self {
        tracing::debug!(action = %self.key, param = name, "adding parameter");
        self.action_mut().params.insert(
            name.to_string(),
            ParamSpec {
                description: description.to_string(),
                required,
                include_in_summary,
            },
        );
        self
    }

    /// Register the implementation used on every device without its own.
    pub fn with_implementation<F>(mut self, implementation: F) -> Self
    where
        F: Fn(&mut StepContext<'_>, Option<&Params>) -> Result<(), StepFailure> + 'static,
    {
        self.action_mut()
            .implementations
            .insert(DEFAULT_IMPLEMENTATION.to_string(), Rc::new(implementation));
        self
    }

    /// Register an implementation for one device.
    ///
    /// The device must already have a predicate on the screen at the time the
    /// action was created, or be `default`.
    pub fn with_device_implementation<F>(
        mut self,
        device: &str,
        implementation: F,
    ) -> Result<Self, DefinitionError>
    where
        F: Fn(&mut StepContext<'_>, Option<&Params>) -> Result<(), StepFailure> + 'static,
    {
        let action = self.action_mut();
        if device != DEFAULT_IMPLEMENTATION && !action.screen_predicates.contains_key(device) {
            return Err(DefinitionError::UnknownDevice {
                app: action.key.app.clone(),
                screen: action.key.screen.clone(),
                action: action.key.action.clone(),
                device: device.to_string(),
                known: action.devices().into_iter().map(str::to_string).collect(),
            });
        }
        tracing::debug!(action = %action.key, device, "adding implementation");
        action
            .implementations
            .insert(device.to_string(), Rc::new(implementation));
        Ok(self)
    }

    pub fn with_action(self, name: &str, description: &str) -> ActionBuilder<'a> {
        self.into_screen().with_action(name, description)
    }

    pub fn with_screen(self, name: &str) -> ScreenBuilder<'a> {
        self.into_screen().with_screen(name)
    }

    pub fn on_device(self, device: &str, is_active: impl Fn() -> bool + 'static) -> ScreenBuilder<'a> {
        self.into_screen().on_device(device, is_active)
    }

    /// Move the cursor back to the owning screen.
    pub fn into_screen(self) -> ScreenBuilder<'a> {
        ScreenBuilder {
            map: self.map,
            app: self.key.app,
            screen: self.key.screen,
        }
    }
}

#[cfg(test)]
#[path = "appmap_tests.rs"]
mod tests;
