//! A simulated sample app and its scenarios.
//!
//! The binary runs these against an in-process device so the engine can be
//! exercised end to end without real hardware.
use crate::appmap::{params, AppMap, Params};
use crate::automator::{Automator, ScenarioBuilder};
use crate::common::{define_common_actions, seconds_param, COMMON_APP, COMMON_SCREEN};
use crate::diagnostics::Diagnostics;
use crate::error::{DefinitionError, StepFailure};
use crate::wait::wait_for_result;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub const SAMPLE_APP: &str = "SampleApp";
pub const HOME_SCREEN: &str = "homeScreen";
pub const WAIT_SCREEN: &str = "waitForMe";
pub const SAMPLE_DEVICES: &[&str] = &["iPhone", "iPad"];

pub const BUTTON_LABEL: &str = "Button Pressed";
pub const WAIT_MESSAGE: &str = "Thanks for waiting";
const MESSAGE_DELAY: Duration = Duration::from_millis(300);
const DEFAULT_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimScreen {
    Home,
    WaitForMe,
}

#[derive(Debug)]
struct SimState {
    screen: SimScreen,
    label: String,
    rotated: bool,
    message_ready_at: Option<Instant>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            screen: SimScreen::Home,
            label: String::new(),
            rotated: false,
            message_ready_at: None,
        }
    }
}

/// In-process stand-in for a device running the sample app.
#[derive(Debug, Clone, Default)]
pub struct SimulatedDevice {
    state: Rc<RefCell<SimState>>,
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relaunch the app: home screen, empty label.
    pub fn reset(&self) {
        *self.state.borrow_mut() = SimState::default();
    }

    pub fn screen(&self) -> SimScreen {
        self.state.borrow().screen
    }

    pub fn label(&self) -> String {
        self.state.borrow().label.clone()
    }

    fn set_label(&self, text: &str) {
        self.state.borrow_mut().label = text.to_string();
    }

    fn navigate(&self, screen: SimScreen) {
        let mut state = self.state.borrow_mut();
        state.screen = screen;
        state.message_ready_at = match screen {
            SimScreen::WaitForMe => Some(Instant::now() + MESSAGE_DELAY),
            SimScreen::Home => None,
        };
    }

    /// The wait screen's message, once its delay has elapsed.
    pub fn message(&self) -> Option<&'static str> {
        let state = self.state.borrow();
        let ready_at = state.message_ready_at?;
        (state.screen == SimScreen::WaitForMe && Instant::now() >= ready_at).then_some(WAIT_MESSAGE)
    }

    fn is_on(&self, screen: SimScreen) -> bool {
        self.screen() == screen
    }
}

impl Diagnostics for SimulatedDevice {
    fn dump(&self) -> anyhow::Result<String> {
        let state = self.state.borrow();
        Ok(format!(
            "screen: {:?}, label: {:?}, rotated: {}",
            state.screen, state.label, state.rotated
        ))
    }
}

fn text_param<'p>(params: Option<&'p Params>, name: &str) -> Result<&'p str, StepFailure> {
    params
        .and_then(|params| params.get(name))
        .and_then(|value| value.as_str())
        .ok_or_else(|| StepFailure::setup(format!("parameter '{name}' must be a string")))
}

/// Add the sample app's screens and actions to `appmap`.
pub fn define_sample_app(appmap: &mut AppMap, device: &SimulatedDevice) -> Result<(), DefinitionError> {
    let (home_on_iphone, press, clear, verify, check, open, rotate) = (
        device.clone(),
        device.clone(),
        device.clone(),
        device.clone(),
        device.clone(),
        device.clone(),
        device.clone(),
    );
    let home_on_ipad = device.clone();
    appmap
        .create_or_augment_app(SAMPLE_APP)
        .with_screen(HOME_SCREEN)
        .on_device("iPhone", move || home_on_iphone.is_on(SimScreen::Home))
        .on_device("iPad", move || home_on_ipad.is_on(SimScreen::Home))
        .with_action("pressButton", "Press button on screen")
        .with_implementation(move |_, _| {
            press.set_label(BUTTON_LABEL);
            Ok(())
        })
        .with_action("clearLabel", "Clear label on screen")
        .with_implementation(move |_, _| {
            clear.set_label("");
            Ok(())
        })
        .with_action("verifyLabelString", "Verify label has proper string")
        .with_param("labelText", "label text", true, true)
        .with_implementation(move |_, params| {
            let expected = text_param(params, "labelText")?.to_string();
            wait_for_result(DEFAULT_WAIT, &expected, "verifyLabelString", || {
                Ok::<_, String>(verify.label())
            })
            .map(|_| ())
            .map_err(|failure| StepFailure::verification(failure.message()))
        })
        .with_action("checkLabelString", "Check the label, deferring any mismatch")
        .with_param("labelText", "label text", true, true)
        .with_implementation(move |ctx, params| {
            let expected = text_param(params, "labelText")?;
            let actual = check.label();
            if actual != expected {
                ctx.defer_failure(format!("label was {actual:?}, expected {expected:?}"));
            }
            Ok(())
        })
        .with_action("openWait", "Open the wait-for-me screen")
        .with_implementation(move |_, _| {
            open.navigate(SimScreen::WaitForMe);
            Ok(())
        })
        .with_action("rotate", "Rotate to landscape")
        .with_device_implementation("iPad", move |ctx, _| {
            rotate.state.borrow_mut().rotated = true;
            ctx.set_state("rotated", true);
            Ok(())
        })?;

    let (wait_active, message, back) = (device.clone(), device.clone(), device.clone());
    appmap
        .create_or_augment_app(SAMPLE_APP)
        .with_screen(WAIT_SCREEN)
        .on_device("iPhone", move || wait_active.is_on(SimScreen::WaitForMe))
        .with_action("verifyDelayedMessage", "Wait for the delayed message to appear")
        .with_param("expected", "Message text", true, true)
        .with_param("timeout", "Seconds to wait (default 2)", false, false)
        .with_implementation(move |_, params| {
            let expected = text_param(params, "expected")?.to_string();
            let timeout = seconds_param(params, "timeout")?.unwrap_or(DEFAULT_WAIT);
            wait_for_result(timeout, &expected, "verifyDelayedMessage", || {
                message
                    .message()
                    .map(str::to_string)
                    .ok_or("message not shown yet")
            })
            .map(|_| ())
        })
        .with_action("goBack", "Return to the home screen")
        .with_implementation(move |_, _| {
            back.navigate(SimScreen::Home);
            Ok(())
        });
    Ok(())
}

fn home(action: &str) -> (&'static str, &'static str, &str) {
    (SAMPLE_APP, HOME_SCREEN, action)
}

fn wait(action: &str) -> (&'static str, &'static str, &str) {
    (SAMPLE_APP, WAIT_SCREEN, action)
}

fn press_and_verify(builder: ScenarioBuilder<'_>) -> Result<ScenarioBuilder<'_>, DefinitionError> {
    builder
        .with_step(home("pressButton"), None)?
        .with_step(
            home("verifyLabelString"),
            params(json!({ "labelText": BUTTON_LABEL })),
        )
}

/// Define the sample scenarios on `automator`.
pub fn define_sample_scenarios(automator: &mut Automator) -> Result<(), DefinitionError> {
    automator
        .create_scenario("Press button to populate label", &["smoke", "functional"])?
        .with_generated_steps(press_and_verify)?
        .with_step(home("clearLabel"), None)?
        .with_step(home("verifyLabelString"), params(json!({ "labelText": "" })))?;

    automator
        .create_scenario("Repeated presses keep the label", &["smoke"])?
        .with_step(home("verifyIsActive"), None)?
        .with_repeated_step(home("pressButton"), 3, |_| None)?
        .with_step(
            home("checkLabelString"),
            params(json!({ "labelText": BUTTON_LABEL })),
        )?;

    automator
        .create_scenario("Wait for delayed message", &["functional", "wait"])?
        .with_step(home("openWait"), None)?
        .with_step(wait("verifyIsActive"), None)?
        .with_step(
            wait("verifyDelayedMessage"),
            params(json!({ "expected": WAIT_MESSAGE, "timeout": 2 })),
        )?
        .with_step(wait("goBack"), None)?
        .with_step(wait("verifyNotActive"), None)?
        .with_step(home("verifyIsActive"), None)?;

    automator
        .create_scenario("Rotate keeps label", &["functional", "tablet"])?
        .with_generated_steps(press_and_verify)?
        .with_step(home("rotate"), None)?
        .with_step(
            home("checkLabelString"),
            params(json!({ "labelText": BUTTON_LABEL })),
        )?;

    automator
        .create_scenario("Mismatched labels are all reported", &["functional", "deferred"])?
        .with_step(home("pressButton"), None)?
        .with_step(home("checkLabelString"), params(json!({ "labelText": "Wrong" })))?
        .with_step(home("clearLabel"), None)?
        .with_step(
            home("checkLabelString"),
            params(json!({ "labelText": BUTTON_LABEL })),
        )?;

    automator
        .create_scenario("Intentional failure", &["crash"])?
        .with_step(home("pressButton"), None)?
        .with_step((COMMON_APP, COMMON_SCREEN, "fail"), None)?
        .with_step(home("clearLabel"), None)?;
    Ok(())
}

/// The full sample setup: common actions, the sample app and its scenarios.
///
/// The device is reset before every scenario.
pub fn sample_automator(device: &SimulatedDevice) -> Result<Automator, DefinitionError> {
    let mut appmap = AppMap::new();
    define_common_actions(&mut appmap, SAMPLE_DEVICES);
    define_sample_app(&mut appmap, device)?;

    let mut automator = Automator::new(appmap).with_diagnostics(device.clone());
    let relaunch = device.clone();
    automator.callbacks_mut().set_pre_scenario(move |title| {
        tracing::debug!(scenario = title, "relaunching sample app");
        relaunch.reset();
        Ok(())
    });
    define_sample_scenarios(&mut automator)?;
    Ok(automator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_message_appears_after_delay() {
        let device = SimulatedDevice::new();
        assert_eq!(device.screen(), SimScreen::Home);
        device.navigate(SimScreen::WaitForMe);
        assert_eq!(device.message(), None);
        std::thread::sleep(MESSAGE_DELAY + Duration::from_millis(50));
        assert_eq!(device.message(), Some(WAIT_MESSAGE));
        device.reset();
        assert_eq!(device.screen(), SimScreen::Home);
        assert_eq!(device.message(), None);
    }

    #[test]
    fn sample_definitions_are_valid() {
        let device = SimulatedDevice::new();
        let automator = sample_automator(&device).expect("sample definitions");
        assert_eq!(automator.scenarios().len(), 6);
        assert!(automator.appmap().has_screen(SAMPLE_APP, WAIT_SCREEN));
        let tags = automator.scenarios().defined_tags();
        for tag in ["smoke", "functional", "wait", "crash"] {
            assert!(tags.contains(tag), "missing tag {tag}");
        }
    }
}
