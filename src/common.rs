//! Device-independent actions available to every scenario.
use crate::appmap::{AppMap, Params};
use crate::automator::StepContext;
use crate::diagnostics::log_screen_info;
use crate::error::StepFailure;
use std::thread;
use std::time::Duration;

pub const COMMON_APP: &str = "Illuminator";
pub const COMMON_SCREEN: &str = "do";

/// Read a non-negative number of seconds from a step parameter.
pub fn seconds_param(params: Option<&Params>, name: &str) -> Result<Option<Duration>, StepFailure> {
    let Some(value) = params.and_then(|params| params.get(name)) else {
        return Ok(None);
    };
    let seconds = value
        .as_f64()
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
        .ok_or_else(|| {
            StepFailure::setup(format!(
                "parameter '{name}' must be a non-negative number of seconds (got {value})"
            ))
        })?;
    Ok(Some(Duration::from_secs_f64(seconds)))
}

fn delay(_: &mut StepContext<'_>, params: Option<&Params>) -> Result<(), StepFailure> {
    let duration = seconds_param(params, "seconds")?
        .ok_or_else(|| StepFailure::setup("delay requires the 'seconds' parameter"))?;
    thread::sleep(duration);
    Ok(())
}

fn fail(_: &mut StepContext<'_>, _: Option<&Params>) -> Result<(), StepFailure> {
    Err(StepFailure::runtime(
        "purposely-thrown exception to halt the test scenario",
    ))
}

fn log_diagnostics(ctx: &mut StepContext<'_>, params: Option<&Params>) -> Result<(), StepFailure> {
    if let Some(duration) = seconds_param(params, "delay")? {
        thread::sleep(duration);
    }
    let dump = ctx
        .diagnostics()
        .dump()
        .map_err(|err| StepFailure::runtime(format!("diagnostic dump failed: {err:#}")))?;
    tracing::info!("diagnostics:\n{dump}");
    Ok(())
}

fn capture_screen(ctx: &mut StepContext<'_>, params: Option<&Params>) -> Result<(), StepFailure> {
    let title = params
        .and_then(|params| params.get("captureTitle"))
        .and_then(|value| value.as_str())
        .ok_or_else(|| StepFailure::setup("captureScreen requires a 'captureTitle' string"))?;
    ctx.diagnostics()
        .capture_screen(title)
        .map_err(|err| StepFailure::runtime(format!("screen capture failed: {err:#}")))?;
    log_screen_info(ctx.diagnostics());
    Ok(())
}

/// Define the `Illuminator.do` screen on each of `devices`.
pub fn define_common_actions(appmap: &mut AppMap, devices: &[&str]) {
    let mut screen = appmap
        .create_or_augment_app(COMMON_APP)
        .with_screen(COMMON_SCREEN);
    for device in devices {
        screen = screen.on_device(device, || true);
    }
    screen
        .with_action("delay", "Delay a given amount of time")
        .with_param("seconds", "Number of seconds to delay", true, true)
        .with_implementation(delay)
        .with_action("fail", "Unconditionally fail the current test for debugging purposes")
        .with_implementation(fail)
        .with_action("logDiagnostics", "Log the diagnostic dump of the device")
        .with_param("delay", "Number of seconds to delay before logging", false, true)
        .with_implementation(log_diagnostics)
        .with_action("captureScreen", "Capture a named screenshot of the device")
        .with_param("captureTitle", "The title of the screenshot to capture", true, true)
        .with_implementation(capture_screen);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appmap::{params, ActionKey};
    use crate::automator::RunState;
    use crate::diagnostics::{Diagnostics, NoDiagnostics};
    use serde_json::json;

    struct FixedDump;

    impl Diagnostics for FixedDump {
        fn dump(&self) -> anyhow::Result<String> {
            Ok("window: home".to_string())
        }
    }

    fn run(
        appmap: &AppMap,
        device: &str,
        action: &str,
        params: Option<Params>,
        diagnostics: &dyn Diagnostics,
    ) -> Result<(), StepFailure> {
        let key = ActionKey::new(COMMON_APP, COMMON_SCREEN, action);
        let implementation = appmap
            .action(&key)
            .and_then(|action| action.implementation_for(device))
            .expect("common action defined");
        let mut state = RunState::new();
        let mut ctx = StepContext::new(&mut state, diagnostics);
        implementation(&mut ctx, params.as_ref())
    }

    #[test]
    fn common_screen_is_active_on_every_requested_device() {
        let mut appmap = AppMap::new();
        define_common_actions(&mut appmap, &["iPhone", "iPad"]);
        let key = ActionKey::new(COMMON_APP, COMMON_SCREEN, "delay");
        let action = appmap.action(&key).expect("delay defined");
        assert_eq!(action.devices(), ["iPad", "iPhone"]);
        assert!(action.screen_predicate("iPad").is_some_and(|is_active| is_active()));
    }

    #[test]
    fn fail_and_delay_behave() {
        let mut appmap = AppMap::new();
        define_common_actions(&mut appmap, &["iPhone"]);
        let err = run(&appmap, "iPhone", "fail", None, &NoDiagnostics).expect_err("fails");
        assert!(err.message().contains("purposely-thrown"));

        run(&appmap, "iPhone", "delay", params(json!({"seconds": 0})), &NoDiagnostics)
            .expect("zero delay");
        let err = run(&appmap, "iPhone", "delay", params(json!({"seconds": "soon"})), &NoDiagnostics)
            .expect_err("not a number");
        assert_eq!(err.kind(), crate::error::FailureKind::Setup);
    }

    #[test]
    fn log_diagnostics_surfaces_dump_errors() {
        let mut appmap = AppMap::new();
        define_common_actions(&mut appmap, &["iPhone"]);
        run(&appmap, "iPhone", "logDiagnostics", None, &FixedDump).expect("dump available");
        let err = run(&appmap, "iPhone", "logDiagnostics", None, &NoDiagnostics)
            .expect_err("no dump");
        assert!(err.message().starts_with("diagnostic dump failed"));
    }
}
