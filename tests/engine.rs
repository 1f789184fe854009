//! Library-level runs: define an app map and scenarios in code, run them
//! through the automator and inspect the report.

use illuminator::appmap::{params, AppMap, Params};
use illuminator::automator::{Automator, RunOptions, ScenarioStatus, TagCriteria};
use illuminator::error::StepFailure;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct FakeLogin {
    screen: RefCell<String>,
    fields: RefCell<Vec<(String, String)>>,
}

fn text<'p>(params: Option<&'p Params>, name: &str) -> &'p str {
    params
        .and_then(|params| params.get(name))
        .and_then(|value| value.as_str())
        .unwrap_or_default()
}

fn login_automator(device: &Rc<FakeLogin>) -> Automator {
    let mut appmap = AppMap::new();
    let (on_login, on_home) = (Rc::clone(device), Rc::clone(device));
    let (typing, tapping) = (Rc::clone(device), Rc::clone(device));
    appmap
        .create_or_augment_app("app")
        .with_screen("login")
        .on_device("iPhone", move || *on_login.screen.borrow() == "login")
        .with_action("enterText", "Type into a field")
        .with_param("field", "Field name", true, true)
        .with_param("text", "Text to type", true, false)
        .with_implementation(move |_, params| {
            typing
                .fields
                .borrow_mut()
                .push((text(params, "field").to_string(), text(params, "text").to_string()));
            Ok(())
        })
        .with_action("tapButton", "Tap a button")
        .with_param("label", "Button label", true, true)
        .with_implementation(move |ctx, params| {
            if text(params, "label") != "Submit" {
                return Err(StepFailure::runtime("no such button"));
            }
            let user = tapping
                .fields
                .borrow()
                .iter()
                .find(|(field, _)| field == "user")
                .map(|(_, value)| value.clone())
                .unwrap_or_default();
            ctx.set_state("user", user);
            *tapping.screen.borrow_mut() = "home".to_string();
            Ok(())
        });
    appmap
        .create_or_augment_app("app")
        .with_screen("home")
        .on_device("iPhone", move || *on_home.screen.borrow() == "home");

    let mut automator = Automator::new(appmap);
    let relaunch = Rc::clone(device);
    automator.callbacks_mut().set_pre_scenario(move |_| {
        *relaunch.screen.borrow_mut() = "login".to_string();
        relaunch.fields.borrow_mut().clear();
        Ok(())
    });

    automator
        .create_scenario("Login", &["smoke"])
        .and_then(|builder| builder.with_step(("app", "login", "verifyIsActive"), None))
        .and_then(|builder| {
            builder.with_step(
                ("app", "login", "enterText"),
                params(json!({"field": "user", "text": "user1"})),
            )
        })
        .and_then(|builder| {
            builder.with_step(("app", "login", "tapButton"), params(json!({"label": "Submit"})))
        })
        .and_then(|builder| builder.with_step(("app", "login", "verifyNotActive"), None))
        .and_then(|builder| builder.with_step(("app", "home", "verifyIsActive"), None))
        .expect("define Login");
    automator
        .create_scenario("Wrong button", &["smoke", "negative"])
        .and_then(|builder| {
            builder.with_step(("app", "login", "tapButton"), params(json!({"label": "Cancel"})))
        })
        .and_then(|builder| builder.with_step(("app", "home", "verifyIsActive"), None))
        .expect("define Wrong button");
    automator
}

#[test]
fn login_runs_by_tag_and_records_outcomes() {
    let device = Rc::new(FakeLogin::default());
    let mut automator = login_automator(&device);
    let criteria = TagCriteria {
        any: vec!["smoke".to_string()],
        ..TagCriteria::default()
    };
    let report = automator
        .run_by_tags("iPhone", &criteria, &RunOptions::default())
        .expect("run");

    assert_eq!(report.scenario_count, 2);
    assert_eq!(report.pass_count, 1);
    let login = &report.scenarios[0];
    assert_eq!(login.title, "Login");
    assert_eq!(login.status, ScenarioStatus::Passed);
    assert_eq!(login.steps_run, 5);
    assert_eq!(
        *device.fields.borrow(),
        Vec::<(String, String)>::new(),
        "pre-scenario hook cleared fields before the second scenario"
    );

    let wrong = &report.scenarios[1];
    assert_eq!(wrong.status, ScenarioStatus::Failed);
    assert_eq!(wrong.failed_step, Some(1));
    assert_eq!(report.failed_titles(), ["Wrong button"]);
}

#[test]
fn names_run_in_the_order_given() {
    let device = Rc::new(FakeLogin::default());
    let mut automator = login_automator(&device);
    let names = vec![
        "Wrong button".to_string(),
        "Missing".to_string(),
        "Login".to_string(),
    ];
    let report = automator
        .run_by_names("iPhone", &names, &RunOptions::default())
        .expect("run");
    let titles: Vec<&str> = report.scenarios.iter().map(|outcome| outcome.title.as_str()).collect();
    assert_eq!(titles, ["Wrong button", "Login"]);
    assert_eq!(*device.screen.borrow(), "home");
}

#[test]
fn unsupported_devices_select_nothing() {
    let device = Rc::new(FakeLogin::default());
    let mut automator = login_automator(&device);
    let report = automator
        .run_by_tags("Android", &TagCriteria::default(), &RunOptions::default())
        .expect("run");
    assert!(report.scenarios.is_empty());
    assert_eq!(report.summary().to_string(), "no scenarios selected");
}
