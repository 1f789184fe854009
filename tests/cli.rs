//! End-to-end runs of the `illum` binary against the bundled sample app.

mod common;

use common::{illum, path_arg, read_json, stdout};
use serde_json::json;

#[test]
fn smoke_run_passes_and_writes_artifacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let artifacts = dir.path().join("artifacts");
    let output = illum(&["run", "--tags-any", "smoke", "--artifacts", &path_arg(&artifacts)]);
    assert!(
        output.status.success(),
        "smoke run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout(&output).contains("all 2 scenarios passed"));

    let intended = read_json(&artifacts.join("intended_test_list.json"));
    assert_eq!(
        intended,
        json!({"scenarioNames": [
            "Press button to populate label",
            "Repeated presses keep the label"
        ]})
    );

    let results = read_json(&artifacts.join("results.json"));
    assert_eq!(results["device"], "iPhone");
    assert_eq!(results["scenario_count"], 2);
    assert_eq!(results["pass_count"], 2);
    assert_eq!(results["scenarios"][0]["status"], "passed");
}

#[test]
fn failing_scenarios_set_a_failing_exit_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = illum(&["run", "--tags-any", "crash", "--artifacts", &path_arg(dir.path())]);
    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.contains("1 of 1 scenarios failed"));
    assert!(text.contains("Intentional failure [failed]"));

    let results = read_json(&dir.path().join("results.json"));
    let outcome = &results["scenarios"][0];
    assert_eq!(outcome["failed_step"], 2);
    let message = outcome["message"].as_str().expect("message");
    assert!(message.starts_with("Step 2 of 3 (do.fail) failed in scenario: \"Intentional failure\""));
}

#[test]
fn deferred_failures_are_reported_in_results() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = illum(&[
        "run",
        "--scenario",
        "Mismatched labels are all reported",
        "--artifacts",
        &path_arg(dir.path()),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let results = read_json(&dir.path().join("results.json"));
    let deferred = results["scenarios"][0]["deferred_failures"]
        .as_array()
        .expect("deferred list");
    assert_eq!(deferred.len(), 2);
    assert!(deferred[0]
        .as_str()
        .is_some_and(|entry| entry.starts_with("Step 2 (homeScreen.checkLabelString)")));
}

#[test]
fn device_selection_skips_unsupported_scenarios() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = illum(&[
        "run",
        "--device",
        "iPad",
        "--tags-all",
        "functional",
        "--tags-none",
        "deferred",
        "--artifacts",
        &path_arg(dir.path()),
    ]);
    assert!(output.status.success());
    let intended = read_json(&dir.path().join("intended_test_list.json"));
    assert_eq!(
        intended,
        json!({"scenarioNames": ["Press button to populate label", "Rotate keeps label"]})
    );
}

#[test]
fn seeded_runs_repeat_their_order() {
    let order = |seed: &str| {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = illum(&[
            "run",
            "--tags-none",
            "crash,deferred",
            "--seed",
            seed,
            "--artifacts",
            &path_arg(dir.path()),
        ]);
        assert!(output.status.success());
        read_json(&dir.path().join("intended_test_list.json"))
    };
    assert_eq!(order("42"), order("42"));
}

#[test]
fn empty_criteria_only_log_info() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("run.json");
    std::fs::write(
        &config,
        r#"{"schema_version": 1, "entry_point": "run_by_tags", "tags_any": []}"#,
    )
    .expect("write config");
    let artifacts = dir.path().join("artifacts");
    let output = illum(&[
        "run",
        "--config",
        &path_arg(&config),
        "--artifacts",
        &path_arg(&artifacts),
    ]);
    assert!(output.status.success());
    assert!(!artifacts.join("results.json").exists());
}

#[test]
fn describe_writes_markdown_and_manifest() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = illum(&["describe", "--out", &path_arg(dir.path())]);
    assert!(output.status.success());

    let appmap = std::fs::read_to_string(dir.path().join("appmap.md")).expect("appmap.md");
    assert!(appmap.contains("SampleApp"));
    let scenarios = std::fs::read_to_string(dir.path().join("scenarios.md")).expect("scenarios.md");
    assert!(scenarios.contains("Intentional failure"));

    let manifest = read_json(&dir.path().join("scenarios.json"));
    assert_eq!(manifest["scenario_count"], 6);
    assert!(manifest["scenarios"][0]["steps"].is_array());
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("illum.json");
    let config_arg = path_arg(&config);

    assert!(illum(&["init", "--config", &config_arg]).status.success());
    let written = read_json(&config);
    assert_eq!(written["entry_point"], "run_by_tags");
    assert_eq!(written["tags_any"], json!(["smoke"]));

    let again = illum(&["init", "--config", &config_arg]);
    assert_eq!(again.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&again.stderr).contains("--force"));
    assert!(illum(&["init", "--config", &config_arg, "--force"]).status.success());
}

#[test]
fn invalid_config_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("run.json");
    std::fs::write(
        &config,
        r#"{"schema_version": 1, "entry_point": "run_by_names", "scenario_names": []}"#,
    )
    .expect("write config");
    let output = illum(&["run", "--config", &path_arg(&config)]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn init_print_writes_the_stub_to_stdout() {
    let output = illum(&["init", "--print"]);
    assert!(output.status.success());
    let stub: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("stub is JSON");
    assert_eq!(stub["schema_version"], 1);
    assert_eq!(stub["implementation"], "iPhone");

    assert_eq!(illum(&["init"]).status.code(), Some(2));
}
