use super::*;

#[test]
fn stub_parses_and_validates() {
    let config: RunConfig = serde_json::from_str(&config_stub()).expect("parse stub");
    assert_eq!(config, default_config());
    validate_config(&config).expect("stub is valid");
    assert_eq!(config.criteria().any, ["smoke".to_string()]);
}

#[test]
fn omitted_fields_take_defaults() {
    let config: RunConfig =
        serde_json::from_str(r#"{"schema_version": 1, "entry_point": "describe"}"#)
            .expect("parse minimal config");
    assert_eq!(config.entry_point, EntryPoint::Describe);
    assert_eq!(config.implementation, DEFAULT_DEVICE);
    assert!(config.criteria().is_empty());
    assert!(config.random_seed.is_none());
}

#[test]
fn unknown_fields_are_rejected() {
    let err = serde_json::from_str::<RunConfig>(
        r#"{"schema_version": 1, "entry_point": "run_by_tags", "tagsAny": ["smoke"]}"#,
    )
    .expect_err("unknown field");
    assert!(err.to_string().contains("tagsAny"));
}

#[test]
fn validation_rejects_bad_configs() {
    let mut config = default_config();
    config.schema_version = 2;
    let err = validate_config(&config).expect_err("schema version");
    assert!(err.to_string().contains("schema_version 2"));

    let mut config = default_config();
    config.implementation = "  ".to_string();
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config.entry_point = EntryPoint::RunByNames;
    let err = validate_config(&config).expect_err("names required");
    assert!(err.to_string().contains("scenario_names"));

    config.scenario_names = vec!["Login".to_string()];
    validate_config(&config).expect("names present");
}

#[test]
fn write_then_load_preserves_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("conf").join("run.json");
    let mut config = default_config();
    config.random_seed = Some(-12);
    config.artifacts_dir = Some(PathBuf::from("out"));
    write_config(&path, &config).expect("write config");
    assert_eq!(load_config(&path).expect("load config"), config);
}

#[test]
fn load_reports_path_on_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.json");
    let err = load_config(&path).expect_err("missing file");
    assert!(format!("{err:#}").contains("absent.json"));
}
