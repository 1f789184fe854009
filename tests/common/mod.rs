//! Shared helpers for driving the `illum` binary.

use std::path::Path;
use std::process::{Command, Output};

/// Run `illum` with `args`, quiet unless the test environment sets RUST_LOG.
pub fn illum(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_illum"))
        .args(args)
        .env("RUST_LOG", std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()))
        .output()
        .expect("spawn illum")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn read_json(path: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("read {}: {err}", path.display()));
    serde_json::from_str(&text).unwrap_or_else(|err| panic!("parse {}: {err}", path.display()))
}

pub fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
