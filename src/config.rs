//! Run configuration.
//!
//! A JSON file selects the entry point, the device implementation and the
//! selection inputs. CLI flags are layered on top by the workflow.
use crate::automator::TagCriteria;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_DEVICE: &str = "iPhone";

/// Which top-level operation a run performs.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryPoint {
    RunByTags,
    RunByNames,
    Describe,
}

impl EntryPoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::RunByTags => "run_by_tags",
            EntryPoint::RunByNames => "run_by_names",
            EntryPoint::Describe => "describe",
        }
    }
}

fn default_device() -> String {
    DEFAULT_DEVICE.to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub schema_version: u32,
    pub entry_point: EntryPoint,
    /// Device implementation to run against.
    #[serde(default = "default_device")]
    pub implementation: String,
    #[serde(default)]
    pub tags_any: Vec<String>,
    #[serde(default)]
    pub tags_all: Vec<String>,
    #[serde(default)]
    pub tags_none: Vec<String>,
    #[serde(default)]
    pub scenario_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts_dir: Option<PathBuf>,
}

impl RunConfig {
    pub fn criteria(&self) -> TagCriteria {
        TagCriteria {
            any: self.tags_any.clone(),
            all: self.tags_all.clone(),
            none: self.tags_none.clone(),
        }
    }
}

/// Config used by `init` and when no file is given: run the smoke scenarios.
pub fn default_config() -> RunConfig {
    RunConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        entry_point: EntryPoint::RunByTags,
        implementation: DEFAULT_DEVICE.to_string(),
        tags_any: vec!["smoke".to_string()],
        tags_all: Vec::new(),
        tags_none: Vec::new(),
        scenario_names: Vec::new(),
        random_seed: None,
        artifacts_dir: None,
    }
}

/// Render a pretty JSON config stub.
pub fn config_stub() -> String {
    let config = default_config();
    serde_json::to_string_pretty(&config).expect("serialize config stub")
}

pub fn load_config(path: &Path) -> Result<RunConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: RunConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    Ok(config)
}

/// Persist a config to disk in a stable JSON format.
pub fn write_config(path: &Path, config: &RunConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config dir {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize run config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn validate_config(config: &RunConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported run config schema_version {}",
            config.schema_version
        ));
    }
    if config.implementation.trim().is_empty() {
        return Err(anyhow!("implementation must be non-empty"));
    }
    if config.entry_point == EntryPoint::RunByNames && config.scenario_names.is_empty() {
        return Err(anyhow!(
            "entry_point run_by_names requires at least one entry in scenario_names"
        ));
    }
    if let Some(name) = config
        .scenario_names
        .iter()
        .find(|name| name.trim().is_empty())
    {
        return Err(anyhow!("scenario_names entries must be non-empty (got {name:?})"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
