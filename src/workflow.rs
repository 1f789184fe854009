//! Command implementations behind the CLI.
use crate::automator::{Automator, RunOptions, RunReport, RunSummary};
use crate::cli::{DescribeArgs, InitArgs, RunArgs};
use crate::config::{self, EntryPoint, RunConfig};
use crate::describe;
use crate::sample::{sample_automator, SimulatedDevice};
use crate::util::write_json;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

pub const INTENDED_TEST_LIST_FILE: &str = "intended_test_list.json";
pub const RESULTS_FILE: &str = "results.json";
pub const APPMAP_MARKDOWN_FILE: &str = "appmap.md";
pub const SCENARIOS_MARKDOWN_FILE: &str = "scenarios.md";
pub const SCENARIOS_MANIFEST_FILE: &str = "scenarios.json";

pub fn run_init(args: InitArgs) -> Result<()> {
    if args.print {
        println!("{}", config::config_stub());
        return Ok(());
    }
    let path = args
        .config
        .ok_or_else(|| anyhow!("init requires --config <FILE> or --print"))?;
    if path.is_file() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }
    config::write_config(&path, &config::default_config())?;
    println!("wrote {}", path.display());
    Ok(())
}

/// Layer CLI flags over the config file (or the defaults).
pub fn resolve_run_config(args: &RunArgs) -> Result<RunConfig> {
    let mut config = match args.config.as_deref() {
        Some(path) => config::load_config(path)?,
        None => config::default_config(),
    };
    if let Some(device) = &args.device {
        config.implementation = device.clone();
    }
    if !args.scenarios.is_empty() {
        config.entry_point = EntryPoint::RunByNames;
        config.scenario_names = args.scenarios.clone();
    } else if args.has_tag_overrides() {
        config.entry_point = EntryPoint::RunByTags;
        config.tags_any = args.tags_any.clone();
        config.tags_all = args.tags_all.clone();
        config.tags_none = args.tags_none.clone();
    }
    if args.seed.is_some() {
        config.random_seed = args.seed;
    }
    if args.artifacts.is_some() {
        config.artifacts_dir = args.artifacts.clone();
    }
    config::validate_config(&config)?;
    Ok(config)
}

/// `onInit` failures are reported but never stop the command.
fn init_automator(automator: &mut Automator, entry_point: EntryPoint) {
    if let Err(failure) = automator.init(entry_point) {
        tracing::error!("Callback 'onInit' failed: {failure}; continuing");
    }
}

/// Execute a run; returns whether it succeeded.
pub fn run_run(args: RunArgs) -> Result<bool> {
    let config = resolve_run_config(&args)?;
    let device = SimulatedDevice::new();
    let mut automator = sample_automator(&device).context("define sample scenarios")?;
    init_automator(&mut automator, config.entry_point);

    let options = RunOptions {
        random_seed: config.random_seed,
        intended_list_path: config
            .artifacts_dir
            .as_ref()
            .map(|dir| dir.join(INTENDED_TEST_LIST_FILE)),
    };
    let report = match config.entry_point {
        EntryPoint::Describe => {
            let out = config
                .artifacts_dir
                .as_deref()
                .ok_or_else(|| anyhow!("entry_point describe requires artifacts_dir"))?;
            write_descriptions(&automator, out, true)?;
            return Ok(true);
        }
        EntryPoint::RunByTags => {
            let criteria = config.criteria();
            if criteria.is_empty() {
                automator.log_info();
                return Ok(true);
            }
            automator.run_by_tags(&config.implementation, &criteria, &options)?
        }
        EntryPoint::RunByNames => {
            automator.run_by_names(&config.implementation, &config.scenario_names, &options)?
        }
    };

    if let Some(dir) = config.artifacts_dir.as_deref() {
        let path = dir.join(RESULTS_FILE);
        write_json(&path, &report).context("write run results")?;
        println!("wrote {}", path.display());
    }
    print_summary(&report);
    Ok(report.summary().is_success())
}

fn print_summary(report: &RunReport) {
    let summary = report.summary();
    println!("{summary}");
    if let RunSummary::Failed { .. } = summary {
        for outcome in report.scenarios.iter().filter(|outcome| !outcome.passed()) {
            println!("  {} [{}]", outcome.title, outcome.status.as_str());
        }
    }
}

pub fn run_describe(args: DescribeArgs) -> Result<()> {
    let device = SimulatedDevice::new();
    let mut automator = sample_automator(&device).context("define sample scenarios")?;
    init_automator(&mut automator, EntryPoint::Describe);
    write_descriptions(&automator, &args.out, !args.no_steps)
}

fn write_descriptions(automator: &Automator, out: &Path, include_steps: bool) -> Result<()> {
    fs::create_dir_all(out).with_context(|| format!("create {}", out.display()))?;

    let appmap_path = out.join(APPMAP_MARKDOWN_FILE);
    fs::write(&appmap_path, describe::appmap_markdown(automator.appmap()))
        .with_context(|| format!("write {}", appmap_path.display()))?;
    println!("wrote {}", appmap_path.display());

    let scenarios_path = out.join(SCENARIOS_MARKDOWN_FILE);
    let markdown = describe::scenarios_markdown(automator.scenarios(), automator.appmap());
    fs::write(&scenarios_path, markdown)
        .with_context(|| format!("write {}", scenarios_path.display()))?;
    println!("wrote {}", scenarios_path.display());

    let manifest_path = out.join(SCENARIOS_MANIFEST_FILE);
    let manifest = describe::scenario_manifest(automator.scenarios(), include_steps);
    write_json(&manifest_path, &manifest)?;
    println!("wrote {}", manifest_path.display());
    Ok(())
}
