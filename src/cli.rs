//! CLI argument parsing for the sample runner.
//!
//! Flags override the JSON run configuration; everything else lives in the
//! library so the same engine can be driven from test code.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "illum",
    version,
    about = "Run declarative UI-test scenarios against the bundled sample app",
    after_help = "Commands:\n  init --config <file>|--print   Write or print a run config stub\n  run [--config <file>] [flags]  Run scenarios by tag or by name\n  describe --out <dir>           Write Markdown and JSON descriptions of the definitions\n\nExamples:\n  illum init --config illum.json\n  illum run --tags-any smoke\n  illum run --device iPad --tags-all functional --tags-none crash --seed 42\n  illum run --scenario \"Intentional failure\" --artifacts /tmp/illum\n  illum describe --out /tmp/illum-docs",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log at debug level unless RUST_LOG is set
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Run(RunArgs),
    Describe(DescribeArgs),
}

#[derive(Parser, Debug)]
#[command(about = "Write a run config stub")]
pub struct InitArgs {
    /// Path of the config file to create
    #[arg(long, value_name = "FILE", required_unless_present = "print")]
    pub config: Option<PathBuf>,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,

    /// Print the stub to stdout instead of writing a file
    #[arg(long, conflicts_with_all = ["config", "force"])]
    pub print: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Run scenarios selected by tag or by name")]
pub struct RunArgs {
    /// Run config to start from (defaults apply when omitted)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Device implementation to run against
    #[arg(long, value_name = "NAME")]
    pub device: Option<String>,

    /// Run scenarios having at least one of these tags
    #[arg(long, value_name = "TAG", value_delimiter = ',')]
    pub tags_any: Vec<String>,

    /// Run scenarios having all of these tags
    #[arg(long, value_name = "TAG", value_delimiter = ',')]
    pub tags_all: Vec<String>,

    /// Skip scenarios having any of these tags
    #[arg(long, value_name = "TAG", value_delimiter = ',')]
    pub tags_none: Vec<String>,

    /// Run these scenarios by title, in order (repeatable)
    #[arg(long = "scenario", value_name = "TITLE", conflicts_with_all = ["tags_any", "tags_all", "tags_none"])]
    pub scenarios: Vec<String>,

    /// Shuffle the selected scenarios with this seed
    #[arg(long, value_name = "SEED", allow_hyphen_values = true)]
    pub seed: Option<i64>,

    /// Directory for intended_test_list.json and results.json
    #[arg(long, value_name = "DIR")]
    pub artifacts: Option<PathBuf>,
}

impl RunArgs {
    pub fn has_tag_overrides(&self) -> bool {
        !(self.tags_any.is_empty() && self.tags_all.is_empty() && self.tags_none.is_empty())
    }
}

#[derive(Parser, Debug)]
#[command(about = "Describe the app map and scenarios without running anything")]
pub struct DescribeArgs {
    /// Output directory for appmap.md, scenarios.md and scenarios.json
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Omit the step list from scenarios.json
    #[arg(long)]
    pub no_steps: bool,
}
