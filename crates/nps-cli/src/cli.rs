//! CLI argument definitions for the neuropsych harvester.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use nps_cli::config::DEFAULT_CONFIG_PATH;

#[derive(Parser)]
#[command(
    name = "nps",
    version,
    about = "Harvest neuropsych summary sheets into an importable table",
    long_about = "Walk a tree of neuropsych score summary spreadsheets, extract scores\n\
                  by anchor label, reconcile them against completed visits in the\n\
                  records system and write a dated CSV ready for import."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Harvest, reconcile and write the output table.
    Run(RunArgs),

    /// List candidate spreadsheets without reading them.
    Scan(ConfigArgs),

    /// Print the configured field map.
    Fields(ConfigArgs),
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Application directory; relative config, resource and output paths resolve here.
    #[arg(long = "app-path", value_name = "DIR", default_value = ".")]
    pub app_path: PathBuf,

    /// Path to the TOML configuration file, relative to the application directory.
    #[arg(long = "config", value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output directory (overrides [output] dir).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Reconcile and report without writing the output file.
    #[arg(long = "dry-run", conflicts_with = "import")]
    pub dry_run: bool,

    /// Import the reconciled rows into the primary records project.
    #[arg(long = "import")]
    pub import: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
