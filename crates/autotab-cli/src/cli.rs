//! CLI argument definitions for the AutoTab trainer CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "autotab",
    version,
    about = "AutoTab - automated tabular ML preprocessing",
    long_about = "Run the AutoTab preprocessing pipeline against a CSV dataset.\n\n\
                  `fit` classifies columns, builds the feature encoding, splits the\n\
                  data, and writes the preprocessing contract plus the encoded\n\
                  train/test matrices for the external model trainer.\n\
                  `inspect` renders a stored contract the way the prediction-info\n\
                  endpoint would."
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
    /// Fit the preprocessing pipeline on a CSV dataset.
    Fit(FitArgs),

    /// Show the inputs a stored preprocessing contract expects.
    Inspect(InspectArgs),
}

#[derive(Parser)]
pub struct FitArgs {
    /// Path to the dataset CSV file.
    #[arg(value_name = "DATASET_CSV")]
    pub dataset: PathBuf,

    /// Name of the target column to predict.
    #[arg(long = "target", value_name = "COLUMN")]
    pub target: String,

    /// Output directory for the contract and encoded matrices
    /// (default: <DATASET_CSV directory>/output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Fraction of rows held out for the test partition.
    #[arg(long = "test-fraction", value_name = "FRACTION", default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Random seed for the train/test split.
    #[arg(long = "seed", default_value_t = 42)]
    pub seed: u64,

    /// Classify and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Path to a preprocessing contract JSON file.
    #[arg(value_name = "CONTRACT_JSON")]
    pub contract: PathBuf,
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
