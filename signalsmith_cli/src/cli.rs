use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};

use signalsmith_rs::config::{BandConfig, ConditionConfig, CrossoverConfig, StackConfig};
use signalsmith_rs::crossover::CrossDirection;

#[derive(Parser, Debug)]
#[command(
    name = "signalsmith",
    about = "Derive crossover, band, stacked and comparison signals from tabular data"
)]
pub struct Cli {
    /// Also append logs to this file
    #[arg(long = "log-file", global = true, value_hint = clap::ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Log more detail (-v debug, -vv trace) unless RUST_LOG is set
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Append a crossover flag column
    Cross(CrossArgs),
    /// Append exponentially weighted bands at 1.5, 2 and 2.5 deviations
    Bands(BandArgs),
    /// Write a frame of randomly sampled AND-stacked boolean columns
    Stack(StackArgs),
    /// Print comparison conditions and how many rows satisfy each
    Conditions(ConditionArgs),
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// Input CSV with a header row
    #[arg(long = "csv", value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub csv_path: PathBuf,
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Where to write the resulting CSV
    #[arg(long = "output", short = 'o', value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum DirectionValue {
    Above,
    Below,
}

impl From<DirectionValue> for CrossDirection {
    fn from(value: DirectionValue) -> Self {
        match value {
            DirectionValue::Above => CrossDirection::Above,
            DirectionValue::Below => CrossDirection::Below,
        }
    }
}

#[derive(Args, Debug)]
pub struct CrossArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub output: OutputArgs,

    /// Series that does the crossing
    #[arg(long)]
    pub left: String,

    /// Series being crossed
    #[arg(long)]
    pub right: String,

    #[arg(long, default_value = "above")]
    pub direction: DirectionValue,
}

impl CrossArgs {
    pub fn to_config(&self) -> CrossoverConfig {
        CrossoverConfig {
            left: self.left.clone(),
            right: self.right.clone(),
            direction: self.direction.into(),
        }
    }
}

#[derive(Args, Debug)]
pub struct BandArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub output: OutputArgs,

    #[arg(long)]
    pub column: String,

    /// Smoothing span
    #[arg(long, default_value_t = 20)]
    pub window: usize,

    /// Optional suffix appended to every band column name
    #[arg(long)]
    pub suffix: Option<String>,
}

impl BandArgs {
    pub fn to_config(&self) -> Result<BandConfig> {
        if self.window == 0 {
            bail!("--window must be at least 1");
        }
        Ok(BandConfig {
            column: self.column.clone(),
            window: self.window,
            suffix: self.suffix.clone(),
        })
    }
}

#[derive(Args, Debug)]
pub struct StackArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub output: OutputArgs,

    /// Number of combinations to sample (capped at what exists)
    #[arg(long = "total", alias = "total-signals")]
    pub total_signals: usize,

    /// Boolean columns to stack; all columns when omitted
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Seed for reproducible sampling
    #[arg(long)]
    pub seed: Option<u64>,
}

impl StackArgs {
    pub fn to_config(&self) -> StackConfig {
        StackConfig {
            total_signals: self.total_signals,
            columns: self.columns.clone(),
            seed: self.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct ConditionArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Left-hand columns
    #[arg(long, value_delimiter = ',', required = true)]
    pub columns: Vec<String>,

    /// Compare every column against this target
    #[arg(long, conflicts_with = "against")]
    pub target: Option<String>,

    /// Compare every unique pair between --columns and these columns
    #[arg(long, value_delimiter = ',')]
    pub against: Vec<String>,
}

impl ConditionArgs {
    pub fn to_config(&self) -> Result<ConditionConfig> {
        match (&self.target, self.against.is_empty()) {
            (Some(target), true) => Ok(ConditionConfig::Target {
                columns: self.columns.clone(),
                target: target.clone(),
            }),
            (None, false) => Ok(ConditionConfig::Pairwise {
                columns: self.columns.clone(),
                against: self.against.clone(),
                target: None,
            }),
            _ => bail!("pass exactly one of --target or --against"),
        }
    }
}
