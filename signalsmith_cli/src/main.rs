mod cli;

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use polars::prelude::*;
use signalsmith_rs::config::{BandConfig, ConditionConfig, CrossoverConfig, StackConfig};
use signalsmith_rs::crossover::append_cross;
use signalsmith_rs::frame::{load_csv, write_csv};
use signalsmith_rs::{
    ConditionSet, calculate_bollingers, generate_conditions_target, generate_conditions_threshold,
    stack_signals,
};
use tracing::info;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, prelude::*};

use cli::{Cli, Commands};

/// Filter used when `RUST_LOG` is unset: `info`, then one level per `-v`.
fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. The returned guard flushes the log file
/// when dropped, so hold it until the command finishes.
fn init_tracing(log_file: Option<PathBuf>, verbose: u8) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create log directory {parent:?}"))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {path:?}"))?;
            let (writer, guard) = non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize tracing: {err}"))?;
    Ok(guard)
}

fn run_cross(frame: &mut DataFrame, config: &CrossoverConfig) -> Result<()> {
    append_cross(frame, &config.left, &config.right, config.direction)?;
    Ok(())
}

fn run_bands(frame: &mut DataFrame, config: &BandConfig) -> Result<()> {
    calculate_bollingers(
        frame,
        &config.column,
        config.window,
        config.suffix.as_deref(),
    )?;
    Ok(())
}

fn run_stack(frame: &DataFrame, config: &StackConfig) -> Result<DataFrame> {
    let source = if config.columns.is_empty() {
        frame.clone()
    } else {
        frame
            .select(&config.columns)
            .context("Failed to select columns for stacking")?
    };
    let mut rng = config.rng();
    stack_signals(&source, config.total_signals, &mut rng)
}

fn build_conditions(frame: &DataFrame, config: &ConditionConfig) -> ConditionSet {
    match config {
        ConditionConfig::Target { columns, target } => {
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            generate_conditions_target(frame, &columns, target)
        }
        ConditionConfig::Pairwise {
            columns,
            against,
            target,
        } => {
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            let against: Vec<&str> = against.iter().map(String::as_str).collect();
            generate_conditions_threshold(
                frame,
                &columns,
                &against,
                target.as_deref().unwrap_or_default(),
            )
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.clone(), cli.verbose)?;
    info!(version = env!("CARGO_PKG_VERSION"), "signalsmith invoked");

    match cli.command {
        Commands::Cross(args) => {
            let mut frame = load_csv(&args.input.csv_path)?;
            run_cross(&mut frame, &args.to_config())?;
            write_csv(&mut frame, &args.output.output)?;
            info!(output = %args.output.output.display(), "wrote crossover flags");
        }
        Commands::Bands(args) => {
            let config = args.to_config()?;
            let mut frame = load_csv(&args.input.csv_path)?;
            run_bands(&mut frame, &config)?;
            write_csv(&mut frame, &args.output.output)?;
            info!(output = %args.output.output.display(), "wrote bands");
        }
        Commands::Stack(args) => {
            let frame = load_csv(&args.input.csv_path)?;
            let mut stacked = run_stack(&frame, &args.to_config())?;
            write_csv(&mut stacked, &args.output.output)?;
            info!(
                output = %args.output.output.display(),
                columns = stacked.width(),
                "wrote stacked signals"
            );
        }
        Commands::Conditions(args) => {
            let config = args.to_config()?;
            let frame = load_csv(&args.input.csv_path)?;
            let conditions = build_conditions(&frame, &config);
            for (label, mask) in conditions.masks(&frame)? {
                let hits = mask.iter().filter(|hit| **hit).count();
                println!("{label}\t{hits}");
            }
            info!(conditions = conditions.len(), rows = frame.height(), "evaluated conditions");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_verbose_flag_lowers_the_default_level() {
        assert_eq!(default_directive(0), "info");
        assert_eq!(default_directive(1), "debug");
        assert_eq!(default_directive(2), "trace");
        assert_eq!(default_directive(7), "trace");
    }
}
