use anyhow::{Result, bail};
use polars::prelude::*;
use tracing::debug;

use crate::frame::{column_with_nans, replace_float_column};

/// Standard-deviation multipliers for the three band pairs.
pub const BAND_MULTIPLIERS: [f64; 3] = [1.5, 2.0, 2.5];

/// Smoothing factor for a span-style window.
pub fn span_alpha(window: usize) -> f64 {
    2.0 / (window as f64 + 1.0)
}

#[derive(Clone, Copy)]
struct EwmState {
    mean: f64,
    var: f64,
    /// Weight of the accumulated state relative to a fresh observation.
    old_wt: f64,
}

/// Non-adjusted exponentially weighted mean and (biased) standard
/// deviation.
///
/// The first finite value seeds the mean with zero variance; rows before it
/// are NaN. Every later row decays the accumulated weight by `1 - alpha`,
/// including NaN rows, so an observation after a gap counts for more. NaN
/// rows report the last mean and deviation.
fn ewm_mean_std(values: &[f64], alpha: f64) -> (Vec<f64>, Vec<f64>) {
    let mut mean_out = vec![f64::NAN; values.len()];
    let mut std_out = vec![f64::NAN; values.len()];
    let mut state: Option<EwmState> = None;

    for (i, &value) in values.iter().enumerate() {
        state = match state {
            None if value.is_finite() => Some(EwmState {
                mean: value,
                var: 0.0,
                old_wt: 1.0,
            }),
            None => None,
            Some(mut prev) => {
                prev.old_wt *= 1.0 - alpha;
                if value.is_finite() {
                    let total_wt = prev.old_wt + alpha;
                    let old_mean = prev.mean;
                    if old_mean != value {
                        prev.mean = (prev.old_wt * old_mean + alpha * value) / total_wt;
                    }
                    let shift = old_mean - prev.mean;
                    let residual = value - prev.mean;
                    prev.var = (prev.old_wt * (prev.var + shift * shift)
                        + alpha * residual * residual)
                        / total_wt;
                    prev.old_wt = 1.0;
                }
                Some(prev)
            }
        };
        if let Some(EwmState { mean, var, .. }) = state {
            mean_out[i] = mean;
            std_out[i] = var.max(0.0).sqrt();
        }
    }

    (mean_out, std_out)
}

pub fn ewm_mean(values: &[f64], window: usize) -> Vec<f64> {
    ewm_mean_std(values, span_alpha(window)).0
}

pub fn ewm_std(values: &[f64], window: usize) -> Vec<f64> {
    ewm_mean_std(values, span_alpha(window)).1
}

pub fn band_column_name(
    column: &str,
    window: usize,
    side: &str,
    multiplier: f64,
    suffix: Option<&str>,
) -> String {
    match suffix {
        Some(suffix) => format!("{window}_{column}_BB_{side}_{multiplier}_{suffix}"),
        None => format!("{window}_{column}_BB_{side}_{multiplier}"),
    }
}

/// Append upper and lower bands at each of [`BAND_MULTIPLIERS`] around the
/// exponentially weighted mean of `column_name`.
pub fn calculate_bollingers<'a>(
    frame: &'a mut DataFrame,
    column_name: &str,
    window: usize,
    suffix: Option<&str>,
) -> Result<&'a mut DataFrame> {
    if window == 0 {
        bail!("Band window for {column_name} must be at least 1");
    }
    let values = column_with_nans(frame, column_name)?;
    let (mean, std) = ewm_mean_std(&values, span_alpha(window));

    for multiplier in BAND_MULTIPLIERS {
        let upper: Vec<f64> = mean
            .iter()
            .zip(std.iter())
            .map(|(m, s)| m + s * multiplier)
            .collect();
        let lower: Vec<f64> = mean
            .iter()
            .zip(std.iter())
            .map(|(m, s)| m - s * multiplier)
            .collect();
        replace_float_column(
            frame,
            &band_column_name(column_name, window, "upper", multiplier, suffix),
            upper,
        )?;
        replace_float_column(
            frame,
            &band_column_name(column_name, window, "lower", multiplier, suffix),
            lower,
        )?;
    }

    debug!(column = column_name, window, "appended bollinger bands");
    Ok(frame)
}
