use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::frame::{column_with_nans, replace_bool_column};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CrossDirection {
    /// `left` moves from `<=` to `>` relative to `right`.
    Above,
    /// `left` moves from `>=` to `<` relative to `right`.
    Below,
}

impl CrossDirection {
    fn holds(self, left: f64, right: f64) -> bool {
        match self {
            CrossDirection::Above => left > right,
            CrossDirection::Below => left < right,
        }
    }

    fn label(self) -> &'static str {
        match self {
            CrossDirection::Above => "crossed_above",
            CrossDirection::Below => "crossed_below",
        }
    }
}

pub fn crossover_column_name(left: &str, right: &str, direction: CrossDirection) -> String {
    format!("{left}_{}_{right}", direction.label())
}

/// Flag the rows where the comparison between `left` and `right` starts
/// holding. Row 0 is never flagged and NaN never satisfies a comparison.
pub fn cross_flags(left: &[f64], right: &[f64], direction: CrossDirection) -> Vec<bool> {
    let current: Vec<bool> = left
        .iter()
        .zip(right.iter())
        .map(|(l, r)| direction.holds(*l, *r))
        .collect();
    current
        .iter()
        .enumerate()
        .map(|(i, &now)| i > 0 && now && !current[i - 1])
        .collect()
}

pub fn crossed_above<'a>(
    frame: &'a mut DataFrame,
    column_a: &str,
    column_b: &str,
) -> Result<&'a mut DataFrame> {
    append_cross(frame, column_a, column_b, CrossDirection::Above)
}

pub fn crossed_below<'a>(
    frame: &'a mut DataFrame,
    column_a: &str,
    column_b: &str,
) -> Result<&'a mut DataFrame> {
    append_cross(frame, column_a, column_b, CrossDirection::Below)
}

/// Shared body of [`crossed_above`] / [`crossed_below`]; appends the flag
/// column and hands the frame back.
pub fn append_cross<'a>(
    frame: &'a mut DataFrame,
    column_a: &str,
    column_b: &str,
    direction: CrossDirection,
) -> Result<&'a mut DataFrame> {
    let left = column_with_nans(frame, column_a)?;
    let right = column_with_nans(frame, column_b)?;
    let flags = cross_flags(&left, &right, direction);
    let name = crossover_column_name(column_a, column_b, direction);
    debug!(
        column = %name,
        events = flags.iter().filter(|flag| **flag).count(),
        "computed crossover flags"
    );
    replace_bool_column(frame, &name, flags)?;
    Ok(frame)
}
