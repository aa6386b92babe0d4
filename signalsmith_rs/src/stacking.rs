use std::collections::HashSet;

use anyhow::{Result, anyhow};
use polars::prelude::*;
use rand::Rng;
use rand::seq::index;
use tracing::debug;

use crate::combinator::{IndexCombination, total_combinations, unrank_global};
use crate::frame::{bool_column, column_names, replace_bool_column};

/// Smallest combination size considered for stacking.
pub const MIN_STACK_DEPTH: usize = 2;

/// Number of stackable combinations over `column_count` boolean columns,
/// or `None` when the count does not fit in a `u128` (more than 128 columns).
pub fn available_stacks(column_count: usize) -> Option<u128> {
    total_combinations(column_count, MIN_STACK_DEPTH, column_count)
}

/// Draw `amount` distinct global indices from `0..total` in sample order.
fn sample_global_indices<R: Rng + ?Sized>(rng: &mut R, total: u128, amount: usize) -> Vec<u128> {
    if let Ok(length) = usize::try_from(total) {
        return index::sample(rng, length, amount)
            .into_iter()
            .map(|i| i as u128)
            .collect();
    }
    // The candidate space dwarfs any request that fits in memory, so
    // rejection terminates quickly.
    let mut seen = HashSet::with_capacity(amount);
    let mut picks = Vec::with_capacity(amount);
    while picks.len() < amount {
        let candidate = rng.gen_range(0..total);
        if seen.insert(candidate) {
            picks.push(candidate);
        }
    }
    picks
}

/// AND together randomly chosen combinations of the boolean columns in
/// `frame`.
///
/// Candidates are every combination of two or more columns. At most
/// `total_signals` of them are drawn without replacement from `rng`; each
/// becomes a column named by joining its members with `_`. The result is a
/// new frame whose columns follow sample order; `frame` is left untouched.
pub fn stack_signals<R: Rng + ?Sized>(
    frame: &DataFrame,
    total_signals: usize,
    rng: &mut R,
) -> Result<DataFrame> {
    let names = column_names(frame);
    let columns = names
        .iter()
        .map(|name| bool_column(frame, name))
        .collect::<Result<Vec<_>>>()?;

    let n = names.len();
    let available = available_stacks(n).ok_or_else(|| {
        anyhow!("{n} boolean columns give more stack combinations than can be counted exactly")
    })?;
    let amount = usize::try_from(available)
        .map(|available| available.min(total_signals))
        .unwrap_or(total_signals);

    let mut result = DataFrame::default();
    if amount == 0 {
        debug!(
            columns = n,
            requested = total_signals,
            "no combinations to stack"
        );
        return Ok(result);
    }

    for global in sample_global_indices(rng, available, amount) {
        let combo: IndexCombination = unrank_global(global, n, MIN_STACK_DEPTH, n)
            .ok_or_else(|| anyhow!("combination index {global} out of range for {n} columns"))?;
        let stacked_name = combo
            .iter()
            .map(|&i| names[i].as_str())
            .collect::<Vec<_>>()
            .join("_");

        let mut stacked = columns[combo[0]].clone();
        for &member in &combo[1..] {
            for (acc, value) in stacked.iter_mut().zip(columns[member].iter()) {
                *acc = *acc && *value;
            }
        }
        replace_bool_column(&mut result, &stacked_name, stacked)?;
    }

    debug!(
        columns = n,
        available = %available,
        requested = total_signals,
        produced = result.width(),
        "stacked boolean signals"
    );
    Ok(result)
}
