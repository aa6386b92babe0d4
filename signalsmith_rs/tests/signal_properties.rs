//! End-to-end checks of the transformations composed over one dataset.

use anyhow::Result;
use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use signalsmith_rs::frame::{bool_column, column_names, column_with_nans, row_at};
use signalsmith_rs::{
    calculate_bollingers, crossed_above, crossed_below, generate_conditions_target,
    generate_conditions_threshold, stack_signals,
};

fn prices() -> DataFrame {
    df!(
        "close" => &[100.0, 101.5, 99.0, 102.0, 103.0, 101.0, 98.5, 104.0, 105.5, 103.5],
        "fast" => &[100.0, 101.0, 99.5, 101.5, 102.5, 101.5, 99.5, 102.5, 104.0, 103.5],
        "slow" => &[100.5, 100.5, 100.0, 100.5, 101.5, 101.5, 100.5, 101.0, 102.5, 103.5]
    )
    .unwrap()
}

#[test]
fn crossover_flags_follow_the_transition_rule() -> Result<()> {
    let mut frame = prices();
    crossed_above(&mut frame, "fast", "slow")?;
    crossed_below(&mut frame, "fast", "slow")?;

    let fast = column_with_nans(&frame, "fast")?;
    let slow = column_with_nans(&frame, "slow")?;
    let above = bool_column(&frame, "fast_crossed_above_slow")?;
    let below = bool_column(&frame, "fast_crossed_below_slow")?;

    assert!(!above[0] && !below[0]);
    for i in 1..fast.len() {
        let expected = fast[i] > slow[i] && !(fast[i - 1] > slow[i - 1]);
        assert_eq!(above[i], expected, "row {i}");
        assert!(!(above[i] && below[i]), "row {i} flagged both ways");
    }
    Ok(())
}

#[test]
fn crossover_flags_stack_into_composite_signals() -> Result<()> {
    let mut frame = prices();
    crossed_above(&mut frame, "fast", "slow")?;
    crossed_above(&mut frame, "close", "slow")?;
    crossed_below(&mut frame, "close", "fast")?;

    let flags = frame.select([
        "fast_crossed_above_slow",
        "close_crossed_above_slow",
        "close_crossed_below_fast",
    ])?;
    let mut rng = StdRng::seed_from_u64(2024);
    let stacked = stack_signals(&flags, 10, &mut rng)?;

    // 3 pairs + 1 triple.
    assert_eq!(stacked.width(), 4);
    assert_eq!(stacked.height(), frame.height());
    assert!(
        column_names(&stacked)
            .contains(&"fast_crossed_above_slow_close_crossed_above_slow".to_string())
    );
    Ok(())
}

#[test]
fn band_columns_are_ordered_and_nested() -> Result<()> {
    let mut frame = prices();
    calculate_bollingers(&mut frame, "close", 5, None)?;
    assert_eq!(frame.width(), 3 + 6);

    let upper: Vec<Vec<f64>> = ["1.5", "2", "2.5"]
        .iter()
        .map(|m| column_with_nans(&frame, &format!("5_close_BB_upper_{m}")).unwrap())
        .collect();
    let lower: Vec<Vec<f64>> = ["1.5", "2", "2.5"]
        .iter()
        .map(|m| column_with_nans(&frame, &format!("5_close_BB_lower_{m}")).unwrap())
        .collect();
    for i in 0..frame.height() {
        assert!(upper[2][i] >= upper[1][i] && upper[1][i] >= upper[0][i]);
        assert!(upper[0][i] >= lower[0][i]);
        assert!(lower[0][i] >= lower[1][i] && lower[1][i] >= lower[2][i]);
    }
    // The first row seeds the recursion with zero deviation.
    assert_eq!(upper[2][0], 100.0);
    assert_eq!(lower[2][0], 100.0);
    Ok(())
}

#[test]
fn generated_conditions_evaluate_against_rows() -> Result<()> {
    let mut frame = prices();
    calculate_bollingers(&mut frame, "close", 5, None)?;

    let target = generate_conditions_target(
        &frame,
        &["5_close_BB_upper_2", "5_close_BB_lower_2"],
        "close",
    );
    assert_eq!(target.len(), 6);

    let pairwise = generate_conditions_threshold(
        &frame,
        &["fast", "slow"],
        &["slow", "fast", "close"],
        "close",
    );
    // (fast, slow), (fast, close), (slow, close)
    assert_eq!(pairwise.len(), 9);

    let row = row_at(&frame, 3)?;
    let gt = pairwise.get("fast > slow").unwrap().evaluate(&row)?;
    let eq = pairwise.get("fast == slow").unwrap().evaluate(&row)?;
    let lt = pairwise.get("fast < slow").unwrap().evaluate(&row)?;
    assert_eq!([gt, eq, lt].iter().filter(|hit| **hit).count(), 1);
    assert!(gt);
    Ok(())
}
