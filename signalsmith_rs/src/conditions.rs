use std::collections::{HashMap, HashSet};

use anyhow::{Result, anyhow};
use itertools::Itertools;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::frame::{Row, column_with_nans, has_column};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    GreaterThan,
    Equal,
    LessThan,
}

impl ComparisonOperator {
    /// Emission order used by the condition generators.
    pub const ALL: [ComparisonOperator; 3] = [
        ComparisonOperator::GreaterThan,
        ComparisonOperator::Equal,
        ComparisonOperator::LessThan,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::Equal => "==",
            ComparisonOperator::LessThan => "<",
        }
    }

    pub fn apply(self, left: f64, right: f64) -> bool {
        match self {
            ComparisonOperator::GreaterThan => left > right,
            ComparisonOperator::Equal => left == right,
            ComparisonOperator::LessThan => left < right,
        }
    }
}

/// A labelled row predicate comparing two columns.
///
/// The column names are owned by the condition, so every generated
/// condition refers to the pair it was built for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub left: String,
    pub operator: ComparisonOperator,
    pub right: String,
}

impl Condition {
    pub fn new(
        left: impl Into<String>,
        operator: ComparisonOperator,
        right: impl Into<String>,
    ) -> Self {
        Self {
            left: left.into(),
            operator,
            right: right.into(),
        }
    }

    /// Human-readable label, e.g. `close > 20ema`.
    pub fn label(&self) -> String {
        format!("{} {} {}", self.left, self.operator.symbol(), self.right)
    }

    pub fn evaluate(&self, row: &Row) -> Result<bool> {
        let left = lookup(row, &self.left)?;
        let right = lookup(row, &self.right)?;
        Ok(self.operator.apply(left, right))
    }

    /// Evaluate the condition on every row of `frame`.
    pub fn mask(&self, frame: &DataFrame) -> Result<Vec<bool>> {
        let left = column_with_nans(frame, &self.left)?;
        let right = column_with_nans(frame, &self.right)?;
        Ok(left
            .iter()
            .zip(right.iter())
            .map(|(l, r)| self.operator.apply(*l, *r))
            .collect())
    }
}

fn lookup(row: &Row, column: &str) -> Result<f64> {
    row.get(column)
        .copied()
        .ok_or_else(|| anyhow!("Missing required column {column}"))
}

/// Label -> condition mapping that remembers insertion order.
#[derive(Clone, Debug, Default)]
pub struct ConditionSet {
    entries: Vec<(String, Condition)>,
    positions: HashMap<String, usize>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under the condition's label. An existing label keeps its
    /// position and has its condition replaced.
    pub fn insert(&mut self, condition: Condition) {
        let label = condition.label();
        match self.positions.get(&label) {
            Some(&index) => self.entries[index].1 = condition,
            None => {
                self.positions.insert(label.clone(), self.entries.len());
                self.entries.push((label, condition));
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&Condition> {
        self.positions
            .get(label)
            .map(|&index| &self.entries[index].1)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.positions.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.entries
            .iter()
            .map(|(label, condition)| (label.as_str(), condition))
    }

    /// Masks for every condition, in insertion order.
    pub fn masks(&self, frame: &DataFrame) -> Result<Vec<(String, Vec<bool>)>> {
        self.entries
            .iter()
            .map(|(label, condition)| Ok((label.clone(), condition.mask(frame)?)))
            .collect()
    }
}

/// Compare every threshold column against `target_col` with `>`, `==`
/// and `<`. Columns are not validated here; a missing column only fails
/// when a condition is evaluated.
pub fn generate_conditions_target(
    frame: &DataFrame,
    threshold_cols: &[&str],
    target_col: &str,
) -> ConditionSet {
    warn_missing(frame, threshold_cols.iter().copied().chain([target_col]));

    let mut conditions = ConditionSet::new();
    for &column in threshold_cols {
        for operator in ComparisonOperator::ALL {
            conditions.insert(Condition::new(column, operator, target_col));
        }
    }
    debug!(
        target_col,
        conditions = conditions.len(),
        "generated target conditions"
    );
    conditions
}

/// Compare columns of `threshold_cols1` against columns of
/// `threshold_cols2` with `>`, `==` and `<`.
///
/// Pairs are visited in Cartesian-product order. Self-pairs are skipped, as
/// is any pair whose reverse was already emitted.
///
/// `target_col` is accepted for signature parity with
/// [`generate_conditions_target`] but is not referenced by the generated
/// conditions; they compare the two threshold columns with each other.
pub fn generate_conditions_threshold(
    frame: &DataFrame,
    threshold_cols1: &[&str],
    threshold_cols2: &[&str],
    target_col: &str,
) -> ConditionSet {
    warn_missing(
        frame,
        threshold_cols1
            .iter()
            .chain(threshold_cols2.iter())
            .copied(),
    );
    debug!(
        target_col,
        "target column is not referenced by pairwise conditions"
    );

    let mut conditions = ConditionSet::new();
    let mut seen_pairs: HashSet<(&str, &str)> = HashSet::new();

    for (&col1, &col2) in threshold_cols1
        .iter()
        .cartesian_product(threshold_cols2.iter())
    {
        if col1 == col2
            || seen_pairs.contains(&(col1, col2))
            || seen_pairs.contains(&(col2, col1))
        {
            continue;
        }
        seen_pairs.insert((col1, col2));
        for operator in ComparisonOperator::ALL {
            conditions.insert(Condition::new(col1, operator, col2));
        }
    }

    debug!(
        pairs = seen_pairs.len(),
        conditions = conditions.len(),
        "generated pairwise conditions"
    );
    conditions
}

fn warn_missing<'a>(frame: &DataFrame, columns: impl Iterator<Item = &'a str>) {
    let mut reported = HashSet::new();
    for column in columns {
        if !has_column(frame, column) && reported.insert(column) {
            warn!(
                column,
                "condition references a column missing from the dataset"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::row_at;

    fn sample() -> DataFrame {
        df!(
            "close" => &[10.0, 11.0, 12.0],
            "9ema" => &[10.0, 10.5, 12.5],
            "20ema" => &[9.0, 11.0, 13.0]
        )
        .unwrap()
    }

    #[test]
    fn target_conditions_are_three_per_column_in_order() {
        let frame = sample();
        let conditions = generate_conditions_target(&frame, &["close", "9ema"], "20ema");
        assert_eq!(conditions.len(), 6);
        let labels: Vec<&str> = conditions.labels().collect();
        assert_eq!(
            labels,
            vec![
                "close > 20ema",
                "close == 20ema",
                "close < 20ema",
                "9ema > 20ema",
                "9ema == 20ema",
                "9ema < 20ema",
            ]
        );
    }

    #[test]
    fn each_condition_keeps_its_own_columns() -> Result<()> {
        let frame = sample();
        let conditions = generate_conditions_target(&frame, &["close", "9ema"], "20ema");
        let row = row_at(&frame, 0)?;
        // close=10, 9ema=10, 20ema=9
        assert!(conditions.get("close > 20ema").unwrap().evaluate(&row)?);
        assert!(conditions.get("9ema > 20ema").unwrap().evaluate(&row)?);
        let row = row_at(&frame, 1)?;
        // close=11, 9ema=10.5, 20ema=11
        assert!(conditions.get("close == 20ema").unwrap().evaluate(&row)?);
        assert!(conditions.get("9ema < 20ema").unwrap().evaluate(&row)?);
        assert!(!conditions.get("9ema == 20ema").unwrap().evaluate(&row)?);
        Ok(())
    }

    #[test]
    fn duplicate_threshold_columns_collapse_into_one_entry() {
        let frame = sample();
        let conditions = generate_conditions_target(&frame, &["close", "close"], "20ema");
        assert_eq!(conditions.len(), 3);
    }

    #[test]
    fn pairwise_skips_self_pairs_and_reversed_pairs() {
        let frame = sample();
        let conditions = generate_conditions_threshold(
            &frame,
            &["close", "9ema"],
            &["9ema", "close", "20ema"],
            "unused",
        );
        let labels: Vec<&str> = conditions.labels().collect();
        assert_eq!(
            labels,
            vec![
                "close > 9ema",
                "close == 9ema",
                "close < 9ema",
                "close > 20ema",
                "close == 20ema",
                "close < 20ema",
                "9ema > 20ema",
                "9ema == 20ema",
                "9ema < 20ema",
            ]
        );
        assert!(!conditions.contains("9ema > close"));
    }

    #[test]
    fn pairwise_conditions_ignore_the_target_column() {
        let frame = sample();
        let conditions = generate_conditions_threshold(&frame, &["close"], &["9ema"], "20ema");
        for (_, condition) in conditions.iter() {
            assert_ne!(condition.left, "20ema");
            assert_ne!(condition.right, "20ema");
        }
    }

    #[test]
    fn disjoint_lists_yield_three_conditions_per_pair() {
        let frame = sample();
        let conditions =
            generate_conditions_threshold(&frame, &["a", "b"], &["c", "d", "e"], "close");
        assert_eq!(conditions.len(), 2 * 3 * 3);
    }

    #[test]
    fn generation_is_lazy_about_missing_columns() {
        let frame = sample();
        let conditions = generate_conditions_target(&frame, &["missing"], "close");
        assert_eq!(conditions.len(), 3);
        let row = row_at(&frame, 0).unwrap();
        let err = conditions
            .get("missing > close")
            .unwrap()
            .evaluate(&row)
            .unwrap_err();
        assert!(err.to_string().contains("missing"));
        assert!(conditions.masks(&frame).is_err());
    }

    #[test]
    fn masks_follow_insertion_order() -> Result<()> {
        let frame = sample();
        let conditions = generate_conditions_target(&frame, &["close"], "9ema");
        let masks = conditions.masks(&frame)?;
        assert_eq!(masks[0], ("close > 9ema".to_string(), vec![false, true, false]));
        assert_eq!(masks[1], ("close == 9ema".to_string(), vec![true, false, false]));
        assert_eq!(masks[2], ("close < 9ema".to_string(), vec![false, false, true]));
        Ok(())
    }

    #[test]
    fn nan_never_satisfies_a_condition() {
        let mut row = Row::new();
        row.insert("a".into(), f64::NAN);
        row.insert("b".into(), 1.0);
        for operator in ComparisonOperator::ALL {
            assert!(!Condition::new("a", operator, "b").evaluate(&row).unwrap());
        }
    }
}
