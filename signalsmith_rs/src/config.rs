use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::crossover::CrossDirection;

fn default_direction() -> CrossDirection {
    CrossDirection::Above
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrossoverConfig {
    pub left: String,
    pub right: String,
    #[serde(default = "default_direction")]
    pub direction: CrossDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BandConfig {
    pub column: String,
    /// Span of the exponential smoothing.
    pub window: usize,
    /// Extra `_{suffix}` segment for the generated column names.
    #[serde(default)]
    pub suffix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackConfig {
    pub total_signals: usize,
    /// Restrict stacking to these columns; all columns when empty.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Seed for reproducible sampling. Entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl StackConfig {
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ConditionConfig {
    /// Every column against a single target column.
    Target {
        columns: Vec<String>,
        target: String,
    },
    /// Every unique unordered pair across two column lists.
    Pairwise {
        columns: Vec<String>,
        against: Vec<String>,
        #[serde(default)]
        target: Option<String>,
    },
}
