pub mod bands;
pub mod combinator;
pub mod conditions;
pub mod config;
pub mod crossover;
pub mod frame;
pub mod stacking;

pub use bands::{BAND_MULTIPLIERS, calculate_bollingers};
pub use conditions::{
    ComparisonOperator, Condition, ConditionSet, generate_conditions_target,
    generate_conditions_threshold,
};
pub use config::{BandConfig, ConditionConfig, CrossoverConfig, StackConfig};
pub use crossover::{CrossDirection, crossed_above, crossed_below};
pub use frame::Row;
pub use stacking::stack_signals;
