//! Experiment lifecycle, deterministic hash-based assignment, weighted
//! re-normalized splitting, and event tracking for A/B testing (spec §3,
//! §4.8).

mod abtest;
mod assignment;
mod experiment;
mod split;

pub use abtest::ABTest;
pub use assignment::{Assignment, EventRecord};
pub use experiment::{
    Experiment, ExperimentStatus, RuleTableEntry, SplittingAlgorithm, TargetingRule, Variant,
    ALLOCATION_TOLERANCE,
};
pub use split::{hash_fraction, is_admitted, pick_by_cumulative_walk, weighted_allocations};
