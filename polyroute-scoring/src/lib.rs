//! Quality, cost, and load-balance scorers consumed by Router strategies
//! (spec §4.4). Every scorer here is a pure function of its inputs except
//! [`RoundRobin`], which intentionally carries a monotonic cursor.

mod cost;
mod load_balance;
mod quality;

pub use cost::score_cost;
pub use load_balance::{least_loaded, RoundRobin};
pub use quality::score_quality;
