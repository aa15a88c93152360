//! Strategy-driven model selection: requirement filter → strategy scoring →
//! route cache (spec §4.5).

mod cache;
mod filter;
mod fingerprint;
mod router;
mod select;
mod strategy;

pub use cache::RouteCache;
pub use fingerprint::fingerprint;
pub use router::Router;
pub use strategy::RouterStrategy;
