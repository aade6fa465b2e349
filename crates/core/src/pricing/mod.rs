//! Price intelligence primitives: seasonality, market context, and the
//! always-available heuristic pricer that every other pricer falls back to.

pub mod context;
pub mod heuristic;
pub mod season;

pub use context::{MarketContext, TrendProvider};
pub use heuristic::HeuristicPricer;
pub use season::{season_of, Season};
