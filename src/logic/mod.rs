//! Team balancing engine: shared scoring, the two balancers, and store-backed runs.

pub mod combinations;
pub mod performance;
pub mod rating;
pub mod scoring;
mod service;

pub use performance::{IndexSource, PerformanceOutcome, RandomIndex, ScriptedIndex};
pub use rating::{RatingOutcome, TeamUnits};
pub use scoring::PlayerSuitability;
pub use service::{
    balance_by_performance, balance_by_rating, BalanceRun, PerformanceRequest, RatingRequest,
};
