//! League manager web app: library with models, the team balancing engine and storage.

pub mod config;
pub mod logic;
pub mod models;
pub mod store;

pub use config::{BalancerSettings, SearchSettings};
pub use logic::{
    balance_by_performance, balance_by_rating, BalanceRun, IndexSource, PerformanceOutcome,
    PerformanceRequest, PlayerSuitability, RandomIndex, RatingOutcome, RatingRequest,
    ScriptedIndex, TeamUnits,
};
pub use models::{
    default_templates, import_players_csv, number_slots, Attribute, BalanceError, ErrorKind,
    Fixture, FixtureId, FixturePatch, PerformanceRating, PerformanceWeights, Player,
    PlayerAttributes, PlayerId, PositionCounts, PositionGroup, PositionWeights, Side,
    SlotAssignment, TeamSizeTemplate, TeamSizes,
};
pub use store::{
    FixtureProvider, InMemoryStore, RatingsProvider, SlotAssignmentWriter, WeightProvider,
    WriteOutcome,
};
