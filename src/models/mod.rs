//! Data structures for the league: players, fixtures, weights, errors.

mod error;
mod fixture;
mod player;
mod roster;
mod weights;

pub use error::{BalanceError, ErrorKind};
pub use fixture::{number_slots, Fixture, FixtureId, FixturePatch, Side, SlotAssignment, TeamSizes};
pub use player::{Attribute, PerformanceRating, Player, PlayerAttributes, PlayerId};
pub use roster::import_players_csv;
pub use weights::{
    default_templates, PerformanceWeights, PositionCounts, PositionGroup, PositionWeights,
    TeamSizeTemplate,
};
