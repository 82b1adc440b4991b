//! Player, positional attributes and upstream performance figures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player (used in pools, assignments and lookups).
pub type PlayerId = Uuid;

/// One of the six positional attributes rated for every player.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    GoalScoring,
    Teamwork,
    Stamina,
    Control,
    Resilience,
    Defending,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::GoalScoring,
        Attribute::Teamwork,
        Attribute::Stamina,
        Attribute::Control,
        Attribute::Resilience,
        Attribute::Defending,
    ];
}

/// Raw positional ratings, as entered by staff.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerAttributes {
    pub goal_scoring: f64,
    pub teamwork: f64,
    /// Stamina and pace.
    pub stamina: f64,
    pub control: f64,
    pub resilience: f64,
    pub defending: f64,
}

impl PlayerAttributes {
    pub fn get(&self, attribute: Attribute) -> f64 {
        match attribute {
            Attribute::GoalScoring => self.goal_scoring,
            Attribute::Teamwork => self.teamwork,
            Attribute::Stamina => self.stamina,
            Attribute::Control => self.control,
            Attribute::Resilience => self.resilience,
            Attribute::Defending => self.defending,
        }
    }
}

/// Aggregated match-performance figures fed from the upstream rating process.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRating {
    /// Enough sample history for the figures to be trusted.
    pub qualified: bool,
    /// Guest / non-standard player; excluded from league averages.
    pub guest: bool,
    pub power_rating: Option<f64>,
    pub goal_threat: Option<f64>,
}

/// A rostered player. Read-only to the balancing engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub attributes: PlayerAttributes,
    pub performance: PerformanceRating,
}

impl Player {
    /// Create a new player with the given name. Ratings start at zero, unqualified.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            attributes: PlayerAttributes::default(),
            performance: PerformanceRating::default(),
        }
    }

    pub fn with_attributes(mut self, attributes: PlayerAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Mark the player qualified with the given power rating and goal threat.
    pub fn with_rating(mut self, power_rating: f64, goal_threat: f64) -> Self {
        self.performance.qualified = true;
        self.performance.power_rating = Some(power_rating);
        self.performance.goal_threat = Some(goal_threat);
        self
    }

    pub fn as_guest(mut self) -> Self {
        self.performance.guest = true;
        self
    }
}
