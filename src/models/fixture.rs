//! Fixture (match), team sides, target sizes and slot assignments.

use crate::models::player::PlayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a fixture.
pub type FixtureId = Uuid;

/// Which of the two opposing teams a player is assigned to.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Side {
    #[default]
    A,
    B,
}

/// Requested team sizes for side A and side B (may differ).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TeamSizes {
    pub a: usize,
    pub b: usize,
}

impl TeamSizes {
    pub fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }

    /// Even split of `total` players; side A takes the extra player when `total` is odd.
    pub fn even_split(total: usize) -> Self {
        Self {
            a: total - total / 2,
            b: total / 2,
        }
    }

    pub fn total(&self) -> usize {
        self.a + self.b
    }

    pub fn is_even(&self) -> bool {
        self.a == self.b
    }

    pub fn larger(&self) -> usize {
        self.a.max(self.b)
    }
}

/// One assigned player: which team and which numbered slot within it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SlotAssignment {
    pub fixture_id: FixtureId,
    pub player_id: PlayerId,
    pub side: Side,
    /// 1-based, contiguous within a side.
    pub slot: u32,
}

/// Build slot assignments for two ordered team lists (1..=len per side).
pub fn number_slots(fixture_id: FixtureId, team_a: &[PlayerId], team_b: &[PlayerId]) -> Vec<SlotAssignment> {
    let side_a = team_a.iter().enumerate().map(|(i, &player_id)| SlotAssignment {
        fixture_id,
        player_id,
        side: Side::A,
        slot: i as u32 + 1,
    });
    let side_b = team_b.iter().enumerate().map(|(i, &player_id)| SlotAssignment {
        fixture_id,
        player_id,
        side: Side::B,
        slot: i as u32 + 1,
    });
    side_a.chain(side_b).collect()
}

/// A scheduled match between two teams drawn from one pool of players.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: FixtureId,
    /// Target team sizes.
    pub sizes: TeamSizes,
    /// Confirmed player pool for this fixture.
    pub pool: Vec<PlayerId>,
    pub balanced: bool,
    /// Optimistic-concurrency token, bumped on every balancing write.
    pub version: u64,
    pub kickoff: Option<DateTime<Utc>>,
    pub balanced_at: Option<DateTime<Utc>>,
}

impl Fixture {
    pub fn new(sizes: TeamSizes) -> Self {
        Self {
            id: Uuid::new_v4(),
            sizes,
            pool: Vec::new(),
            balanced: false,
            version: 0,
            kickoff: None,
            balanced_at: None,
        }
    }
}

/// Partial update applied by a version-checked write.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FixturePatch {
    pub balanced: Option<bool>,
}
