//! Collaborators the engine reads from and writes through.
//!
//! The balancers only see these traits; [`InMemoryStore`] implements all of them for the web
//! binary and the tests.

mod memory;

pub use memory::InMemoryStore;

use crate::models::{
    BalanceError, Fixture, FixtureId, PerformanceWeights, Player, PlayerId, PositionWeights,
    SlotAssignment, TeamSizeTemplate,
};

/// Player attributes and aggregated performance figures.
pub trait RatingsProvider {
    /// Players for the given ids, in request order. Unknown ids are skipped.
    fn players(&self, ids: &[PlayerId]) -> Result<Vec<Player>, BalanceError>;
}

/// Stored weight configuration. `None` means nothing configured.
pub trait WeightProvider {
    fn performance_weights(&self) -> Result<Option<PerformanceWeights>, BalanceError>;
    fn position_weights(&self) -> Result<Option<PositionWeights>, BalanceError>;
}

/// Fixtures and team-size templates.
pub trait FixtureProvider {
    fn fixture(&self, id: FixtureId) -> Result<Fixture, BalanceError>;
    fn size_template(&self, size: usize) -> Result<Option<TeamSizeTemplate>, BalanceError>;
}

/// Result of a slot replacement.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteOutcome {
    /// New assignments visible; fixture now at `version`.
    Committed { version: u64 },
    /// Stored version differed from the expected one; nothing was written.
    Conflict { actual: u64 },
}

/// Transactional replacement of a fixture's slot assignments.
pub trait SlotAssignmentWriter {
    /// Atomically delete all assignments for the fixture, insert `assignments`, set the balanced
    /// flag and bump the version. With `expected_version` the write only happens if the stored
    /// version still matches.
    fn replace_assignments(
        &self,
        fixture_id: FixtureId,
        assignments: &[SlotAssignment],
        balanced: bool,
        expected_version: Option<u64>,
    ) -> Result<WriteOutcome, BalanceError>;
}
