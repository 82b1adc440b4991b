//! In-memory store: everything behind one RwLock so each write is all-or-nothing.

use crate::models::{
    default_templates, BalanceError, Fixture, FixtureId, FixturePatch, PerformanceWeights, Player,
    PlayerId, PositionWeights, SlotAssignment, TeamSizeTemplate, TeamSizes,
};
use crate::store::{FixtureProvider, RatingsProvider, SlotAssignmentWriter, WeightProvider, WriteOutcome};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct StoreState {
    players: HashMap<PlayerId, Player>,
    /// Insertion order for listing.
    player_order: Vec<PlayerId>,
    fixtures: HashMap<FixtureId, Fixture>,
    assignments: HashMap<FixtureId, Vec<SlotAssignment>>,
    performance_weights: Option<PerformanceWeights>,
    position_weights: Option<PositionWeights>,
    templates: HashMap<usize, TeamSizeTemplate>,
}

impl StoreState {
    /// Compare-and-swap on the fixture version. Returns rows affected (0 or 1).
    fn update_if_version(&mut self, id: FixtureId, expected: Option<u64>, patch: FixturePatch) -> usize {
        let fixture = match self.fixtures.get_mut(&id) {
            Some(f) => f,
            None => return 0,
        };
        if let Some(expected) = expected {
            if fixture.version != expected {
                return 0;
            }
        }
        if let Some(balanced) = patch.balanced {
            fixture.balanced = balanced;
            fixture.balanced_at = if balanced { Some(Utc::now()) } else { None };
        }
        fixture.version += 1;
        1
    }
}

/// Players, fixtures, slot assignments and settings for one league.
#[derive(Debug)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Empty store seeded with the built-in team-size templates.
    pub fn new() -> Self {
        let store = Self::without_templates();
        if let Ok(mut g) = store.state.write() {
            g.templates = default_templates().into_iter().map(|t| (t.size, t)).collect();
        }
        store
    }

    pub fn without_templates() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, BalanceError> {
        self.state.read().map_err(|_| BalanceError::StoreUnavailable)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, BalanceError> {
        self.state.write().map_err(|_| BalanceError::StoreUnavailable)
    }

    pub fn add_player(&self, player: Player) -> Result<PlayerId, BalanceError> {
        let mut g = self.write()?;
        let id = player.id;
        if g.players.insert(id, player).is_none() {
            g.player_order.push(id);
        }
        Ok(id)
    }

    pub fn list_players(&self) -> Result<Vec<Player>, BalanceError> {
        let g = self.read()?;
        Ok(g.player_order.iter().filter_map(|id| g.players.get(id).cloned()).collect())
    }

    pub fn create_fixture(
        &self,
        sizes: TeamSizes,
        kickoff: Option<DateTime<Utc>>,
    ) -> Result<Fixture, BalanceError> {
        let mut fixture = Fixture::new(sizes);
        fixture.kickoff = kickoff;
        let mut g = self.write()?;
        g.fixtures.insert(fixture.id, fixture.clone());
        Ok(fixture)
    }

    /// Set the fixture's confirmed pool. Ids must exist and be unique.
    ///
    /// Changing the pool invalidates any earlier balance and bumps the version.
    pub fn set_pool(&self, fixture_id: FixtureId, pool: Vec<PlayerId>) -> Result<Fixture, BalanceError> {
        let mut g = self.write()?;
        let mut seen = HashSet::new();
        for &id in &pool {
            if !g.players.contains_key(&id) {
                return Err(BalanceError::PlayerNotFound(id));
            }
            if !seen.insert(id) {
                return Err(BalanceError::DuplicatePlayer(id));
            }
        }
        let fixture = g
            .fixtures
            .get_mut(&fixture_id)
            .ok_or(BalanceError::FixtureNotFound(fixture_id))?;
        fixture.pool = pool;
        fixture.balanced = false;
        fixture.balanced_at = None;
        fixture.version += 1;
        let fixture = fixture.clone();
        g.assignments.remove(&fixture_id);
        Ok(fixture)
    }

    /// Current assignments for a fixture, side A first, then by slot.
    pub fn assignments(&self, fixture_id: FixtureId) -> Result<Vec<SlotAssignment>, BalanceError> {
        let g = self.read()?;
        if !g.fixtures.contains_key(&fixture_id) {
            return Err(BalanceError::FixtureNotFound(fixture_id));
        }
        let mut rows = g.assignments.get(&fixture_id).cloned().unwrap_or_default();
        rows.sort_by_key(|a| (a.side as u8, a.slot));
        Ok(rows)
    }

    pub fn set_performance_weights(&self, weights: PerformanceWeights) -> Result<(), BalanceError> {
        if !weights.is_valid() {
            return Err(BalanceError::InvalidWeights);
        }
        self.write()?.performance_weights = Some(weights);
        Ok(())
    }

    pub fn set_position_weights(&self, weights: PositionWeights) -> Result<(), BalanceError> {
        if !weights.is_valid() {
            return Err(BalanceError::InvalidWeights);
        }
        self.write()?.position_weights = Some(weights);
        Ok(())
    }

    /// Add or replace templates, keyed by nominal size.
    pub fn set_templates(&self, templates: Vec<TeamSizeTemplate>) -> Result<(), BalanceError> {
        let mut g = self.write()?;
        for t in templates {
            g.templates.insert(t.size, t);
        }
        Ok(())
    }

    /// Conditional fixture update: applies `patch` and bumps the version only if the stored
    /// version equals `expected`. Returns rows affected.
    pub fn update_if_version(
        &self,
        id: FixtureId,
        expected: u64,
        patch: FixturePatch,
    ) -> Result<usize, BalanceError> {
        Ok(self.write()?.update_if_version(id, Some(expected), patch))
    }
}

impl RatingsProvider for InMemoryStore {
    fn players(&self, ids: &[PlayerId]) -> Result<Vec<Player>, BalanceError> {
        let g = self.read()?;
        Ok(ids.iter().filter_map(|id| g.players.get(id).cloned()).collect())
    }
}

impl WeightProvider for InMemoryStore {
    fn performance_weights(&self) -> Result<Option<PerformanceWeights>, BalanceError> {
        Ok(self.read()?.performance_weights)
    }

    fn position_weights(&self) -> Result<Option<PositionWeights>, BalanceError> {
        Ok(self.read()?.position_weights.clone())
    }
}

impl FixtureProvider for InMemoryStore {
    fn fixture(&self, id: FixtureId) -> Result<Fixture, BalanceError> {
        self.read()?
            .fixtures
            .get(&id)
            .cloned()
            .ok_or(BalanceError::FixtureNotFound(id))
    }

    fn size_template(&self, size: usize) -> Result<Option<TeamSizeTemplate>, BalanceError> {
        Ok(self.read()?.templates.get(&size).copied())
    }
}

impl SlotAssignmentWriter for InMemoryStore {
    fn replace_assignments(
        &self,
        fixture_id: FixtureId,
        assignments: &[SlotAssignment],
        balanced: bool,
        expected_version: Option<u64>,
    ) -> Result<WriteOutcome, BalanceError> {
        let mut g = self.write()?;
        let actual = g
            .fixtures
            .get(&fixture_id)
            .map(|f| f.version)
            .ok_or(BalanceError::FixtureNotFound(fixture_id))?;
        let patch = FixturePatch {
            balanced: Some(balanced),
        };
        // Check the version before touching assignments so a conflict leaves everything as it was.
        if g.update_if_version(fixture_id, expected_version, patch) == 0 {
            return Ok(WriteOutcome::Conflict { actual });
        }
        g.assignments.insert(fixture_id, assignments.to_vec());
        Ok(WriteOutcome::Committed { version: actual + 1 })
    }
}
