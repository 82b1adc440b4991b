//! Balancing runs against the store: gather inputs, validate, search, then replace slots.
//!
//! All validation happens before anything is written; the only write is one
//! `replace_assignments` call.

use crate::config::BalancerSettings;
use crate::logic::performance::{self, IndexSource, PerformanceOutcome};
use crate::logic::rating::{self, RatingOutcome};
use crate::models::{
    number_slots, BalanceError, FixtureId, PerformanceWeights, PlayerId, PositionWeights,
    SlotAssignment, TeamSizes,
};
use crate::store::{FixtureProvider, RatingsProvider, SlotAssignmentWriter, WeightProvider, WriteOutcome};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Input for a performance balancing run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRequest {
    /// Defaults to the fixture's confirmed pool.
    #[serde(default)]
    pub player_ids: Option<Vec<PlayerId>>,
    /// Defaults to an even split.
    #[serde(default)]
    pub sizes: Option<TeamSizes>,
    /// Defaults to the stored weights, then 0.5/0.5.
    #[serde(default)]
    pub weights: Option<PerformanceWeights>,
    /// Reject the write if the fixture moved past this version.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Input for a rating balancing run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingRequest {
    /// Defaults to the fixture's target sizes.
    #[serde(default)]
    pub sizes: Option<TeamSizes>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// A committed balancing run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceRun<T> {
    pub fixture_id: FixtureId,
    /// Fixture version after the write.
    pub version: u64,
    pub assignments: Vec<SlotAssignment>,
    pub outcome: T,
}

fn check_pool(settings: &BalancerSettings, ids: &[PlayerId]) -> Result<(), BalanceError> {
    if !settings.pool_in_bounds(ids.len()) {
        return Err(BalanceError::PoolSizeOutOfRange {
            size: ids.len(),
            min: settings.min_pool_size,
            max: settings.max_pool_size,
        });
    }
    let mut seen = HashSet::with_capacity(ids.len());
    match ids.iter().find(|id| !seen.insert(**id)) {
        Some(&dup) => Err(BalanceError::DuplicatePlayer(dup)),
        None => Ok(()),
    }
}

fn check_sizes(sizes: TeamSizes, pool: usize) -> Result<(), BalanceError> {
    if sizes.total() != pool {
        return Err(BalanceError::TargetSizeMismatch {
            requested: sizes.total(),
            pool,
        });
    }
    Ok(())
}

fn commit<S: SlotAssignmentWriter>(
    store: &S,
    fixture_id: FixtureId,
    assignments: &[SlotAssignment],
    expected_version: Option<u64>,
) -> Result<u64, BalanceError> {
    match store.replace_assignments(fixture_id, assignments, true, expected_version)? {
        WriteOutcome::Committed { version } => Ok(version),
        WriteOutcome::Conflict { actual } => {
            let expected = expected_version.unwrap_or_default();
            log::warn!(
                "Fixture {} changed underneath balancing (expected v{}, found v{})",
                fixture_id,
                expected,
                actual
            );
            Err(BalanceError::VersionConflict { expected, actual })
        }
    }
}

fn resolve_performance_weights<S: WeightProvider>(
    store: &S,
    requested: Option<PerformanceWeights>,
) -> PerformanceWeights {
    if let Some(w) = requested {
        return w;
    }
    match store.performance_weights() {
        Ok(Some(w)) => w,
        Ok(None) => PerformanceWeights::default(),
        Err(e) => {
            log::warn!("Weight configuration unavailable ({}); using defaults", e);
            PerformanceWeights::default()
        }
    }
}

/// Balance a fixture on power rating and goal threat and replace its slot assignments.
pub fn balance_by_performance<S, I>(
    store: &S,
    settings: &BalancerSettings,
    fixture_id: FixtureId,
    request: &PerformanceRequest,
    source: &mut I,
) -> Result<BalanceRun<PerformanceOutcome>, BalanceError>
where
    S: FixtureProvider + RatingsProvider + WeightProvider + SlotAssignmentWriter,
    I: IndexSource,
{
    let fixture = store.fixture(fixture_id)?;
    let ids = request.player_ids.clone().unwrap_or(fixture.pool);
    check_pool(settings, &ids)?;
    let sizes = request.sizes.unwrap_or_else(|| TeamSizes::even_split(ids.len()));
    check_sizes(sizes, ids.len())?;

    let players = store.players(&ids)?;
    if let Some(&missing) = ids.iter().find(|id| !players.iter().any(|p| p.id == **id)) {
        return Err(BalanceError::PlayerNotFound(missing));
    }

    let weights = resolve_performance_weights(store, request.weights);
    if !weights.is_valid() {
        return Err(BalanceError::InvalidWeights);
    }

    let rated = performance::resolve_ratings(&players);
    let outcome = performance::optimize(&rated, sizes, weights, &settings.search, source)?;
    let assignments = number_slots(fixture_id, &outcome.team_a, &outcome.team_b);
    let version = commit(store, fixture_id, &assignments, request.expected_version)?;

    Ok(BalanceRun {
        fixture_id,
        version,
        assignments,
        outcome,
    })
}

/// Balance a fixture's confirmed pool by positional attributes and replace its slot assignments.
pub fn balance_by_rating<S>(
    store: &S,
    settings: &BalancerSettings,
    fixture_id: FixtureId,
    request: &RatingRequest,
) -> Result<BalanceRun<RatingOutcome>, BalanceError>
where
    S: FixtureProvider + RatingsProvider + WeightProvider + SlotAssignmentWriter,
{
    let fixture = store.fixture(fixture_id)?;
    let sizes = request.sizes.unwrap_or(fixture.sizes);
    let expected = sizes.total();

    let players = store.players(&fixture.pool)?;
    if players.len() != expected || fixture.pool.len() != expected {
        return Err(BalanceError::PlayerCountMismatch {
            expected,
            loaded: players.len(),
        });
    }
    check_pool(settings, &fixture.pool)?;

    let weights = store.position_weights()?.unwrap_or_else(PositionWeights::default);
    let template_size = sizes.larger();
    let template = store
        .size_template(template_size)?
        .ok_or(BalanceError::TemplateNotFound(template_size))?;

    let outcome = rating::balance(&players, sizes, &template, &weights)?;
    let assignments = number_slots(fixture_id, &outcome.team_a.ordered(), &outcome.team_b.ordered());
    let version = commit(store, fixture_id, &assignments, request.expected_version)?;

    Ok(BalanceRun {
        fixture_id,
        version,
        assignments,
        outcome,
    })
}
