//! End-to-end balancing runs against the in-memory store.

use league_balancer_web::logic::performance::{optimize, resolve_ratings};
use league_balancer_web::{
    balance_by_performance, balance_by_rating, Attribute, BalanceError, BalanceRun, BalancerSettings,
    ErrorKind, Fixture, FixtureProvider, InMemoryStore, PerformanceRequest, PerformanceWeights,
    Player, PlayerAttributes, PlayerId, PositionGroup, PositionWeights, RandomIndex,
    RatingOutcome, RatingRequest, RatingsProvider, Side, SlotAssignment, TeamSizes,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

fn player(i: usize) -> Player {
    let f = i as f64;
    Player::new(format!("P{i}"))
        .with_attributes(PlayerAttributes {
            goal_scoring: ((i * 7) % 10) as f64,
            teamwork: 3.0 + f % 4.0,
            stamina: 4.0 + (f * 2.0) % 5.0,
            control: 2.0 + f % 6.0,
            resilience: 5.0 + f % 3.0,
            defending: ((i * 3) % 10) as f64,
        })
        .with_rating(4.0 + f * 0.4, 0.2 + (f * 0.37) % 1.5)
}

fn setup(n: usize, sizes: TeamSizes) -> (InMemoryStore, Fixture) {
    let store = InMemoryStore::new();
    let ids: Vec<PlayerId> = (0..n).map(|i| store.add_player(player(i)).unwrap()).collect();
    let fixture = store.create_fixture(sizes, None).unwrap();
    let fixture = store.set_pool(fixture.id, ids).unwrap();
    (store, fixture)
}

fn rng(seed: u64) -> RandomIndex<StdRng> {
    RandomIndex(StdRng::seed_from_u64(seed))
}

fn assert_slots_contiguous(rows: &[SlotAssignment], side: Side, expected: usize) {
    let mut slots: Vec<u32> = rows.iter().filter(|r| r.side == side).map(|r| r.slot).collect();
    slots.sort_unstable();
    assert_eq!(slots, (1..=expected as u32).collect::<Vec<_>>());
}

#[test]
fn performance_run_persists_full_partition() {
    let (store, fixture) = setup(10, TeamSizes::new(5, 5));
    let settings = BalancerSettings::default();
    let run = balance_by_performance(
        &store,
        &settings,
        fixture.id,
        &PerformanceRequest::default(),
        &mut rng(1),
    )
    .unwrap();

    let rows = store.assignments(fixture.id).unwrap();
    assert_eq!(rows.len(), 10);
    assert_slots_contiguous(&rows, Side::A, 5);
    assert_slots_contiguous(&rows, Side::B, 5);

    let assigned: HashSet<_> = rows.iter().map(|r| r.player_id).collect();
    let pool: HashSet<_> = fixture.pool.iter().copied().collect();
    assert_eq!(assigned, pool);

    // Slot order follows the returned team order.
    let side_a: Vec<PlayerId> = rows.iter().filter(|r| r.side == Side::A).map(|r| r.player_id).collect();
    assert_eq!(side_a, run.outcome.team_a);

    let stored = store.fixture(fixture.id).unwrap();
    assert!(stored.balanced);
    assert_eq!(stored.version, run.version);
    assert!((0.0..=100.0).contains(&run.outcome.balance_percentage));
}

#[test]
fn performance_run_honours_uneven_request() {
    let (store, fixture) = setup(9, TeamSizes::new(5, 4));
    let request = PerformanceRequest {
        sizes: Some(TeamSizes::new(5, 4)),
        ..PerformanceRequest::default()
    };
    let run = balance_by_performance(&store, &BalancerSettings::default(), fixture.id, &request, &mut rng(2))
        .unwrap();
    assert_eq!(run.outcome.team_a.len(), 5);
    assert_eq!(run.outcome.team_b.len(), 4);
}

#[test]
fn rerunning_replaces_rather_than_accumulates() {
    let (store, fixture) = setup(10, TeamSizes::new(5, 5));
    let settings = BalancerSettings::default();
    balance_by_performance(&store, &settings, fixture.id, &PerformanceRequest::default(), &mut rng(3)).unwrap();
    balance_by_performance(&store, &settings, fixture.id, &PerformanceRequest::default(), &mut rng(4)).unwrap();
    assert_eq!(store.assignments(fixture.id).unwrap().len(), 10);

    balance_by_rating(&store, &settings, fixture.id, &RatingRequest::default()).unwrap();
    balance_by_rating(&store, &settings, fixture.id, &RatingRequest::default()).unwrap();
    assert_eq!(store.assignments(fixture.id).unwrap().len(), 10);
}

#[test]
fn stale_version_gets_conflict() {
    let (store, fixture) = setup(10, TeamSizes::new(5, 5));
    let settings = BalancerSettings::default();
    let version = fixture.version;
    let request = PerformanceRequest {
        expected_version: Some(version),
        ..PerformanceRequest::default()
    };

    let first = balance_by_performance(&store, &settings, fixture.id, &request, &mut rng(5)).unwrap();
    assert_eq!(first.version, version + 1);
    let rows_after_first = store.assignments(fixture.id).unwrap();

    let err = balance_by_rating(
        &store,
        &settings,
        fixture.id,
        &RatingRequest {
            sizes: None,
            expected_version: Some(version),
        },
    )
    .unwrap_err();
    assert_eq!(
        err,
        BalanceError::VersionConflict {
            expected: version,
            actual: version + 1
        }
    );
    assert!(err.is_retryable());
    assert_eq!(store.assignments(fixture.id).unwrap(), rows_after_first);

    // Retrying with the fresh version succeeds.
    let retry = balance_by_rating(
        &store,
        &settings,
        fixture.id,
        &RatingRequest {
            sizes: None,
            expected_version: Some(first.version),
        },
    )
    .unwrap();
    assert_eq!(retry.version, first.version + 1);
}

#[test]
fn pool_size_bounds_are_enforced_before_writing() {
    let (store, fixture) = setup(6, TeamSizes::new(3, 3));
    let err = balance_by_performance(
        &store,
        &BalancerSettings::default(),
        fixture.id,
        &PerformanceRequest::default(),
        &mut rng(6),
    )
    .unwrap_err();
    assert_eq!(err, BalanceError::PoolSizeOutOfRange { size: 6, min: 8, max: 18 });
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(store.assignments(fixture.id).unwrap().is_empty());
    assert!(!store.fixture(fixture.id).unwrap().balanced);
}

#[test]
fn mismatched_sizes_are_rejected() {
    let (store, fixture) = setup(10, TeamSizes::new(5, 5));
    let request = PerformanceRequest {
        sizes: Some(TeamSizes::new(6, 5)),
        ..PerformanceRequest::default()
    };
    let err = balance_by_performance(&store, &BalancerSettings::default(), fixture.id, &request, &mut rng(7))
        .unwrap_err();
    assert_eq!(err, BalanceError::TargetSizeMismatch { requested: 11, pool: 10 });
}

#[test]
fn unknown_player_in_request_is_missing_reference() {
    let (store, fixture) = setup(10, TeamSizes::new(5, 5));
    let stranger = PlayerId::new_v4();
    let mut ids = fixture.pool.clone();
    ids[4] = stranger;
    let request = PerformanceRequest {
        player_ids: Some(ids),
        ..PerformanceRequest::default()
    };
    let err = balance_by_performance(&store, &BalancerSettings::default(), fixture.id, &request, &mut rng(8))
        .unwrap_err();
    assert_eq!(err, BalanceError::PlayerNotFound(stranger));
    assert_eq!(err.kind(), ErrorKind::MissingReference);
}

#[test]
fn invalid_weight_override_is_rejected() {
    let (store, fixture) = setup(10, TeamSizes::new(5, 5));
    let request = PerformanceRequest {
        weights: Some(PerformanceWeights::new(f64::NAN, 0.5)),
        ..PerformanceRequest::default()
    };
    let err = balance_by_performance(&store, &BalancerSettings::default(), fixture.id, &request, &mut rng(9))
        .unwrap_err();
    assert_eq!(err, BalanceError::InvalidWeights);
}

#[test]
fn rating_run_slots_defense_first() {
    let (store, fixture) = setup(10, TeamSizes::new(5, 5));
    let run = balance_by_rating(&store, &BalancerSettings::default(), fixture.id, &RatingRequest::default())
        .unwrap();

    let rows = store.assignments(fixture.id).unwrap();
    assert_slots_contiguous(&rows, Side::A, 5);
    assert_slots_contiguous(&rows, Side::B, 5);

    let side_b: Vec<PlayerId> = rows.iter().filter(|r| r.side == Side::B).map(|r| r.player_id).collect();
    assert_eq!(side_b, run.outcome.team_b.ordered());
    assert_eq!(run.outcome.team_b.defenders.len(), 2);
    assert_eq!(run.outcome.combinations_evaluated, 72);
}

#[test]
fn rating_run_is_deterministic() {
    let (store, fixture) = setup(10, TeamSizes::new(5, 5));
    let settings = BalancerSettings::default();
    let first = balance_by_rating(&store, &settings, fixture.id, &RatingRequest::default()).unwrap();
    let second = balance_by_rating(&store, &settings, fixture.id, &RatingRequest::default()).unwrap();
    assert_eq!(first.assignments, second.assignments);
}

#[test]
fn rating_run_requires_full_pool() {
    let store = InMemoryStore::new();
    let ids: Vec<PlayerId> = (0..9).map(|i| store.add_player(player(i)).unwrap()).collect();
    let fixture = store.create_fixture(TeamSizes::new(5, 5), None).unwrap();
    store.set_pool(fixture.id, ids).unwrap();

    let err = balance_by_rating(&store, &BalancerSettings::default(), fixture.id, &RatingRequest::default())
        .unwrap_err();
    assert_eq!(err, BalanceError::PlayerCountMismatch { expected: 10, loaded: 9 });
}

#[test]
fn rating_run_needs_a_template() {
    let store = InMemoryStore::without_templates();
    let ids: Vec<PlayerId> = (0..10).map(|i| store.add_player(player(i)).unwrap()).collect();
    let fixture = store.create_fixture(TeamSizes::new(5, 5), None).unwrap();
    store.set_pool(fixture.id, ids).unwrap();

    let err = balance_by_rating(&store, &BalancerSettings::default(), fixture.id, &RatingRequest::default())
        .unwrap_err();
    assert_eq!(err, BalanceError::TemplateNotFound(5));
    assert!(!store.fixture(fixture.id).unwrap().balanced);
}

#[test]
fn missing_fixture_is_reported() {
    let store = InMemoryStore::new();
    let id = PlayerId::new_v4();
    let err = balance_by_rating(&store, &BalancerSettings::default(), id, &RatingRequest::default())
        .unwrap_err();
    assert_eq!(err, BalanceError::FixtureNotFound(id));
}

#[test]
fn settings_from_lookup() {
    let settings = BalancerSettings::from_lookup(|key| match key {
        "BALANCER_MIN_POOL" => Some("6".to_string()),
        "BALANCER_MAX_ITERATIONS" => Some("not-a-number".to_string()),
        "BALANCER_TARGET_LOSS" => Some("0.25".to_string()),
        _ => None,
    });
    assert_eq!(settings.min_pool_size, 6);
    assert_eq!(settings.max_pool_size, 18);
    assert_eq!(settings.search.max_iterations, 3000);
    assert_eq!(settings.search.target_loss, 0.25);
    assert!(settings.pool_in_bounds(6));
    assert!(!settings.pool_in_bounds(19));
}

#[test]
fn max_pool_setting_is_capped_at_searchable_size() {
    let settings = BalancerSettings::from_lookup(|key| match key {
        "BALANCER_MAX_POOL" => Some("200".to_string()),
        _ => None,
    });
    assert_eq!(settings.max_pool_size, 63);
    assert!(settings.pool_in_bounds(63));
    assert!(!settings.pool_in_bounds(64));
}

#[test]
fn stored_performance_weights_apply_when_request_has_none() {
    let (store, fixture) = setup(10, TeamSizes::new(5, 5));
    let settings = BalancerSettings::default();
    store.set_performance_weights(PerformanceWeights::new(1.0, 0.0)).unwrap();

    let run = balance_by_performance(&store, &settings, fixture.id, &PerformanceRequest::default(), &mut rng(21))
        .unwrap();

    let rated = resolve_ratings(&store.players(&fixture.pool).unwrap());
    let direct = optimize(
        &rated,
        TeamSizes::even_split(10),
        PerformanceWeights::new(1.0, 0.0),
        &settings.search,
        &mut rng(21),
    )
    .unwrap();
    assert_eq!(run.outcome, direct);

    // An explicit request still wins over the stored weights.
    let request = PerformanceRequest {
        weights: Some(PerformanceWeights::default()),
        ..PerformanceRequest::default()
    };
    let run = balance_by_performance(&store, &settings, fixture.id, &request, &mut rng(22)).unwrap();
    let direct = optimize(
        &rated,
        TeamSizes::even_split(10),
        PerformanceWeights::default(),
        &settings.search,
        &mut rng(22),
    )
    .unwrap();
    assert_eq!(run.outcome, direct);
}

/// Four defenders (defending 10, 9, 8, 7) whose stamina pulls against their defending,
/// two attackers and four identical midfielders.
fn stamina_split_squad() -> Vec<Player> {
    let base = |goal_scoring: f64, stamina: f64, defending: f64| PlayerAttributes {
        goal_scoring,
        teamwork: 5.0,
        stamina,
        control: 5.0,
        resilience: 5.0,
        defending,
    };
    let mut players = vec![
        Player::new("D10").with_attributes(base(0.0, 1.0, 10.0)),
        Player::new("D9").with_attributes(base(0.0, 9.0, 9.0)),
        Player::new("D8").with_attributes(base(0.0, 9.0, 8.0)),
        Player::new("D7").with_attributes(base(0.0, 1.0, 7.0)),
        Player::new("X10").with_attributes(base(10.0, 5.0, 1.0)),
        Player::new("X9").with_attributes(base(9.0, 5.0, 1.0)),
    ];
    players.extend((0..4).map(|i| Player::new(format!("M{i}")).with_attributes(base(1.0, 5.0, 1.0))));
    players
}

#[test]
fn stored_position_weights_change_the_rating_split() {
    let store = InMemoryStore::new();
    let ids: Vec<PlayerId> = stamina_split_squad()
        .into_iter()
        .map(|p| store.add_player(p).unwrap())
        .collect();
    let fixture = store.create_fixture(TeamSizes::new(5, 5), None).unwrap();
    store.set_pool(fixture.id, ids.clone()).unwrap();
    let settings = BalancerSettings::default();
    let (d10, d8, d7) = (ids[0], ids[2], ids[3]);
    let paired_with_d10 = |run: &BalanceRun<RatingOutcome>| {
        let a = &run.outcome.team_a.defenders;
        let b = &run.outcome.team_b.defenders;
        let unit = if a.contains(&d10) { a } else { b };
        assert_eq!(unit.len(), 2);
        unit.iter().copied().find(|id| *id != d10).unwrap()
    };

    // Default weights: {10, 8} vs {9, 7} balances defending and stamina together.
    let default_run = balance_by_rating(&store, &settings, fixture.id, &RatingRequest::default()).unwrap();
    assert_eq!(paired_with_d10(&default_run), d8);
    assert_eq!(default_run.outcome.balance_score, 2.0);

    // Ignoring stamina in defense makes {10, 7} vs {9, 8} the exact defending balance.
    let mut weights = PositionWeights::default();
    weights.set(PositionGroup::Defense, Attribute::Stamina, 0.0);
    store.set_position_weights(weights).unwrap();

    let weighted_run = balance_by_rating(&store, &settings, fixture.id, &RatingRequest::default()).unwrap();
    assert_eq!(paired_with_d10(&weighted_run), d7);
    assert_eq!(weighted_run.outcome.balance_score, 1.0);
}
