//! Performance balancer: splits a pool on power rating and goal threat by stochastic
//! hill-climbing over a range-normalized, weighted loss.
//!
//! 1. Resolve ratings, substituting defaults for players without trusted figures.
//! 2. Seed: snake draft for even sizes, greedy fill for uneven ones.
//! 3. Swap one random player from each side; keep the swap only if the loss strictly drops.
//! 4. Sort each team by ascending goal threat.

use crate::config::SearchSettings;
use crate::logic::scoring::{balance_percentage, mean, metric_range};
use crate::models::{BalanceError, PerformanceWeights, Player, PlayerId, TeamSizes};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Power rating used for players without a trusted figure.
pub const DEFAULT_POWER_RATING: f64 = 5.35;

/// Goal threat used when no qualified regular player has one.
pub const FALLBACK_GOAL_THREAT: f64 = 0.5;

const POWER_GAP_FLOOR: f64 = 0.1;
const GOAL_GAP_FLOOR: f64 = 0.01;

/// Source of uniform indices for picking swap candidates.
pub trait IndexSource {
    /// Uniform index in `0..len`; `len` is never zero.
    fn index(&mut self, len: usize) -> usize;
}

/// Adapts any `rand` generator.
#[derive(Debug)]
pub struct RandomIndex<R>(pub R);

impl<R: Rng> IndexSource for RandomIndex<R> {
    fn index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }
}

/// Replays a fixed sequence of indices (wrapping, each reduced modulo `len`).
#[derive(Clone, Debug)]
pub struct ScriptedIndex {
    values: Vec<usize>,
    pos: usize,
}

impl ScriptedIndex {
    pub fn new(values: Vec<usize>) -> Self {
        Self { values, pos: 0 }
    }
}

impl IndexSource for ScriptedIndex {
    fn index(&mut self, len: usize) -> usize {
        if self.values.is_empty() {
            return 0;
        }
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v % len
    }
}

/// A pool member with the figures the optimizer actually uses.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatedPlayer {
    pub id: PlayerId,
    pub power: f64,
    pub goal_threat: f64,
    /// True when either figure is a substituted default.
    pub substituted: bool,
}

/// Resolve the figures for every player in the pool.
///
/// Untrusted players (unqualified, or missing a figure) get [`DEFAULT_POWER_RATING`] and the
/// mean goal threat of the qualified, non-guest players in this same pool.
pub fn resolve_ratings(players: &[Player]) -> Vec<RatedPlayer> {
    let league_goal_threat = mean(
        players
            .iter()
            .filter(|p| p.performance.qualified && !p.performance.guest)
            .filter_map(|p| p.performance.goal_threat)
            .filter(|g| g.is_finite()),
    )
    .unwrap_or(FALLBACK_GOAL_THREAT);

    players
        .iter()
        .map(|p| {
            let trusted = |v: Option<f64>| v.filter(|x| p.performance.qualified && x.is_finite());
            let power = trusted(p.performance.power_rating);
            let goal_threat = trusted(p.performance.goal_threat);
            let substituted = power.is_none() || goal_threat.is_none();
            if substituted {
                log::debug!("Using default ratings for player {}", p.id);
            }
            RatedPlayer {
                id: p.id,
                power: power.unwrap_or(DEFAULT_POWER_RATING),
                goal_threat: goal_threat.unwrap_or(league_goal_threat),
                substituted,
            }
        })
        .collect()
}

/// Per-candidate loss and its raw ingredients.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LossBreakdown {
    /// Unfloored absolute gap in summed power rating.
    pub power_gap: f64,
    /// Unfloored absolute gap in summed goal threat.
    pub goal_gap: f64,
    pub combined: f64,
}

/// Loss function bound to one pool's metric ranges and weights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LossModel {
    power_range: f64,
    goal_range: f64,
    weights: PerformanceWeights,
}

impl LossModel {
    pub fn new(pool: &[RatedPlayer], weights: PerformanceWeights) -> Self {
        Self {
            power_range: metric_range(pool.iter().map(|p| p.power)),
            goal_range: metric_range(pool.iter().map(|p| p.goal_threat)),
            weights,
        }
    }

    pub fn evaluate(&self, team_a: &[RatedPlayer], team_b: &[RatedPlayer]) -> LossBreakdown {
        let sum = |team: &[RatedPlayer], f: fn(&RatedPlayer) -> f64| team.iter().map(f).sum::<f64>();
        let power_gap = (sum(team_a, |p| p.power) - sum(team_b, |p| p.power)).abs();
        let goal_gap = (sum(team_a, |p| p.goal_threat) - sum(team_b, |p| p.goal_threat)).abs();
        let normalized_power = power_gap.max(POWER_GAP_FLOOR) / self.power_range;
        let normalized_goal = goal_gap.max(GOAL_GAP_FLOOR) / self.goal_range;
        LossBreakdown {
            power_gap,
            goal_gap,
            combined: self.weights.power_weight * normalized_power
                + self.weights.goal_weight * normalized_goal,
        }
    }
}

/// Initial partition, strongest players first.
///
/// Even sizes use a snake over groups of four (ranks 1 and 4 to A, 2 and 3 to B); uneven sizes
/// fill side A first.
pub fn seed_teams(pool: &[RatedPlayer], sizes: TeamSizes) -> (Vec<RatedPlayer>, Vec<RatedPlayer>) {
    let mut ranked = pool.to_vec();
    ranked.sort_by(|a, b| b.power.total_cmp(&a.power));

    let mut team_a = Vec::with_capacity(sizes.a);
    let mut team_b = Vec::with_capacity(sizes.b);
    if sizes.is_even() {
        for (rank, p) in ranked.into_iter().enumerate() {
            if matches!(rank % 4, 0 | 3) {
                team_a.push(p);
            } else {
                team_b.push(p);
            }
        }
    } else {
        for p in ranked {
            if team_a.len() < sizes.a || team_b.len() >= sizes.b {
                team_a.push(p);
            } else {
                team_b.push(p);
            }
        }
    }
    (team_a, team_b)
}

/// Result of one performance balancing run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceOutcome {
    /// Ascending goal threat, so the biggest threat takes the last slot.
    pub team_a: Vec<PlayerId>,
    pub team_b: Vec<PlayerId>,
    /// 0..=100, 100 being a perfect balance.
    pub balance_percentage: f64,
    pub power_gap: f64,
    pub goal_gap: f64,
    pub combined_loss: f64,
    pub main_iterations: usize,
    pub rescue_iterations: usize,
    /// Loss after every accepted swap, strictly decreasing.
    pub accepted_losses: Vec<f64>,
}

struct Climb<'a, I: IndexSource> {
    model: &'a LossModel,
    source: &'a mut I,
    team_a: Vec<RatedPlayer>,
    team_b: Vec<RatedPlayer>,
    loss: f64,
    accepted: Vec<f64>,
}

impl<I: IndexSource> Climb<'_, I> {
    /// Try one random swap; keep it only if the loss strictly decreases.
    fn step(&mut self) -> bool {
        let i = self.source.index(self.team_a.len());
        let j = self.source.index(self.team_b.len());
        std::mem::swap(&mut self.team_a[i], &mut self.team_b[j]);
        let candidate = self.model.evaluate(&self.team_a, &self.team_b).combined;
        if candidate < self.loss {
            log::trace!("Accepted swap {}<->{}: loss {:.4} -> {:.4}", i, j, self.loss, candidate);
            self.loss = candidate;
            self.accepted.push(candidate);
            true
        } else {
            std::mem::swap(&mut self.team_a[i], &mut self.team_b[j]);
            false
        }
    }
}

/// Split `pool` into two teams of `sizes`, minimizing the combined loss.
///
/// Pure function of its inputs plus the index source; weight resolution and persistence
/// happen in the caller.
pub fn optimize<I: IndexSource>(
    pool: &[RatedPlayer],
    sizes: TeamSizes,
    weights: PerformanceWeights,
    settings: &SearchSettings,
    source: &mut I,
) -> Result<PerformanceOutcome, BalanceError> {
    if sizes.total() != pool.len() {
        return Err(BalanceError::TargetSizeMismatch {
            requested: sizes.total(),
            pool: pool.len(),
        });
    }
    if !weights.is_valid() {
        return Err(BalanceError::InvalidWeights);
    }

    let model = LossModel::new(pool, weights);
    let (team_a, team_b) = seed_teams(pool, sizes);
    let seed_loss = model.evaluate(&team_a, &team_b).combined;
    log::debug!("Seeded {}v{} split with loss {:.4}", sizes.a, sizes.b, seed_loss);

    let mut climb = Climb {
        model: &model,
        source,
        team_a,
        team_b,
        loss: seed_loss,
        accepted: Vec::new(),
    };
    let mut main_iterations = 0;
    let mut rescue_iterations = 0;

    if !climb.team_a.is_empty() && !climb.team_b.is_empty() {
        let mut stalled = 0;
        while main_iterations < settings.max_iterations
            && stalled < settings.stall_limit
            && climb.loss >= settings.target_loss
        {
            main_iterations += 1;
            if climb.step() {
                stalled = 0;
            } else {
                stalled += 1;
            }
        }

        if climb.loss > settings.target_loss * settings.rescue_factor {
            log::debug!(
                "Loss {:.4} still above {:.4} after {} iterations; trying rescue phase",
                climb.loss,
                settings.target_loss * settings.rescue_factor,
                main_iterations
            );
            while rescue_iterations < settings.rescue_iterations && climb.loss >= settings.target_loss {
                rescue_iterations += 1;
                climb.step();
            }
        }
    }

    let Climb {
        mut team_a,
        mut team_b,
        accepted,
        ..
    } = climb;
    let final_loss = model.evaluate(&team_a, &team_b);
    team_a.sort_by(|x, y| x.goal_threat.total_cmp(&y.goal_threat));
    team_b.sort_by(|x, y| x.goal_threat.total_cmp(&y.goal_threat));

    log::info!(
        "Performance balance {}v{}: loss {:.4} -> {:.4} ({} accepted swaps, {}+{} iterations)",
        team_a.len(),
        team_b.len(),
        seed_loss,
        final_loss.combined,
        accepted.len(),
        main_iterations,
        rescue_iterations
    );

    Ok(PerformanceOutcome {
        team_a: team_a.iter().map(|p| p.id).collect(),
        team_b: team_b.iter().map(|p| p.id).collect(),
        balance_percentage: balance_percentage(final_loss.combined),
        power_gap: final_loss.power_gap,
        goal_gap: final_loss.goal_gap,
        combined_loss: final_loss.combined,
        main_iterations,
        rescue_iterations,
        accepted_losses: accepted,
    })
}
