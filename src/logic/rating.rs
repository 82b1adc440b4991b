//! Rating balancer: positional pools plus exhaustive search over team-A picks.
//!
//! Players are pooled destructively by raw attribute (best defenders, then best finishers,
//! the rest in midfield). Every way of picking side A's defenders, midfielders and attackers
//! is scored; side B always gets the complement within each pool.

use crate::logic::combinations::{binomial, mask_members, Combinations, MAX_MEMBERS};
use crate::logic::scoring::{unit_average, PlayerSuitability};
use crate::models::{
    Attribute, BalanceError, Player, PlayerAttributes, PlayerId, PositionCounts, PositionGroup,
    PositionWeights, TeamSizeTemplate, TeamSizes,
};
use serde::{Deserialize, Serialize};

/// Positional counts per side after scaling the template.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SplitPlan {
    pub team_a: PositionCounts,
    pub team_b: PositionCounts,
}

impl SplitPlan {
    pub fn new(template: &TeamSizeTemplate, sizes: TeamSizes) -> Self {
        Self {
            team_a: template.scaled(sizes.a),
            team_b: template.scaled(sizes.b),
        }
    }

    /// Players needed in a group's pool across both sides.
    pub fn pool_size(&self, group: PositionGroup) -> usize {
        self.team_a.get(group) + self.team_b.get(group)
    }
}

/// Three disjoint player pools.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionalPools {
    pub defenders: Vec<Player>,
    pub midfielders: Vec<Player>,
    pub attackers: Vec<Player>,
}

impl PositionalPools {
    pub fn get(&self, group: PositionGroup) -> &[Player] {
        match group {
            PositionGroup::Defense => &self.defenders,
            PositionGroup::Midfield => &self.midfielders,
            PositionGroup::Attack => &self.attackers,
        }
    }
}

/// Partition `players` into defender, attacker and midfielder pools.
///
/// Ties keep input order.
pub fn assemble_pools(players: &[Player], plan: &SplitPlan) -> PositionalPools {
    let mut remaining = players.to_vec();

    remaining.sort_by(|a, b| b.attributes.defending.total_cmp(&a.attributes.defending));
    let take = plan.pool_size(PositionGroup::Defense).min(remaining.len());
    let defenders: Vec<Player> = remaining.drain(..take).collect();

    remaining.sort_by(|a, b| b.attributes.goal_scoring.total_cmp(&a.attributes.goal_scoring));
    let take = plan.pool_size(PositionGroup::Attack).min(remaining.len());
    let attackers: Vec<Player> = remaining.drain(..take).collect();

    PositionalPools {
        defenders,
        midfielders: remaining,
        attackers,
    }
}

/// Side A's pick from each pool, as bitmasks over pool indices.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Selection {
    pub defenders: u64,
    pub midfielders: u64,
    pub attackers: u64,
}

impl Selection {
    pub fn get(&self, group: PositionGroup) -> u64 {
        match group {
            PositionGroup::Defense => self.defenders,
            PositionGroup::Midfield => self.midfielders,
            PositionGroup::Attack => self.attackers,
        }
    }
}

fn split_unit(pool: &[Player], mask: u64) -> (Vec<&PlayerAttributes>, Vec<&PlayerAttributes>) {
    let mut chosen = Vec::new();
    let mut rest = Vec::new();
    for (i, p) in pool.iter().enumerate() {
        if mask & (1u64 << i) != 0 {
            chosen.push(&p.attributes);
        } else {
            rest.push(&p.attributes);
        }
    }
    (chosen, rest)
}

/// Weighted sum over groups and attributes of |avg(side A unit) - avg(side B unit)|.
///
/// A group where either side's unit is empty contributes nothing.
pub fn balance_score(pools: &PositionalPools, selection: &Selection, weights: &PositionWeights) -> f64 {
    let mut score = 0.0;
    for group in PositionGroup::ALL {
        let (unit_a, unit_b) = split_unit(pools.get(group), selection.get(group));
        for attribute in Attribute::ALL {
            if let (Some(a), Some(b)) = (
                unit_average(&unit_a, attribute),
                unit_average(&unit_b, attribute),
            ) {
                score += (a - b).abs() * weights.weight(group, attribute);
            }
        }
    }
    score
}

/// Best selection found and how many candidates were scored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchResult {
    pub selection: Selection,
    pub score: f64,
    pub evaluated: u64,
}

/// Score every combination of side-A picks and keep the lowest (first one wins ties).
pub fn search_best_split(
    pools: &PositionalPools,
    plan: &SplitPlan,
    weights: &PositionWeights,
) -> Result<SearchResult, BalanceError> {
    if let Some(group) = PositionGroup::ALL
        .into_iter()
        .find(|&g| pools.get(g).len() > MAX_MEMBERS)
    {
        return Err(BalanceError::PositionPoolTooLarge {
            group,
            size: pools.get(group).len(),
            max: MAX_MEMBERS,
        });
    }
    let expected = PositionGroup::ALL
        .iter()
        .map(|&g| binomial(pools.get(g).len(), plan.team_a.get(g)))
        .fold(1u64, u64::saturating_mul);
    log::debug!(
        "Searching {} combinations ({}/{}/{} pooled)",
        expected,
        pools.defenders.len(),
        pools.midfielders.len(),
        pools.attackers.len()
    );

    let mut best: Option<(Selection, f64)> = None;
    let mut evaluated = 0u64;
    for defenders in Combinations::new(pools.defenders.len(), plan.team_a.defenders) {
        for midfielders in Combinations::new(pools.midfielders.len(), plan.team_a.midfielders) {
            for attackers in Combinations::new(pools.attackers.len(), plan.team_a.attackers) {
                let selection = Selection {
                    defenders,
                    midfielders,
                    attackers,
                };
                let score = balance_score(pools, &selection, weights);
                evaluated += 1;
                if best.map_or(true, |(_, s)| score < s) {
                    best = Some((selection, score));
                }
            }
        }
    }

    let (selection, score) = best.ok_or(BalanceError::NoValidCombination)?;
    Ok(SearchResult {
        selection,
        score,
        evaluated,
    })
}

/// One side's players by position, in slot order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamUnits {
    pub defenders: Vec<PlayerId>,
    pub midfielders: Vec<PlayerId>,
    pub attackers: Vec<PlayerId>,
}

impl TeamUnits {
    /// Defenders, then midfielders, then attackers.
    pub fn ordered(&self) -> Vec<PlayerId> {
        self.defenders
            .iter()
            .chain(&self.midfielders)
            .chain(&self.attackers)
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.defenders.len() + self.midfielders.len() + self.attackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Side A units from the selection, side B from the complements.
pub fn build_teams(pools: &PositionalPools, selection: &Selection) -> (TeamUnits, TeamUnits) {
    let mut team_a = TeamUnits::default();
    let mut team_b = TeamUnits::default();
    for group in PositionGroup::ALL {
        let pool = pools.get(group);
        let mask = selection.get(group);
        let chosen: Vec<PlayerId> = mask_members(mask)
            .filter_map(|i| pool.get(i))
            .map(|p| p.id)
            .collect();
        let rest: Vec<PlayerId> = pool
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1u64 << i) == 0)
            .map(|(_, p)| p.id)
            .collect();
        let (a, b) = match group {
            PositionGroup::Defense => (&mut team_a.defenders, &mut team_b.defenders),
            PositionGroup::Midfield => (&mut team_a.midfielders, &mut team_b.midfielders),
            PositionGroup::Attack => (&mut team_a.attackers, &mut team_b.attackers),
        };
        *a = chosen;
        *b = rest;
    }
    (team_a, team_b)
}

/// Result of one rating balancing run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingOutcome {
    pub team_a: TeamUnits,
    pub team_b: TeamUnits,
    pub balance_score: f64,
    pub combinations_evaluated: u64,
    pub plan: SplitPlan,
    /// Informational only; pooling uses raw attributes.
    pub suitability: Vec<PlayerSuitability>,
}

/// Run all phases on an already validated player list.
pub fn balance(
    players: &[Player],
    sizes: TeamSizes,
    template: &TeamSizeTemplate,
    weights: &PositionWeights,
) -> Result<RatingOutcome, BalanceError> {
    if sizes.total() != players.len() {
        return Err(BalanceError::TargetSizeMismatch {
            requested: sizes.total(),
            pool: players.len(),
        });
    }

    let suitability: Vec<PlayerSuitability> = players
        .iter()
        .map(|p| PlayerSuitability::for_player(p, weights))
        .collect();
    for s in &suitability {
        log::debug!(
            "Suitability {}: defense {:.2}, midfield {:.2}, attack {:.2}",
            s.player_id,
            s.defense,
            s.midfield,
            s.attack
        );
    }

    let plan = SplitPlan::new(template, sizes);
    let pools = assemble_pools(players, &plan);
    let best = search_best_split(&pools, &plan, weights)?;
    let (team_a, team_b) = build_teams(&pools, &best.selection);

    log::info!(
        "Rating balance {}v{}: score {:.3} after {} combinations",
        team_a.len(),
        team_b.len(),
        best.score,
        best.evaluated
    );

    Ok(RatingOutcome {
        team_a,
        team_b,
        balance_score: best.score,
        combinations_evaluated: best.evaluated,
        plan,
        suitability,
    })
}
