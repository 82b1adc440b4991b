//! Scoring helpers shared by both balancers.

use crate::models::{Attribute, Player, PlayerAttributes, PlayerId, PositionGroup, PositionWeights};
use serde::{Deserialize, Serialize};

/// Arithmetic mean, `None` for no values.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Spread (max - min) of a metric across a pool. Degenerate pools spread over 1.0.
pub fn metric_range<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (min, max) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let range = max - min;
    if range.is_finite() && range > f64::EPSILON {
        range
    } else {
        1.0
    }
}

/// Map a combined loss onto 0..=100, where 0 loss is 100%.
pub fn balance_percentage(combined_loss: f64) -> f64 {
    (100.0 - combined_loss * 50.0).clamp(0.0, 100.0)
}

/// Average of one attribute over a unit of players; `None` for an empty unit.
pub fn unit_average(unit: &[&PlayerAttributes], attribute: Attribute) -> Option<f64> {
    mean(unit.iter().map(|a| a.get(attribute)))
}

/// Weighted composite of all six attributes for one position group.
pub fn suitability(attributes: &PlayerAttributes, group: PositionGroup, weights: &PositionWeights) -> f64 {
    let (weighted, total) = Attribute::ALL.iter().fold((0.0, 0.0), |(weighted, total), &attr| {
        let w = weights.weight(group, attr);
        (weighted + w * attributes.get(attr), total + w)
    });
    if total > 0.0 {
        weighted / total
    } else {
        0.0
    }
}

/// How well a player fits each position group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSuitability {
    pub player_id: PlayerId,
    pub defense: f64,
    pub midfield: f64,
    pub attack: f64,
}

impl PlayerSuitability {
    pub fn for_player(player: &Player, weights: &PositionWeights) -> Self {
        Self {
            player_id: player.id,
            defense: suitability(&player.attributes, PositionGroup::Defense, weights),
            midfield: suitability(&player.attributes, PositionGroup::Midfield, weights),
            attack: suitability(&player.attributes, PositionGroup::Attack, weights),
        }
    }
}
