//! Weight configuration and team-size templates consumed by the balancers.

use crate::models::player::Attribute;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Position group a player is pooled into by the rating balancer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionGroup {
    Defense,
    Midfield,
    Attack,
}

impl PositionGroup {
    /// Slot order within a team: defenders first, attackers last.
    pub const ALL: [PositionGroup; 3] = [
        PositionGroup::Defense,
        PositionGroup::Midfield,
        PositionGroup::Attack,
    ];
}

/// Relative importance of power rating vs goal threat for the performance balancer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceWeights {
    pub power_weight: f64,
    pub goal_weight: f64,
}

impl Default for PerformanceWeights {
    fn default() -> Self {
        Self {
            power_weight: 0.5,
            goal_weight: 0.5,
        }
    }
}

impl PerformanceWeights {
    pub fn new(power_weight: f64, goal_weight: f64) -> Self {
        Self {
            power_weight,
            goal_weight,
        }
    }

    /// Both weights finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.power_weight, self.goal_weight]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

/// Weight per (position group, attribute). Missing entries weigh 1.0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionWeights {
    #[serde(default)]
    pub groups: HashMap<PositionGroup, HashMap<Attribute, f64>>,
}

impl PositionWeights {
    pub const DEFAULT_WEIGHT: f64 = 1.0;

    pub fn weight(&self, group: PositionGroup, attribute: Attribute) -> f64 {
        self.groups
            .get(&group)
            .and_then(|attrs| attrs.get(&attribute))
            .copied()
            .unwrap_or(Self::DEFAULT_WEIGHT)
    }

    pub fn set(&mut self, group: PositionGroup, attribute: Attribute, weight: f64) {
        self.groups.entry(group).or_default().insert(attribute, weight);
    }

    pub fn is_valid(&self) -> bool {
        self.groups
            .values()
            .flat_map(|attrs| attrs.values())
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

/// Expected positional make-up of a team of a nominal size.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TeamSizeTemplate {
    pub size: usize,
    pub defenders: usize,
    pub midfielders: usize,
    pub attackers: usize,
}

impl TeamSizeTemplate {
    pub const fn new(size: usize, defenders: usize, midfielders: usize, attackers: usize) -> Self {
        Self {
            size,
            defenders,
            midfielders,
            attackers,
        }
    }

    /// Positional counts for a team of `team_size` players, scaled from this template.
    ///
    /// Defenders and attackers are rounded proportionally; midfield takes the remainder.
    pub fn scaled(&self, team_size: usize) -> PositionCounts {
        if self.size == 0 {
            return PositionCounts {
                defenders: 0,
                midfielders: team_size,
                attackers: 0,
            };
        }
        let ratio = team_size as f64 / self.size as f64;
        let defenders = ((self.defenders as f64 * ratio).round() as usize).min(team_size);
        let attackers = ((self.attackers as f64 * ratio).round() as usize).min(team_size - defenders);
        PositionCounts {
            defenders,
            midfielders: team_size - defenders - attackers,
            attackers,
        }
    }
}

/// Per-team positional counts after scaling a template.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PositionCounts {
    pub defenders: usize,
    pub midfielders: usize,
    pub attackers: usize,
}

impl PositionCounts {
    pub fn get(&self, group: PositionGroup) -> usize {
        match group {
            PositionGroup::Defense => self.defenders,
            PositionGroup::Midfield => self.midfielders,
            PositionGroup::Attack => self.attackers,
        }
    }
}

/// Built-in templates for five- to eleven-a-side.
pub fn default_templates() -> Vec<TeamSizeTemplate> {
    vec![
        TeamSizeTemplate::new(5, 2, 2, 1),
        TeamSizeTemplate::new(6, 2, 2, 2),
        TeamSizeTemplate::new(7, 3, 2, 2),
        TeamSizeTemplate::new(8, 3, 3, 2),
        TeamSizeTemplate::new(9, 3, 4, 2),
        TeamSizeTemplate::new(10, 4, 4, 2),
        TeamSizeTemplate::new(11, 4, 4, 3),
    ]
}
