//! Bulk roster import from CSV.

use crate::models::error::BalanceError;
use crate::models::player::{PerformanceRating, Player, PlayerAttributes};
use serde::Deserialize;
use std::io::Read;

/// One CSV row. Empty rating cells mean "no figure".
#[derive(Debug, Deserialize)]
struct RosterRow {
    name: String,
    goal_scoring: f64,
    teamwork: f64,
    stamina: f64,
    control: f64,
    resilience: f64,
    defending: f64,
    #[serde(default)]
    qualified: bool,
    #[serde(default)]
    guest: bool,
    power_rating: Option<f64>,
    goal_threat: Option<f64>,
}

impl From<csv::Error> for BalanceError {
    fn from(e: csv::Error) -> Self {
        BalanceError::InvalidRoster {
            line: e.position().map(|p| p.line()),
            message: e.to_string(),
        }
    }
}

/// Parse players from CSV with header
/// `name,goal_scoring,teamwork,stamina,control,resilience,defending,qualified,guest,power_rating,goal_threat`.
///
/// Any malformed row fails the whole import.
pub fn import_players_csv<R: Read>(reader: R) -> Result<Vec<Player>, BalanceError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut players = Vec::new();
    for record in rdr.deserialize::<RosterRow>() {
        let row = record?;
        let name = row.name.trim();
        if name.is_empty() {
            return Err(BalanceError::InvalidRoster {
                line: Some(players.len() as u64 + 2),
                message: "empty player name".to_string(),
            });
        }
        let mut player = Player::new(name);
        player.attributes = PlayerAttributes {
            goal_scoring: row.goal_scoring,
            teamwork: row.teamwork,
            stamina: row.stamina,
            control: row.control,
            resilience: row.resilience,
            defending: row.defending,
        };
        player.performance = PerformanceRating {
            qualified: row.qualified,
            guest: row.guest,
            power_rating: row.power_rating,
            goal_threat: row.goal_threat,
        };
        players.push(player);
    }
    log::info!("Imported {} player(s) from CSV", players.len());
    Ok(players)
}
