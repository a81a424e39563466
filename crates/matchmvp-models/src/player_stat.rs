use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One player's statistics for a single match.
///
/// Counting stats default to zero when the provider omits them. `rating` stays
/// absent when the provider did not publish one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlayerStat {
    pub player_id: String,
    pub name: String,
    pub team: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default)]
    pub minutes_played: u32,
    #[serde(default)]
    pub goals: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub key_passes: u32,
    /// Completed passes as a percentage, 0 to 100.
    #[serde(default)]
    pub pass_accuracy: Decimal,
    #[serde(default)]
    pub tackles_won: u32,
    #[serde(default)]
    pub interceptions: u32,
    #[serde(default)]
    pub duels_won: u32,
    #[serde(default)]
    pub duels_total: u32,
    #[serde(default)]
    pub yellow_cards: u32,
    #[serde(default)]
    pub red_cards: u32,
}

impl PlayerStat {
    pub fn goal_contributions(&self) -> u32 {
        self.goals.saturating_add(self.assists)
    }

    pub fn defensive_actions(&self) -> u32 {
        self.tackles_won.saturating_add(self.interceptions)
    }

    /// Share of duels won, or `None` when the player contested none.
    pub fn duel_win_rate(&self) -> Option<Decimal> {
        if self.duels_total == 0 {
            return None;
        }
        let won = self.duels_won.min(self.duels_total);
        Some(Decimal::from(won) / Decimal::from(self.duels_total))
    }
}
