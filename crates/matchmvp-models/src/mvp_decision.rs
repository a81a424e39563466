use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Scoring categories, in declared priority order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum StatCategory {
    Goals,
    Assists,
    Rating,
    Passing,
    Defence,
    Duels,
    Discipline,
    Minutes,
}

impl StatCategory {
    pub fn label(&self) -> &'static str {
        match self {
            StatCategory::Goals => "goals",
            StatCategory::Assists => "assists",
            StatCategory::Rating => "match rating",
            StatCategory::Passing => "passing",
            StatCategory::Defence => "defensive actions",
            StatCategory::Duels => "duels",
            StatCategory::Discipline => "discipline",
            StatCategory::Minutes => "minutes played",
        }
    }
}

impl fmt::Display for StatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Points one category added to (or removed from) a composite score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponent {
    pub category: StatCategory,
    pub points: Decimal,
    /// Human-readable figure behind the points, e.g. `"1 goal"` or `"6/8 duels won"`.
    pub detail: String,
}

/// The selected MVP for one match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MvpDecision {
    pub player_id: String,
    pub name: String,
    pub team: String,
    pub score: Decimal,
    pub rationale: String,
    /// Winner's non-zero components, largest absolute contribution first.
    pub contributing_stats: Vec<ScoreComponent>,
    pub eligible_players: usize,
    pub excluded_players: usize,
}
