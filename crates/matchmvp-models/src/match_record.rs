use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a match lookup. `found = false` is a normal answer, not an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    /// Provider fixture identifier. Present only when `found` is true.
    pub match_id: Option<String>,
    pub team1: String,
    pub team2: String,
    pub date: NaiveDate,
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kickoff: Option<DateTime<Utc>>,
}

impl MatchRecord {
    pub fn found(
        match_id: impl Into<String>,
        team1: impl Into<String>,
        team2: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            match_id: Some(match_id.into()),
            team1: team1.into(),
            team2: team2.into(),
            date,
            found: true,
            home_team: None,
            away_team: None,
            kickoff: None,
        }
    }

    pub fn not_found(team1: impl Into<String>, team2: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            match_id: None,
            team1: team1.into(),
            team2: team2.into(),
            date,
            found: false,
            home_team: None,
            away_team: None,
            kickoff: None,
        }
    }

    pub fn with_fixture(
        mut self,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        kickoff: Option<DateTime<Utc>>,
    ) -> Self {
        self.home_team = Some(home_team.into());
        self.away_team = Some(away_team.into());
        self.kickoff = kickoff;
        self
    }
}
