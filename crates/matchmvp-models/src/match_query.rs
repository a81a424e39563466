use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const TEAM_SEPARATORS: [&str; 4] = ["vs", "VS", "v", "V"];
const DATE_MARKERS: [&str; 2] = ["on", "ON"];

/// Two teams and the date they played on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchQuery {
    pub team1: String,
    pub team2: String,
    pub date: NaiveDate,
}

impl MatchQuery {
    /// Recognize the shorthand `"Team1 vs Team2 on YYYY-MM-DD"`.
    ///
    /// Accepts `vs`, `VS`, `v` or `V` between the teams and `on` or `ON`
    /// before the date. Text after the date is ignored. Returns `None` for
    /// anything else; free text is left for the reasoning oracle to interpret.
    pub fn parse(input: &str) -> Option<Self> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        if tokens.len() < 5 {
            return None;
        }

        let sep = tokens
            .iter()
            .position(|t| TEAM_SEPARATORS.contains(t))
            .filter(|&i| i > 0)?;
        // First `on` after a non-empty second team that is followed by a date.
        let (marker, date) = tokens
            .iter()
            .enumerate()
            .skip(sep + 2)
            .filter(|(_, t)| DATE_MARKERS.contains(t))
            .find_map(|(i, _)| Some((i, leading_date(tokens.get(i + 1)?)?)))?;

        Some(Self {
            team1: tokens[..sep].join(" "),
            team2: tokens[sep + 1..marker].join(" "),
            date,
        })
    }

    /// Step-by-step instruction handed to the agent for a recognized query.
    pub fn to_prompt(&self) -> String {
        format!(
            "Find the MVP for the football match between {} and {} on {}.\n\n\
             Please follow these steps:\n\
             1. First, validate if this match exists using the validate_match tool\n\
             2. If the match exists, fetch the player statistics using the fetch_match_stats tool\n\
             3. Finally, determine the MVP by passing the player statistics to the determine_mvp tool\n\n\
             Provide a detailed analysis of why the chosen player deserves to be the MVP.",
            self.team1,
            self.team2,
            self.date.format("%Y-%m-%d")
        )
    }
}

/// A `YYYY-MM-DD` date at the start of `token`.
fn leading_date(token: &str) -> Option<NaiveDate> {
    let head = token.get(..10)?;
    let shaped = head
        .bytes()
        .enumerate()
        .all(|(i, b)| if i == 4 || i == 7 { b == b'-' } else { b.is_ascii_digit() });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}
