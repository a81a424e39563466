//! Test support: scripted and scenario-driven oracles, an in-memory stats
//! provider and player fixtures.
//!
//! `ScenarioOracle` reads the transcript and follows the same workflow the
//! agent system prompt describes, so end-to-end runs need no Claude CLI.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use matchmvp_models::{AgentTranscript, MatchQuery, MatchRecord, MvpDecision, PlayerStat, Turn};
use matchmvp_provider::{ProviderError, StatsProvider};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::error::OracleError;
use crate::oracle::{OracleReply, ReasoningOracle};
use crate::tools::ToolSpec;

/// Shorthand for a scripted tool-call reply.
pub fn call(tool: &str, arguments: Value) -> Result<OracleReply, OracleError> {
    Ok(OracleReply::ToolCall {
        tool: tool.to_string(),
        arguments,
    })
}

/// Shorthand for a scripted final answer.
pub fn answer(text: &str) -> Result<OracleReply, OracleError> {
    Ok(OracleReply::FinalAnswer {
        text: text.to_string(),
    })
}

/// Replays a fixed sequence of replies and records every transcript it is shown.
pub struct ScriptedOracle {
    script: Mutex<VecDeque<Result<OracleReply, OracleError>>>,
    seen: Mutex<Vec<AgentTranscript>>,
}

impl ScriptedOracle {
    pub fn new(script: Vec<Result<OracleReply, OracleError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub async fn calls(&self) -> usize {
        self.seen.lock().await.len()
    }

    pub async fn transcripts(&self) -> Vec<AgentTranscript> {
        self.seen.lock().await.clone()
    }
}

#[async_trait]
impl ReasoningOracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn decide(
        &self,
        transcript: &AgentTranscript,
        _tools: &[ToolSpec],
    ) -> Result<OracleReply, OracleError> {
        self.seen.lock().await.push(transcript.clone());
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Cli("Script exhausted".to_string())))
    }
}

/// An oracle that follows the validate, fetch, determine workflow by reading
/// the latest observation. Stateless: everything comes from the transcript.
pub struct ScenarioOracle {
    narration: Option<String>,
}

impl ScenarioOracle {
    pub fn new() -> Self {
        Self { narration: None }
    }

    /// Text returned when asked for prose (no tools on offer).
    pub fn with_narration(mut self, text: &str) -> Self {
        self.narration = Some(text.to_string());
        self
    }
}

impl Default for ScenarioOracle {
    fn default() -> Self {
        Self::new()
    }
}

/// Recover the match from either the shorthand or the expanded step-by-step prompt.
fn query_from(content: &str) -> Option<MatchQuery> {
    if let Some(query) = MatchQuery::parse(content) {
        return Some(query);
    }
    let rest = content.split_once("between ")?.1;
    let (team1, rest) = rest.split_once(" and ")?;
    let (team2, rest) = rest.split_once(" on ")?;
    let date = NaiveDate::parse_from_str(rest.get(..10)?, "%Y-%m-%d").ok()?;
    Some(MatchQuery {
        team1: team1.to_string(),
        team2: team2.to_string(),
        date,
    })
}

fn final_answer(text: String) -> Result<OracleReply, OracleError> {
    Ok(OracleReply::FinalAnswer { text })
}

#[async_trait]
impl ReasoningOracle for ScenarioOracle {
    fn name(&self) -> &str {
        "scenario"
    }

    async fn decide(
        &self,
        transcript: &AgentTranscript,
        tools: &[ToolSpec],
    ) -> Result<OracleReply, OracleError> {
        if tools.is_empty() {
            return match &self.narration {
                Some(text) => final_answer(text.clone()),
                None => Err(OracleError::Cli("No narration scripted".to_string())),
            };
        }

        let query = transcript.turns.iter().find_map(|t| match t {
            Turn::User { content } => query_from(content),
            _ => None,
        });
        let Some(query) = query else {
            return final_answer("Please name two teams and a match date (YYYY-MM-DD).".to_string());
        };

        match transcript.last_tool_result() {
            None => call(
                "validate_match",
                json!({"team1": query.team1, "team2": query.team2, "date": query.date}),
            ),
            Some((_, content, true)) => {
                final_answer(format!("I could not determine the MVP: {content}"))
            }
            Some(("validate_match", content, false)) => {
                let record: MatchRecord = serde_json::from_str(content)?;
                match record.match_id.filter(|_| record.found) {
                    Some(id) => call("fetch_match_stats", json!({ "matchId": id })),
                    None => final_answer(format!(
                        "No match between {} and {} was found on {}.",
                        query.team1, query.team2, query.date
                    )),
                }
            }
            Some(("fetch_match_stats", content, false)) => {
                let stats: Value = serde_json::from_str(content)?;
                call("determine_mvp", json!({ "playerStats": stats }))
            }
            Some(("determine_mvp", content, false)) => {
                let decision: MvpDecision = serde_json::from_str(content)?;
                final_answer(format!(
                    "The MVP of {} vs {} on {} was {} ({}). {}",
                    query.team1,
                    query.team2,
                    query.date,
                    decision.name,
                    decision.team,
                    decision.rationale
                ))
            }
            Some((tool, _, false)) => Err(OracleError::Parse(format!("Unexpected tool result from {tool}"))),
        }
    }
}

/// Stats provider backed by fixed fixtures, with call counters.
pub struct InMemoryStatsProvider {
    fixtures: Vec<(MatchRecord, Vec<PlayerStat>)>,
    unavailable: bool,
    delay: Option<Duration>,
    fixture_calls: AtomicUsize,
    player_calls: AtomicUsize,
}

impl InMemoryStatsProvider {
    pub fn new() -> Self {
        Self {
            fixtures: Vec::new(),
            unavailable: false,
            delay: None,
            fixture_calls: AtomicUsize::new(0),
            player_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_fixture(mut self, record: MatchRecord, players: Vec<PlayerStat>) -> Self {
        self.fixtures.push((record, players));
        self
    }

    /// Every call fails as a transport error.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fixture_calls(&self) -> usize {
        self.fixture_calls.load(Ordering::SeqCst)
    }

    pub fn player_calls(&self) -> usize {
        self.player_calls.load(Ordering::SeqCst)
    }

    pub fn stats_for(&self, match_id: &str) -> Option<Vec<PlayerStat>> {
        self.fixtures
            .iter()
            .find(|(record, _)| record.match_id.as_deref() == Some(match_id))
            .map(|(_, players)| players.clone())
    }

    async fn simulate_network(&self) -> Result<(), ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable {
            return Err(ProviderError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemoryStatsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatsProvider for InMemoryStatsProvider {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn find_match(
        &self,
        team1: &str,
        team2: &str,
        date: NaiveDate,
    ) -> Result<Option<MatchRecord>, ProviderError> {
        self.fixture_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_network().await?;

        let same = |a: &str, b: &str| a.trim().eq_ignore_ascii_case(b.trim());
        Ok(self
            .fixtures
            .iter()
            .map(|(record, _)| record)
            .find(|r| {
                r.date == date
                    && ((same(&r.team1, team1) && same(&r.team2, team2))
                        || (same(&r.team1, team2) && same(&r.team2, team1)))
            })
            .map(|r| MatchRecord {
                team1: team1.to_string(),
                team2: team2.to_string(),
                ..r.clone()
            }))
    }

    async fn player_stats(&self, match_id: &str) -> Result<Option<Vec<PlayerStat>>, ProviderError> {
        self.player_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_network().await?;
        Ok(self.stats_for(match_id))
    }
}

/// Builder for `PlayerStat` fixtures; counting stats start at zero.
pub struct PlayerStatBuilder {
    stat: PlayerStat,
}

pub fn player(id: &str, name: &str, team: &str) -> PlayerStatBuilder {
    PlayerStatBuilder {
        stat: PlayerStat {
            player_id: id.to_string(),
            name: name.to_string(),
            team: team.to_string(),
            ..Default::default()
        },
    }
}

impl PlayerStatBuilder {
    pub fn position(mut self, position: &str) -> Self {
        self.stat.position = Some(position.to_string());
        self
    }

    pub fn minutes(mut self, minutes: u32) -> Self {
        self.stat.minutes_played = minutes;
        self
    }

    pub fn goals(mut self, goals: u32) -> Self {
        self.stat.goals = goals;
        self
    }

    pub fn assists(mut self, assists: u32) -> Self {
        self.stat.assists = assists;
        self
    }

    pub fn rating(mut self, rating: Decimal) -> Self {
        self.stat.rating = Some(rating);
        self
    }

    pub fn pass_accuracy(mut self, accuracy: Decimal) -> Self {
        self.stat.pass_accuracy = accuracy;
        self
    }

    pub fn key_passes(mut self, key_passes: u32) -> Self {
        self.stat.key_passes = key_passes;
        self
    }

    pub fn tackles(mut self, tackles_won: u32) -> Self {
        self.stat.tackles_won = tackles_won;
        self
    }

    pub fn interceptions(mut self, interceptions: u32) -> Self {
        self.stat.interceptions = interceptions;
        self
    }

    pub fn duels(mut self, won: u32, total: u32) -> Self {
        self.stat.duels_won = won;
        self.stat.duels_total = total;
        self
    }

    pub fn yellow_cards(mut self, cards: u32) -> Self {
        self.stat.yellow_cards = cards;
        self
    }

    pub fn red_cards(mut self, cards: u32) -> Self {
        self.stat.red_cards = cards;
        self
    }

    pub fn build(self) -> PlayerStat {
        self.stat
    }
}

pub const CLASICO_MATCH_ID: &str = "1034";

pub fn clasico_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 10, 28).unwrap_or_default()
}

/// Real Madrid vs Barcelona, 2023-10-28. Jude Bellingham is the clear MVP;
/// Joselu came on too late to be eligible.
pub fn clasico_players() -> Vec<PlayerStat> {
    vec![
        player("874", "Jude Bellingham", "Real Madrid")
            .position("M")
            .minutes(90)
            .goals(1)
            .assists(1)
            .rating(Decimal::new(85, 1))
            .pass_accuracy(Decimal::from(86))
            .key_passes(2)
            .tackles(1)
            .interceptions(1)
            .duels(7, 12)
            .build(),
        player("1165", "Ilkay Gundogan", "Barcelona")
            .position("M")
            .minutes(90)
            .goals(1)
            .rating(Decimal::new(79, 1))
            .pass_accuracy(Decimal::from(91))
            .key_passes(3)
            .tackles(2)
            .interceptions(1)
            .duels(5, 9)
            .build(),
        player("754", "Luka Modric", "Real Madrid")
            .position("M")
            .minutes(90)
            .rating(Decimal::new(72, 1))
            .pass_accuracy(Decimal::from(90))
            .key_passes(2)
            .duels(3, 6)
            .build(),
        player("47", "Ronald Araujo", "Barcelona")
            .position("D")
            .minutes(90)
            .rating(Decimal::new(70, 1))
            .pass_accuracy(Decimal::from(84))
            .tackles(3)
            .interceptions(3)
            .duels(8, 11)
            .yellow_cards(1)
            .build(),
        player("2294", "Joselu", "Real Madrid")
            .position("F")
            .minutes(3)
            .build(),
    ]
}

/// A provider that knows only El Clasico.
pub fn el_clasico() -> InMemoryStatsProvider {
    InMemoryStatsProvider::new().with_fixture(
        MatchRecord::found(CLASICO_MATCH_ID, "Real Madrid", "Barcelona", clasico_date())
            .with_fixture("Barcelona", "Real Madrid", None),
        clasico_players(),
    )
}
