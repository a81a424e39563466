use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use matchmvp_models::{AgentTranscript, MatchRecord, MvpDecision, PlayerStat};
use matchmvp_provider::{ProviderError, StatsProvider};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::ToolError;
use crate::oracle::{OracleReply, ReasoningOracle};
use crate::prompts::narration_prompt;
use crate::selector::MvpSelector;

/// The closed set of tools the oracle may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    ValidateMatch,
    FetchMatchStats,
    DetermineMvp,
}

impl ToolName {
    pub const ALL: [ToolName; 3] = [
        ToolName::ValidateMatch,
        ToolName::FetchMatchStats,
        ToolName::DetermineMvp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ValidateMatch => "validate_match",
            ToolName::FetchMatchStats => "fetch_match_stats",
            ToolName::DetermineMvp => "determine_mvp",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    /// The oracle-facing declaration of this tool.
    pub fn spec(&self) -> ToolSpec {
        match self {
            ToolName::ValidateMatch => ToolSpec {
                name: self.as_str().to_string(),
                description: "Check whether a football match between two teams took place on a \
                              given date. Returns a match record with `found` and, when found, \
                              the `matchId` needed by fetch_match_stats."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "team1": {"type": "string", "description": "First team name"},
                        "team2": {"type": "string", "description": "Second team name"},
                        "date": {"type": "string", "format": "date", "description": "Match date, YYYY-MM-DD"}
                    },
                    "required": ["team1", "team2", "date"],
                    "additionalProperties": false
                }),
            },
            ToolName::FetchMatchStats => ToolSpec {
                name: self.as_str().to_string(),
                description: "Fetch per-player statistics for a match previously confirmed by \
                              validate_match. Returns the raw list of player records."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "matchId": {"type": "string", "description": "matchId returned by validate_match"}
                    },
                    "required": ["matchId"],
                    "additionalProperties": false
                }),
            },
            ToolName::DetermineMvp => ToolSpec {
                name: self.as_str().to_string(),
                description: "Determine the Most Valuable Player from a list of player \
                              statistics, as returned by fetch_match_stats. Returns the winner, \
                              score and rationale."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "playerStats": {
                            "type": "array",
                            "items": player_stat_schema()
                        }
                    },
                    "required": ["playerStats"],
                    "additionalProperties": false
                }),
            },
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn player_stat_schema() -> Value {
    let count = json!({"type": "integer", "minimum": 0});
    json!({
        "type": "object",
        "properties": {
            "playerId": {"type": "string"},
            "name": {"type": "string"},
            "team": {"type": "string"},
            "position": {"type": ["string", "null"]},
            "minutesPlayed": count,
            "goals": count,
            "assists": count,
            "rating": {"type": ["string", "number", "null"]},
            "keyPasses": count,
            "passAccuracy": {"type": ["string", "number"]},
            "tacklesWon": count,
            "interceptions": count,
            "duelsWon": count,
            "duelsTotal": count,
            "yellowCards": count,
            "redCards": count
        },
        "required": ["playerId", "name", "team"],
        "additionalProperties": false
    })
}

/// Name, description and JSON Schema of one tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ValidateMatchArgs {
    pub team1: String,
    pub team2: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
enum MatchIdArg {
    Text(String),
    Number(u64),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawFetchMatchStatsArgs {
    match_id: MatchIdArg,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchMatchStatsArgs {
    pub match_id: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DetermineMvpArgs {
    pub player_stats: Vec<PlayerStat>,
}

/// A tool request whose arguments have passed schema validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    ValidateMatch(ValidateMatchArgs),
    FetchMatchStats(FetchMatchStatsArgs),
    DetermineMvp(DetermineMvpArgs),
}

impl ToolCall {
    /// Resolve a tool by name and validate its arguments. Never touches a collaborator.
    pub fn parse(name: &str, arguments: &Value) -> Result<Self, ToolError> {
        let tool = ToolName::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        match tool {
            ToolName::ValidateMatch => {
                let raw: ValidateMatchArgs = decode(tool, arguments)?;
                let args = ValidateMatchArgs {
                    team1: raw.team1.trim().to_string(),
                    team2: raw.team2.trim().to_string(),
                    date: raw.date,
                };
                if args.team1.is_empty() || args.team2.is_empty() {
                    return Err(invalid(tool, "team names must not be empty"));
                }
                Ok(ToolCall::ValidateMatch(args))
            }
            ToolName::FetchMatchStats => {
                let raw: RawFetchMatchStatsArgs = decode(tool, arguments)?;
                let match_id = match raw.match_id {
                    MatchIdArg::Text(id) => id.trim().to_string(),
                    MatchIdArg::Number(id) => id.to_string(),
                };
                if match_id.is_empty() {
                    return Err(invalid(tool, "matchId must not be empty"));
                }
                Ok(ToolCall::FetchMatchStats(FetchMatchStatsArgs { match_id }))
            }
            ToolName::DetermineMvp => {
                let args: DetermineMvpArgs = decode(tool, arguments)?;
                let duplicate = {
                    let mut seen = HashSet::new();
                    args.player_stats
                        .iter()
                        .find(|p| !seen.insert(p.player_id.as_str()))
                        .map(|p| p.player_id.clone())
                };
                if let Some(id) = duplicate {
                    return Err(invalid(tool, format!("duplicate playerId `{id}`")));
                }
                Ok(ToolCall::DetermineMvp(args))
            }
        }
    }

    pub fn name(&self) -> ToolName {
        match self {
            ToolCall::ValidateMatch(_) => ToolName::ValidateMatch,
            ToolCall::FetchMatchStats(_) => ToolName::FetchMatchStats,
            ToolCall::DetermineMvp(_) => ToolName::DetermineMvp,
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(tool: ToolName, arguments: &Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments.clone()).map_err(|e| invalid(tool, e.to_string()))
}

fn invalid(tool: ToolName, reason: impl Into<String>) -> ToolError {
    ToolError::InvalidArguments {
        tool: tool.as_str(),
        reason: reason.into(),
    }
}

/// Successful tool result, serialized into the transcript as the observation.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ToolOutput {
    Match(MatchRecord),
    Stats(Vec<PlayerStat>),
    Decision(MvpDecision),
}

impl ToolOutput {
    pub fn to_observation(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Per-query tool state. Created fresh by each agent run and dropped with it.
#[derive(Debug, Default)]
pub struct QuerySession {
    pub validated: HashSet<String>,
    pub last_match: Option<MatchRecord>,
    pub last_decision: Option<MvpDecision>,
}

/// Executes validated tool calls against the stats provider and selector.
pub struct ToolCatalog {
    provider: Arc<dyn StatsProvider>,
    selector: MvpSelector,
    narrator: Option<Arc<dyn ReasoningOracle>>,
    tool_timeout: Duration,
}

impl ToolCatalog {
    pub fn new(provider: Arc<dyn StatsProvider>, selector: MvpSelector, tool_timeout: Duration) -> Self {
        Self {
            provider,
            selector,
            narrator: None,
            tool_timeout,
        }
    }

    /// Ask `narrator` to phrase the MVP rationale. The winner is unaffected.
    pub fn with_narrator(mut self, narrator: Arc<dyn ReasoningOracle>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        ToolName::ALL.iter().map(ToolName::spec).collect()
    }

    pub async fn invoke(&self, call: ToolCall, session: &mut QuerySession) -> Result<ToolOutput, ToolError> {
        info!(tool = %call.name(), provider = self.provider.name(), "Invoking tool");

        match call {
            ToolCall::ValidateMatch(args) => {
                let found = self
                    .bounded(self.provider.find_match(&args.team1, &args.team2, args.date))
                    .await?;
                let record = found
                    .unwrap_or_else(|| MatchRecord::not_found(&args.team1, &args.team2, args.date));
                if let Some(id) = record.match_id.as_ref().filter(|_| record.found) {
                    session.validated.insert(id.clone());
                }
                debug!(found = record.found, match_id = ?record.match_id, "validate_match done");
                session.last_match = Some(record.clone());
                Ok(ToolOutput::Match(record))
            }
            ToolCall::FetchMatchStats(args) => {
                if !session.validated.contains(&args.match_id) {
                    return Err(ToolError::UnknownMatch(args.match_id));
                }
                let stats = self.bounded(self.provider.player_stats(&args.match_id)).await?;
                let stats = stats.ok_or(ToolError::UnknownMatch(args.match_id))?;
                debug!(players = stats.len(), "fetch_match_stats done");
                Ok(ToolOutput::Stats(stats))
            }
            ToolCall::DetermineMvp(args) => {
                let mut decision = self.selector.select(&args.player_stats)?;
                if let Some(narrator) = &self.narrator {
                    if let Some(text) = self.narrate(narrator.as_ref(), &decision, session).await {
                        decision.rationale = text;
                    }
                }
                info!(
                    player_id = %decision.player_id,
                    name = %decision.name,
                    score = %decision.score,
                    "MVP determined"
                );
                session.last_decision = Some(decision.clone());
                Ok(ToolOutput::Decision(decision))
            }
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ToolError> {
        tokio::time::timeout(self.tool_timeout, call)
            .await
            .map_err(|_| ProviderError::Timeout(self.tool_timeout.as_secs()))?
            .map_err(ToolError::from)
    }

    /// Narrated rationale, or `None` to keep the template one.
    async fn narrate(
        &self,
        narrator: &dyn ReasoningOracle,
        decision: &MvpDecision,
        session: &QuerySession,
    ) -> Option<String> {
        let transcript = AgentTranscript::new(narration_prompt(decision, session.last_match.as_ref()));
        let reply = tokio::time::timeout(self.tool_timeout, narrator.decide(&transcript, &[])).await;

        match reply {
            Ok(Ok(OracleReply::FinalAnswer { text })) if text.contains(&decision.name) => {
                Some(text.trim().to_string())
            }
            Ok(Ok(other)) => {
                warn!(reply = ?other, "Narration unusable, keeping template rationale");
                None
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Narration failed, keeping template rationale");
                None
            }
            Err(_) => {
                warn!(timeout_secs = self.tool_timeout.as_secs(), "Narration timed out");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{el_clasico, player, InMemoryStatsProvider, ScriptedOracle};
    use matchmvp_models::SelectorConfig;

    fn catalog(provider: Arc<InMemoryStatsProvider>) -> ToolCatalog {
        ToolCatalog::new(
            provider,
            MvpSelector::new(SelectorConfig::default()),
            Duration::from_secs(5),
        )
    }

    fn clasico_args() -> Value {
        json!({"team1": "Real Madrid", "team2": "Barcelona", "date": "2023-10-28"})
    }

    #[test]
    fn names_round_trip() {
        for tool in ToolName::ALL {
            assert_eq!(ToolName::from_name(tool.as_str()), Some(tool));
        }
        assert_eq!(ToolName::from_name("search_web"), None);
    }

    #[test]
    fn specs_are_closed_objects() {
        for tool in ToolName::ALL {
            let spec = tool.spec();
            assert_eq!(spec.name, tool.as_str());
            assert_eq!(spec.input_schema["type"], "object");
            assert_eq!(spec.input_schema["additionalProperties"], false);
        }
        let validate = ToolName::ValidateMatch.spec();
        assert_eq!(validate.input_schema["properties"]["date"]["format"], "date");
        assert_eq!(
            ToolName::FetchMatchStats.spec().input_schema["required"],
            json!(["matchId"])
        );
    }

    #[test]
    fn parse_validate_match() {
        let call = ToolCall::parse("validate_match", &clasico_args()).unwrap();
        let ToolCall::ValidateMatch(args) = call else {
            panic!("wrong variant");
        };
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2023, 10, 28).unwrap());
    }

    #[test]
    fn team_names_trimmed() {
        let call = ToolCall::parse(
            "validate_match",
            &json!({"team1": " Real Madrid ", "team2": "Barcelona\t", "date": "2023-10-28"}),
        )
        .unwrap();
        let ToolCall::ValidateMatch(args) = call else {
            panic!("wrong variant");
        };
        assert_eq!(args.team1, "Real Madrid");
        assert_eq!(args.team2, "Barcelona");
    }

    #[test]
    fn unknown_tool_is_schema_violation() {
        let err = ToolCall::parse("search_web", &json!({})).unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
        assert!(err.is_schema_violation());
    }

    #[test]
    fn malformed_arguments_rejected() {
        let cases = [
            ("validate_match", json!({"team1": "Real Madrid", "team2": "Barcelona"})),
            ("validate_match", json!({"team1": "A", "team2": "B", "date": "28/10/2023"})),
            ("validate_match", json!({"team1": " ", "team2": "B", "date": "2023-10-28"})),
            ("validate_match", json!({"team1": "A", "team2": "B", "date": "2023-10-28", "venue": "x"})),
            ("fetch_match_stats", json!({"matchId": ""})),
            ("fetch_match_stats", json!({"match_id": "1"})),
            ("determine_mvp", json!({"playerStats": "none"})),
            ("determine_mvp", Value::Null),
            (
                "determine_mvp",
                json!({"playerStats": [{"playerId": "1", "name": "Ter Stegen", "team": "Barcelona", "saves": 4}]}),
            ),
        ];
        for (tool, args) in cases {
            let err = ToolCall::parse(tool, &args).unwrap_err();
            assert!(err.is_schema_violation(), "{tool} {args} -> {err}");
        }
    }

    #[test]
    fn numeric_match_id_accepted() {
        let call = ToolCall::parse("fetch_match_stats", &json!({"matchId": 1034})).unwrap();
        assert_eq!(
            call,
            ToolCall::FetchMatchStats(FetchMatchStatsArgs {
                match_id: "1034".to_string()
            })
        );
    }

    #[test]
    fn duplicate_players_rejected() {
        let stats = vec![player("7", "Joselu", "Real Madrid").minutes(90).build(); 2];
        let err = ToolCall::parse("determine_mvp", &json!({ "playerStats": stats })).unwrap_err();
        assert!(err.to_string().contains("duplicate playerId `7`"));
    }

    #[tokio::test]
    async fn extreme_counts_do_not_panic() {
        let tools = catalog(Arc::new(el_clasico()));
        let mut session = QuerySession::default();
        let args = json!({"playerStats": [
            {"playerId": "1", "name": "Wall", "team": "X", "minutesPlayed": 90,
             "goals": u32::MAX, "assists": 1, "tacklesWon": u32::MAX, "interceptions": 1},
            {"playerId": "2", "name": "Other", "team": "Y", "minutesPlayed": 90},
        ]});

        let call = ToolCall::parse("determine_mvp", &args).unwrap();
        let ToolOutput::Decision(decision) = tools.invoke(call, &mut session).await.unwrap() else {
            panic!("expected decision");
        };
        assert_eq!(decision.player_id, "1");
    }

    #[tokio::test]
    async fn validate_records_found_match_in_session() {
        let provider = Arc::new(el_clasico());
        let tools = catalog(provider);
        let mut session = QuerySession::default();

        let call = ToolCall::parse("validate_match", &clasico_args()).unwrap();
        let ToolOutput::Match(record) = tools.invoke(call, &mut session).await.unwrap() else {
            panic!("expected match record");
        };

        assert!(record.found);
        let id = record.match_id.unwrap();
        assert!(session.validated.contains(&id));
    }

    #[tokio::test]
    async fn absent_match_is_not_an_error() {
        let tools = catalog(Arc::new(el_clasico()));
        let mut session = QuerySession::default();

        let call = ToolCall::parse(
            "validate_match",
            &json!({"team1": "Atlantis FC", "team2": "Lemuria United", "date": "2023-10-28"}),
        )
        .unwrap();
        let output = tools.invoke(call, &mut session).await.unwrap();

        assert_eq!(
            output.to_observation().unwrap(),
            r#"{"matchId":null,"team1":"Atlantis FC","team2":"Lemuria United","date":"2023-10-28","found":false}"#
        );
        assert!(session.validated.is_empty());
    }

    #[tokio::test]
    async fn fetch_requires_validated_id() {
        let provider = Arc::new(el_clasico());
        let tools = catalog(provider.clone());
        let mut session = QuerySession::default();

        let call = ToolCall::parse("fetch_match_stats", &json!({"matchId": "1034"})).unwrap();
        let err = tools.invoke(call, &mut session).await.unwrap_err();

        assert!(matches!(err, ToolError::UnknownMatch(id) if id == "1034"));
        assert_eq!(provider.player_calls(), 0);
    }

    #[tokio::test]
    async fn fetch_passes_stats_through_unmodified() {
        let provider = Arc::new(el_clasico());
        let tools = catalog(provider.clone());
        let mut session = QuerySession::default();

        let call = ToolCall::parse("validate_match", &clasico_args()).unwrap();
        tools.invoke(call, &mut session).await.unwrap();
        let call = ToolCall::parse("fetch_match_stats", &json!({"matchId": 1034})).unwrap();
        let ToolOutput::Stats(stats) = tools.invoke(call, &mut session).await.unwrap() else {
            panic!("expected stats");
        };

        let expected = provider.stats_for("1034").unwrap();
        assert_eq!(stats, expected);
        assert!(stats.iter().any(|p| p.minutes_played < 5));
    }

    #[tokio::test]
    async fn provider_outage_is_recoverable_tool_error() {
        let provider = Arc::new(el_clasico().unavailable());
        let tools = catalog(provider);
        let mut session = QuerySession::default();

        let call = ToolCall::parse("validate_match", &clasico_args()).unwrap();
        let err = tools.invoke(call, &mut session).await.unwrap_err();

        assert!(matches!(err, ToolError::ProviderUnavailable(_)));
        assert!(!err.is_schema_violation());
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let provider = Arc::new(el_clasico().with_delay(Duration::from_millis(200)));
        let tools = ToolCatalog::new(
            provider,
            MvpSelector::new(SelectorConfig::default()),
            Duration::from_millis(20),
        );
        let mut session = QuerySession::default();

        let call = ToolCall::parse("validate_match", &clasico_args()).unwrap();
        let err = tools.invoke(call, &mut session).await.unwrap_err();

        assert!(matches!(
            err,
            ToolError::ProviderUnavailable(ProviderError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn determine_mvp_with_no_eligible_players() {
        let tools = catalog(Arc::new(el_clasico()));
        let mut session = QuerySession::default();
        let stats = vec![
            player("1", "Sub One", "Barcelona").minutes(3).build(),
            player("2", "Sub Two", "Real Madrid").minutes(4).goals(1).build(),
        ];

        let call = ToolCall::parse("determine_mvp", &json!({ "playerStats": stats })).unwrap();
        let err = tools.invoke(call, &mut session).await.unwrap_err();

        assert!(matches!(err, ToolError::InsufficientData(_)));
        assert!(err.to_string().contains("MVP cannot be determined"));
        assert!(session.last_decision.is_none());
    }

    #[tokio::test]
    async fn narration_replaces_rationale_but_not_winner() {
        let provider = Arc::new(el_clasico());
        let stats = provider.stats_for("1034").unwrap();
        let narrator = Arc::new(ScriptedOracle::new(vec![Ok(OracleReply::FinalAnswer {
            text: "Jude Bellingham decided El Clasico with two goals.".to_string(),
        })]));
        let tools = catalog(provider).with_narrator(narrator.clone());
        let mut session = QuerySession::default();

        let call = ToolCall::parse("determine_mvp", &json!({ "playerStats": stats })).unwrap();
        let ToolOutput::Decision(decision) = tools.invoke(call, &mut session).await.unwrap() else {
            panic!("expected decision");
        };

        assert_eq!(decision.name, "Jude Bellingham");
        assert_eq!(decision.rationale, "Jude Bellingham decided El Clasico with two goals.");
        assert_eq!(narrator.calls().await, 1);
    }

    #[tokio::test]
    async fn narration_naming_someone_else_is_ignored() {
        let provider = Arc::new(el_clasico());
        let stats = provider.stats_for("1034").unwrap();
        let narrator = Arc::new(ScriptedOracle::new(vec![Ok(OracleReply::FinalAnswer {
            text: "Gavi ran the show.".to_string(),
        })]));
        let tools = catalog(provider).with_narrator(narrator);
        let mut session = QuerySession::default();

        let call = ToolCall::parse("determine_mvp", &json!({ "playerStats": stats })).unwrap();
        let ToolOutput::Decision(decision) = tools.invoke(call, &mut session).await.unwrap() else {
            panic!("expected decision");
        };

        assert_eq!(decision.name, "Jude Bellingham");
        assert!(!decision.rationale.contains("Gavi"));
        assert!(decision.rationale.contains("Jude Bellingham"));
    }
}
