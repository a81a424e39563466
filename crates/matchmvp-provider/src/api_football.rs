use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use matchmvp_models::config::ProviderConfig;
use matchmvp_models::{MatchRecord, PlayerStat};
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ProviderError;
use crate::provider::StatsProvider;

const KEY_HEADER: &str = "x-rapidapi-key";
const HOST_HEADER: &str = "x-rapidapi-host";

/// API-Football client (v3, served through RapidAPI).
pub struct ApiFootballClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ApiFootballClient {
    /// Build a client from resolved configuration. Both credentials must be present.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::Config("provider.api_key is not set".to_string()))?;
        let api_host = config
            .api_host
            .as_deref()
            .ok_or_else(|| ProviderError::Config("provider.api_host is not set".to_string()))?;

        let mut headers = HeaderMap::new();
        let mut key_value = HeaderValue::from_str(api_key)
            .map_err(|e| ProviderError::Config(format!("invalid api key: {e}")))?;
        key_value.set_sensitive(true);
        headers.insert(KEY_HEADER, key_value);
        headers.insert(
            HOST_HEADER,
            HeaderValue::from_str(api_host)
                .map_err(|e| ProviderError::Config(format!("invalid api host: {e}")))?,
        );

        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {e}")))?;

        info!(host = %api_host, base_url = %config.base_url, "Initialized API-Football client");

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value, ProviderError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(url = %url, ?params, "Requesting stats provider");

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.timeout.as_secs())
                } else {
                    ProviderError::from(e)
                }
            })?;

        let status = response.status();
        debug!(url = %url, status = status.as_u16(), "Stats provider responded");

        match status.as_u16() {
            401 | 403 => {
                warn!(status = status.as_u16(), "Stats provider rejected credentials");
                return Err(ProviderError::Auth(status.as_u16()));
            }
            429 => {
                warn!("Stats provider rate limit exceeded");
                return Err(ProviderError::RateLimited);
            }
            _ if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                warn!(status = status.as_u16(), body = %body, "Stats provider HTTP error");
                return Err(ProviderError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            _ => {}
        }

        let body: Value = response.json().await?;
        check_api_errors(&body)?;
        Ok(body)
    }
}

#[async_trait]
impl StatsProvider for ApiFootballClient {
    fn name(&self) -> &str {
        "api-football"
    }

    async fn find_match(
        &self,
        team1: &str,
        team2: &str,
        date: NaiveDate,
    ) -> Result<Option<MatchRecord>, ProviderError> {
        info!(team1, team2, %date, "Searching for fixture");
        let date_param = date.format("%Y-%m-%d").to_string();
        let body = self.get("fixtures", &[("date", date_param.as_str())]).await?;
        let record = select_fixture(&body, team1, team2, date);
        match &record {
            Some(r) => info!(match_id = ?r.match_id, "Found matching fixture"),
            None => warn!(team1, team2, %date, "No fixture found"),
        }
        Ok(record)
    }

    async fn player_stats(&self, match_id: &str) -> Result<Option<Vec<PlayerStat>>, ProviderError> {
        info!(match_id, "Fetching player statistics");
        let body = self
            .get("fixtures/players", &[("fixture", match_id)])
            .await?;
        let stats = parse_player_stats(&body)?;
        if stats.is_empty() {
            warn!(match_id, "No player statistics found");
            return Ok(None);
        }
        info!(match_id, players = stats.len(), "Fetched player statistics");
        Ok(Some(stats))
    }
}

/// API-Football reports failures inside a 200 body as a non-empty `errors`
/// array or object.
pub fn check_api_errors(body: &Value) -> Result<(), ProviderError> {
    let has_errors = match body.get("errors") {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::String(s)) => !s.is_empty(),
        _ => false,
    };
    if has_errors {
        return Err(ProviderError::Api(body["errors"].to_string()));
    }
    Ok(())
}

/// Pick the fixture whose home/away names contain both team names, in either order.
pub fn select_fixture(body: &Value, team1: &str, team2: &str, date: NaiveDate) -> Option<MatchRecord> {
    let wanted1 = team1.trim().to_lowercase();
    let wanted2 = team2.trim().to_lowercase();

    body.get("response")?.as_array()?.iter().find_map(|fixture| {
        let home = fixture.pointer("/teams/home/name")?.as_str()?;
        let away = fixture.pointer("/teams/away/name")?.as_str()?;
        let (home_lc, away_lc) = (home.to_lowercase(), away.to_lowercase());

        let matches = (home_lc.contains(&wanted1) && away_lc.contains(&wanted2))
            || (home_lc.contains(&wanted2) && away_lc.contains(&wanted1));
        if !matches {
            return None;
        }

        let id = match fixture.pointer("/fixture/id")? {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            _ => return None,
        };
        let kickoff = fixture
            .pointer("/fixture/date")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Some(MatchRecord::found(id, team1, team2, date).with_fixture(home, away, kickoff))
    })
}

#[derive(Debug, Deserialize)]
struct TeamPlayers {
    team: TeamRef,
    #[serde(default)]
    players: Vec<PlayerEntry>,
}

#[derive(Debug, Deserialize)]
struct TeamRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PlayerEntry {
    player: PlayerRef,
    #[serde(default)]
    statistics: Vec<RawStatistics>,
}

#[derive(Debug, Deserialize)]
struct PlayerRef {
    id: Option<u64>,
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStatistics {
    games: Option<Games>,
    goals: Option<Goals>,
    passes: Option<Passes>,
    tackles: Option<Tackles>,
    duels: Option<Duels>,
    cards: Option<Cards>,
}

#[derive(Debug, Default, Deserialize)]
struct Games {
    minutes: Option<u32>,
    position: Option<String>,
    rating: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Goals {
    total: Option<u32>,
    assists: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct Passes {
    key: Option<u32>,
    accuracy: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Tackles {
    total: Option<u32>,
    interceptions: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct Duels {
    total: Option<u32>,
    won: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct Cards {
    yellow: Option<u32>,
    red: Option<u32>,
}

/// The provider publishes some numbers as strings (`"7.3"`, `"85"`).
fn decimal_from(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}

/// Flatten a `fixtures/players` body into one record per player.
pub fn parse_player_stats(body: &Value) -> Result<Vec<PlayerStat>, ProviderError> {
    let teams: Vec<TeamPlayers> = match body.get("response") {
        Some(response) if !response.is_null() => serde_json::from_value(response.clone())
            .map_err(|e| ProviderError::Parse(format!("fixtures/players: {e}")))?,
        _ => Vec::new(),
    };

    let mut stats = Vec::new();
    for team in teams {
        for entry in team.players {
            let Some(id) = entry.player.id else {
                warn!(team = %team.team.name, "Skipping player without id");
                continue;
            };
            let raw = entry.statistics.into_iter().next().unwrap_or_default();
            let games = raw.games.unwrap_or_default();
            let goals = raw.goals.unwrap_or_default();
            let passes = raw.passes.unwrap_or_default();
            let tackles = raw.tackles.unwrap_or_default();
            let duels = raw.duels.unwrap_or_default();
            let cards = raw.cards.unwrap_or_default();

            stats.push(PlayerStat {
                player_id: id.to_string(),
                name: entry.player.name.unwrap_or_else(|| format!("Player {id}")),
                team: team.team.name.clone(),
                position: games.position,
                minutes_played: games.minutes.unwrap_or(0),
                goals: goals.total.unwrap_or(0),
                assists: goals.assists.unwrap_or(0),
                rating: games.rating.as_ref().and_then(decimal_from),
                key_passes: passes.key.unwrap_or(0),
                pass_accuracy: passes
                    .accuracy
                    .as_ref()
                    .and_then(decimal_from)
                    .unwrap_or(Decimal::ZERO),
                tackles_won: tackles.total.unwrap_or(0),
                interceptions: tackles.interceptions.unwrap_or(0),
                duels_won: duels.won.unwrap_or(0),
                duels_total: duels.total.unwrap_or(0),
                yellow_cards: cards.yellow.unwrap_or(0),
                red_cards: cards.red.unwrap_or(0),
            });
        }
    }
    Ok(stats)
}
