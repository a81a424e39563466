use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const RAPID_API_KEY_ENV: &str = "RAPID_API_KEY";
pub const RAPID_API_HOST_ENV: &str = "RAPID_API_HOST";
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing credential: set `{field}` in the config file or the {env} environment variable")]
    MissingCredential { field: &'static str, env: &'static str },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MvpConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub selector: SelectorConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl MvpConfig {
    /// Fill absent credentials from `lookup` (normally the process environment)
    /// and fail if any are still missing.
    pub fn resolve_credentials<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fill = |slot: &mut Option<String>, env: &str| {
            if slot.as_deref().map_or(true, str::is_empty) {
                *slot = lookup(env).filter(|v| !v.trim().is_empty());
            }
        };

        fill(&mut self.provider.api_key, RAPID_API_KEY_ENV);
        fill(&mut self.provider.api_host, RAPID_API_HOST_ENV);
        fill(&mut self.oracle.api_key, ANTHROPIC_API_KEY_ENV);

        if self.provider.api_key.is_none() {
            return Err(ConfigError::MissingCredential {
                field: "provider.api_key",
                env: RAPID_API_KEY_ENV,
            });
        }
        if self.provider.api_host.is_none() {
            return Err(ConfigError::MissingCredential {
                field: "provider.api_host",
                env: RAPID_API_HOST_ENV,
            });
        }
        if self.oracle.api_key.is_none() {
            return Err(ConfigError::MissingCredential {
                field: "oracle.api_key",
                env: ANTHROPIC_API_KEY_ENV,
            });
        }
        Ok(())
    }
}

/// Stats provider (API-Football via RapidAPI).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_host: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-football-v1.p.rapidapi.com/v3".to_string(),
            api_key: None,
            api_host: None,
            timeout_seconds: 30,
        }
    }
}

/// Reasoning oracle (Claude CLI).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OracleConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    /// Ask the oracle to word the MVP rationale. The winner is chosen before it is asked.
    pub narrate_rationale: bool,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-5-haiku-latest".to_string(),
            api_key: None,
            timeout_seconds: 60,
            narrate_rationale: true,
        }
    }
}

/// Bounds on the reasoning loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    /// Oracle calls allowed per query.
    pub max_turns: u32,
    /// Consecutive unknown-tool or bad-argument requests tolerated before giving up.
    pub max_schema_violations: u32,
    /// Consecutive oracle transport failures retried before giving up.
    pub oracle_retries: u32,
    /// Upper bound on any single provider call made by a tool.
    pub tool_timeout_seconds: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: 8,
            max_schema_violations: 3,
            oracle_retries: 1,
            tool_timeout_seconds: 45,
        }
    }
}

/// MVP eligibility and scoring policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectorConfig {
    /// Players with fewer minutes are not considered.
    pub min_minutes: u32,
    /// Scores closer than this are treated as tied.
    pub tie_epsilon: Decimal,
    pub weights: ScoreWeights,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            min_minutes: 5,
            tie_epsilon: Decimal::new(1, 2),
            weights: ScoreWeights::default(),
        }
    }
}

/// Per-unit weights of the composite score. Penalties are given as positive numbers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoreWeights {
    pub goal: Decimal,
    pub assist: Decimal,
    /// Multiplies the provider rating (typically 5.0 to 10.0).
    pub rating: Decimal,
    /// Applied to pass accuracy expressed as a fraction of 1.
    pub pass_accuracy: Decimal,
    pub key_pass: Decimal,
    pub defensive_action: Decimal,
    /// Applied to duels won / duels total.
    pub duel_win_rate: Decimal,
    pub yellow_card: Decimal,
    pub red_card: Decimal,
    /// Applied to minutes played / 90.
    pub full_match: Decimal,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            goal: Decimal::from(10),
            assist: Decimal::from(7),
            rating: Decimal::ONE,
            pass_accuracy: Decimal::from(3),
            key_pass: Decimal::ONE,
            defensive_action: Decimal::new(5, 1),
            duel_win_rate: Decimal::from(2),
            yellow_card: Decimal::from(2),
            red_card: Decimal::from(6),
            full_match: Decimal::ONE,
        }
    }
}

/// In-memory cache in front of the stats provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_capacity: u64,
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_capacity: 1_000,
            ttl_seconds: 600,
        }
    }
}
