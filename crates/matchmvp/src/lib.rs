//! matchmvp - football match MVP agent
//!
//! Answers "who was the MVP of Team A vs Team B on DATE?" by letting a
//! reasoning oracle drive three tools (match validation, player statistics,
//! deterministic MVP selection) through a bounded agent loop.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use matchmvp::models::{MvpConfig, MatchQuery, FinalAnswer};
//! use matchmvp::agents::{AgentLoop, ToolCatalog, MvpSelector, ClaudeOracle};
//! use matchmvp::provider::{ApiFootballClient, CachedStatsProvider, StatsProvider};
//! ```

pub use matchmvp_agents as agents;
pub use matchmvp_models as models;
pub use matchmvp_provider as provider;

use std::sync::Arc;
use std::time::Duration;

use matchmvp_agents::{AgentError, AgentLoop, ClaudeOracle, MvpSelector, ReasoningOracle, ToolCatalog};
use matchmvp_models::{FinalAnswer, MatchQuery, MvpConfig};
use matchmvp_provider::{ApiFootballClient, CachedStatsProvider, StatsProvider};

/// Build an AgentLoop from configuration. Credentials must already be resolved.
pub fn build_agent(config: &MvpConfig) -> Result<AgentLoop, anyhow::Error> {
    let client: Arc<dyn StatsProvider> = Arc::new(ApiFootballClient::new(&config.provider)?);
    let provider: Arc<dyn StatsProvider> = if config.cache.enabled {
        Arc::new(CachedStatsProvider::new(
            client,
            config.cache.max_capacity,
            Duration::from_secs(config.cache.ttl_seconds),
        ))
    } else {
        client
    };

    let oracle: Arc<dyn ReasoningOracle> = Arc::new(ClaudeOracle::new(&config.oracle));

    let mut catalog = ToolCatalog::new(
        provider,
        MvpSelector::new(config.selector.clone()),
        Duration::from_secs(config.agent.tool_timeout_seconds),
    );
    if config.oracle.narrate_rationale {
        catalog = catalog.with_narrator(Arc::clone(&oracle));
    }

    Ok(AgentLoop::new(oracle, Arc::new(catalog), config.agent.clone()))
}

/// The text handed to the agent: `A vs B on DATE` is expanded into explicit
/// steps, anything else passes through unchanged.
pub fn prepare_query(input: &str) -> String {
    match MatchQuery::parse(input.trim()) {
        Some(query) => query.to_prompt(),
        None => input.trim().to_string(),
    }
}

/// Answer one user query.
pub async fn answer(agent: &AgentLoop, input: &str) -> Result<FinalAnswer, AgentError> {
    agent.run(&prepare_query(input)).await
}
