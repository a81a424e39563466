use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use matchmvp_models::{MatchRecord, PlayerStat};
use moka::future::Cache;
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::StatsProvider;

/// Read-through cache in front of another provider.
///
/// Fixture lookups are cached whether or not a match was found; player lists
/// only when present. Errors are never cached. Entries are evicted after TTL.
pub struct CachedStatsProvider {
    inner: Arc<dyn StatsProvider>,
    fixtures: Cache<String, Option<MatchRecord>>,
    players: Cache<String, Vec<PlayerStat>>,
}

impl CachedStatsProvider {
    pub fn new(inner: Arc<dyn StatsProvider>, max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner,
            fixtures: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            players: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    fn fixture_key(team1: &str, team2: &str, date: NaiveDate) -> String {
        let mut teams = [team1.trim().to_lowercase(), team2.trim().to_lowercase()];
        teams.sort();
        format!("fixture:{}|{}|{date}", teams[0], teams[1])
    }

    pub fn entry_count(&self) -> u64 {
        self.fixtures.entry_count() + self.players.entry_count()
    }
}

#[async_trait]
impl StatsProvider for CachedStatsProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn find_match(
        &self,
        team1: &str,
        team2: &str,
        date: NaiveDate,
    ) -> Result<Option<MatchRecord>, ProviderError> {
        let key = Self::fixture_key(team1, team2, date);
        if let Some(cached) = self.fixtures.get(&key).await {
            debug!(key = %key, "Fixture cache hit");
            // Echo the caller's spelling of the teams, not the first caller's.
            return Ok(cached.map(|mut record| {
                record.team1 = team1.to_string();
                record.team2 = team2.to_string();
                record
            }));
        }

        let record = self.inner.find_match(team1, team2, date).await?;
        self.fixtures.insert(key, record.clone()).await;
        Ok(record)
    }

    async fn player_stats(&self, match_id: &str) -> Result<Option<Vec<PlayerStat>>, ProviderError> {
        if let Some(cached) = self.players.get(match_id).await {
            debug!(match_id, "Player stats cache hit");
            return Ok(Some(cached));
        }

        let stats = self.inner.player_stats(match_id).await?;
        if let Some(list) = &stats {
            self.players.insert(match_id.to_string(), list.clone()).await;
        }
        Ok(stats)
    }
}
