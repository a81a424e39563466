use async_trait::async_trait;
use chrono::NaiveDate;
use matchmvp_models::{MatchRecord, PlayerStat};

use crate::error::ProviderError;

/// Source of fixtures and per-player match statistics. Mockable for testing.
///
/// `Ok(None)` means the provider has no such data; `Err` is reserved for
/// transport, credential and upstream failures.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Look up the fixture between two teams on a date, in either home/away order.
    async fn find_match(
        &self,
        team1: &str,
        team2: &str,
        date: NaiveDate,
    ) -> Result<Option<MatchRecord>, ProviderError>;

    /// Per-player statistics for a fixture id previously returned by `find_match`.
    async fn player_stats(&self, match_id: &str) -> Result<Option<Vec<PlayerStat>>, ProviderError>;
}
