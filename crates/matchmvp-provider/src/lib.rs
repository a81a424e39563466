pub mod api_football;
pub mod cached;
pub mod error;
pub mod provider;

pub use api_football::ApiFootballClient;
pub use cached::CachedStatsProvider;
pub use error::ProviderError;
pub use provider::StatsProvider;
