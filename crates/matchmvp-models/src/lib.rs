pub mod config;
pub mod match_query;
pub mod match_record;
pub mod mvp_decision;
pub mod player_stat;
pub mod transcript;

pub use config::{
    AgentConfig, CacheConfig, ConfigError, MvpConfig, OracleConfig, ProviderConfig,
    ScoreWeights, SelectorConfig,
};
pub use match_query::MatchQuery;
pub use match_record::MatchRecord;
pub use mvp_decision::{MvpDecision, ScoreComponent, StatCategory};
pub use player_stat::PlayerStat;
pub use transcript::{AgentTranscript, FinalAnswer, Turn};
