use matchmvp_provider::ProviderError;
use thiserror::Error;

/// Failures talking to the reasoning oracle.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Claude CLI error: {0}")]
    Cli(String),

    #[error("Oracle timed out after {0} seconds")]
    Timeout(u64),

    #[error("Oracle reply parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why the selector could not name an MVP.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error(
        "MVP cannot be determined: none of the {total} players played at least {min_minutes} minutes"
    )]
    InsufficientData { total: usize, min_minutes: u32 },

    #[error("Duplicate playerId in statistics: {0}")]
    DuplicatePlayer(String),
}

/// Tool-level failures. These are recorded as observations, not raised to the caller.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool `{0}`. Available tools: validate_match, fetch_match_stats, determine_mvp")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: &'static str, reason: String },

    #[error("Unknown match id `{0}`: call validate_match first and pass the matchId it returns")]
    UnknownMatch(String),

    #[error("Stats provider unavailable: {0}")]
    ProviderUnavailable(#[from] ProviderError),

    #[error("{0}")]
    InsufficientData(String),
}

impl ToolError {
    /// The oracle asked for something outside the declared catalog or schemas.
    pub fn is_schema_violation(&self) -> bool {
        matches!(
            self,
            ToolError::UnknownTool(_) | ToolError::InvalidArguments { .. }
        )
    }
}

impl From<SelectionError> for ToolError {
    fn from(e: SelectionError) -> Self {
        match e {
            SelectionError::InsufficientData { .. } => ToolError::InsufficientData(e.to_string()),
            SelectionError::DuplicatePlayer(_) => ToolError::InvalidArguments {
                tool: "determine_mvp",
                reason: e.to_string(),
            },
        }
    }
}

/// Loop-level failures, returned to the caller as the query's result.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Agent exhausted {turns} turns without a final answer")]
    Exhausted { turns: u32 },

    #[error("Tool invocation error: {0}")]
    ToolInvocation(String),

    #[error("Reasoning oracle unavailable: {0}")]
    Upstream(#[from] OracleError),
}
