use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Stats provider request failed: {0}")]
    Transport(String),

    #[error("Stats provider timed out after {0} seconds")]
    Timeout(u64),

    #[error("Stats provider rejected credentials (status {0})")]
    Auth(u16),

    #[error("Stats provider rate limit exceeded")]
    RateLimited,

    #[error("Stats provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Stats provider reported errors: {0}")]
    Api(String),

    #[error("Stats provider response parse error: {0}")]
    Parse(String),

    #[error("Stats provider configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProviderError::Parse(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}
