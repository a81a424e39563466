use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use matchmvp_models::config::{OracleConfig, ANTHROPIC_API_KEY_ENV};

use crate::error::OracleError;

/// Configuration for a Claude CLI invocation.
#[derive(Debug, Clone)]
pub struct ClaudeCliConfig {
    pub model: String,
    pub timeout: Duration,
    /// Passed to the child process as `ANTHROPIC_API_KEY` when set.
    pub api_key: Option<String>,
}

impl Default for ClaudeCliConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-5-haiku-latest".to_string(),
            timeout: Duration::from_secs(60),
            api_key: None,
        }
    }
}

impl From<&OracleConfig> for ClaudeCliConfig {
    fn from(config: &OracleConfig) -> Self {
        Self {
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
            api_key: config.api_key.clone(),
        }
    }
}

/// Invoke the `claude` CLI with a system prompt and user prompt.
/// Returns the raw stdout text.
pub async fn invoke_claude(
    system_prompt: &str,
    user_prompt: &str,
    config: &ClaudeCliConfig,
) -> Result<String, OracleError> {
    debug!(model = %config.model, prompt_len = user_prompt.len(), "Invoking claude CLI");

    let mut command = Command::new("claude");
    command.args([
        "-p",
        user_prompt,
        "--system-prompt",
        system_prompt,
        "--model",
        config.model.as_str(),
        "--output-format",
        "text",
    ]);
    if let Some(key) = &config.api_key {
        command.env(ANTHROPIC_API_KEY_ENV, key);
    }
    command.kill_on_drop(true);

    let result = tokio::time::timeout(config.timeout, command.output())
        .await
        .map_err(|_| OracleError::Timeout(config.timeout.as_secs()))?
        .map_err(|e| OracleError::Cli(format!("Failed to spawn claude: {e}")))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        warn!(status = %result.status, stderr = %stderr, "Claude CLI failed");
        return Err(OracleError::Cli(format!(
            "claude exited {}: {}",
            result.status, stderr
        )));
    }

    let stdout = String::from_utf8_lossy(&result.stdout).to_string();
    if stdout.trim().is_empty() {
        return Err(OracleError::Cli("Claude returned empty response".to_string()));
    }

    Ok(stdout)
}

/// Check if the `claude` CLI is available on the system.
pub async fn check_cli_available() -> bool {
    match Command::new("claude").arg("--version").output().await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}
