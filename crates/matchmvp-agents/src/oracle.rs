use async_trait::async_trait;
use matchmvp_models::{AgentTranscript, OracleConfig};
use serde::{Deserialize, Serialize};

use crate::claude_cli::{invoke_claude, ClaudeCliConfig};
use crate::error::OracleError;
use crate::parser::parse_oracle_reply;
use crate::prompts::{agent_system_prompt, render_transcript};
use crate::tools::ToolSpec;

/// One step chosen by the oracle: call a tool, or finish.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OracleReply {
    ToolCall {
        tool: String,
        #[serde(default)]
        arguments: serde_json::Value,
    },
    FinalAnswer {
        text: String,
    },
}

/// The reasoning boundary of the agent. Mockable for testing.
///
/// Given the transcript so far and the tools on offer, an oracle picks the next
/// step. With an empty tool list it must answer in prose.
#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    fn name(&self) -> &str;

    async fn decide(
        &self,
        transcript: &AgentTranscript,
        tools: &[ToolSpec],
    ) -> Result<OracleReply, OracleError>;
}

/// An oracle backed by the Claude CLI.
pub struct ClaudeOracle {
    pub cli_config: ClaudeCliConfig,
}

impl ClaudeOracle {
    pub fn new(config: &OracleConfig) -> Self {
        Self {
            cli_config: ClaudeCliConfig::from(config),
        }
    }
}

#[async_trait]
impl ReasoningOracle for ClaudeOracle {
    fn name(&self) -> &str {
        &self.cli_config.model
    }

    async fn decide(
        &self,
        transcript: &AgentTranscript,
        tools: &[ToolSpec],
    ) -> Result<OracleReply, OracleError> {
        let system_prompt = agent_system_prompt(tools);
        let user_prompt = render_transcript(transcript)?;
        let raw_output = invoke_claude(&system_prompt, &user_prompt, &self.cli_config).await?;
        parse_oracle_reply(&raw_output)
    }
}
