use std::sync::Arc;
use std::time::Instant;

use matchmvp_models::{AgentConfig, AgentTranscript, FinalAnswer, MvpDecision};
use tracing::{debug, error, info, warn};

use crate::error::{AgentError, OracleError};
use crate::oracle::{OracleReply, ReasoningOracle};
use crate::tools::{QuerySession, ToolCall, ToolCatalog};

/// Tool name under which unparseable oracle replies are reported back.
pub const REPLY_PROTOCOL: &str = "reply_protocol";

/// The bounded reason/act cycle for one query at a time.
///
/// `run` keeps every piece of mutable state local, so one `AgentLoop` can be
/// shared behind an `Arc` and serve concurrent queries.
pub struct AgentLoop {
    oracle: Arc<dyn ReasoningOracle>,
    catalog: Arc<ToolCatalog>,
    config: AgentConfig,
}

impl AgentLoop {
    pub fn new(oracle: Arc<dyn ReasoningOracle>, catalog: Arc<ToolCatalog>, config: AgentConfig) -> Self {
        Self {
            oracle,
            catalog,
            config,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Answer a query by alternating oracle decisions and tool calls.
    pub async fn run(&self, query: &str) -> Result<FinalAnswer, AgentError> {
        let start = Instant::now();
        let mut transcript = AgentTranscript::new(query);
        let mut session = QuerySession::default();
        let specs = self.catalog.specs();
        let query_id = transcript.query_id;

        let mut violations = 0u32;
        let mut oracle_failures = 0u32;

        info!(%query_id, oracle = self.oracle.name(), max_turns = self.config.max_turns, "Starting query");

        for turn in 1..=self.config.max_turns {
            let reply = match self.oracle.decide(&transcript, &specs).await {
                Ok(reply) => {
                    oracle_failures = 0;
                    reply
                }
                Err(OracleError::Parse(reason)) => {
                    oracle_failures = 0;
                    violations += 1;
                    warn!(%query_id, turn, violations, reason = %reason, "Oracle reply off protocol");
                    transcript.push_tool_result(REPLY_PROTOCOL, format!("Invalid reply: {reason}"), true);
                    self.check_violations(violations, &reason)?;
                    continue;
                }
                Err(e) => {
                    oracle_failures += 1;
                    if oracle_failures > self.config.oracle_retries {
                        error!(%query_id, turn, error = %e, "Oracle unavailable, giving up");
                        return Err(AgentError::Upstream(e));
                    }
                    warn!(%query_id, turn, error = %e, "Oracle call failed, retrying");
                    continue;
                }
            };

            match reply {
                OracleReply::FinalAnswer { text } => {
                    let text = reconcile(text, session.last_decision.as_ref());
                    transcript.push_assistant(text.clone());
                    info!(
                        %query_id,
                        turns = turn,
                        mvp = session.last_decision.as_ref().map(|d| d.name.as_str()),
                        elapsed_ms = start.elapsed().as_millis(),
                        "Query answered"
                    );
                    return Ok(FinalAnswer {
                        text,
                        decision: session.last_decision,
                        match_record: session.last_match,
                        turns_used: turn,
                    });
                }
                OracleReply::ToolCall { tool, arguments } => {
                    transcript.push_tool_call(tool.clone(), arguments.clone());

                    let call = match ToolCall::parse(&tool, &arguments) {
                        Ok(call) => call,
                        Err(e) => {
                            violations += 1;
                            warn!(%query_id, turn, tool = %tool, violations, error = %e, "Rejected tool call");
                            transcript.push_tool_result(tool, e.to_string(), true);
                            self.check_violations(violations, &e.to_string())?;
                            continue;
                        }
                    };
                    violations = 0;

                    let tool_start = Instant::now();
                    match self.catalog.invoke(call, &mut session).await {
                        Ok(output) => {
                            let (content, is_error) = match output.to_observation() {
                                Ok(content) => (content, false),
                                Err(e) => (format!("Failed to encode tool result: {e}"), true),
                            };
                            debug!(
                                %query_id,
                                turn,
                                tool = %tool,
                                elapsed_ms = tool_start.elapsed().as_millis(),
                                "Tool succeeded"
                            );
                            transcript.push_tool_result(tool, content, is_error);
                        }
                        Err(e) => {
                            warn!(
                                %query_id,
                                turn,
                                tool = %tool,
                                error = %e,
                                elapsed_ms = tool_start.elapsed().as_millis(),
                                "Tool failed"
                            );
                            transcript.push_tool_result(tool, e.to_string(), true);
                        }
                    }
                }
            }
        }

        error!(
            %query_id,
            turns = self.config.max_turns,
            elapsed_ms = start.elapsed().as_millis(),
            "Query exhausted turn budget"
        );
        Err(AgentError::Exhausted {
            turns: self.config.max_turns,
        })
    }

    fn check_violations(&self, violations: u32, last: &str) -> Result<(), AgentError> {
        if violations >= self.config.max_schema_violations {
            error!(violations, "Too many invalid tool calls");
            return Err(AgentError::ToolInvocation(format!(
                "{violations} consecutive invalid tool calls, last: {last}"
            )));
        }
        Ok(())
    }
}

/// Make sure the answer names the selected MVP.
fn reconcile(text: String, decision: Option<&MvpDecision>) -> String {
    match decision {
        Some(d) if !text.contains(&d.name) => {
            format!("{}\n\nMVP: {} ({})", text.trim_end(), d.name, d.team)
        }
        _ => text,
    }
}
