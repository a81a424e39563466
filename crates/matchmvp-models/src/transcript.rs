use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::match_record::MatchRecord;
use crate::mvp_decision::MvpDecision;

/// One entry in a query's reasoning log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    User {
        content: String,
    },
    ToolCall {
        tool: String,
        arguments: serde_json::Value,
    },
    ToolResult {
        tool: String,
        content: String,
        #[serde(rename = "isError", default)]
        is_error: bool,
    },
    Assistant {
        content: String,
    },
}

/// Ordered log of a single query. Discarded once the query is answered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentTranscript {
    pub query_id: Uuid,
    pub turns: Vec<Turn>,
}

impl AgentTranscript {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query_id: Uuid::new_v4(),
            turns: vec![Turn::User {
                content: query.into(),
            }],
        }
    }

    pub fn push_tool_call(&mut self, tool: impl Into<String>, arguments: serde_json::Value) {
        self.turns.push(Turn::ToolCall {
            tool: tool.into(),
            arguments,
        });
    }

    pub fn push_tool_result(
        &mut self,
        tool: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
    ) {
        self.turns.push(Turn::ToolResult {
            tool: tool.into(),
            content: content.into(),
            is_error,
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::Assistant {
            content: content.into(),
        });
    }

    pub fn last_tool_result(&self) -> Option<(&str, &str, bool)> {
        self.turns.iter().rev().find_map(|t| match t {
            Turn::ToolResult {
                tool,
                content,
                is_error,
            } => Some((tool.as_str(), content.as_str(), *is_error)),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// What a query returns to its caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinalAnswer {
    pub text: String,
    pub decision: Option<MvpDecision>,
    pub match_record: Option<MatchRecord>,
    pub turns_used: u32,
}
