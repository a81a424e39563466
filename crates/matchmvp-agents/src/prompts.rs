use matchmvp_models::{AgentTranscript, MatchRecord, MvpDecision};

use crate::error::OracleError;
use crate::tools::ToolSpec;

/// Reply protocol included in every tool-using system prompt.
fn reply_protocol() -> String {
    let tool_call = serde_json::json!({
        "action": "tool_call",
        "tool": "<tool name>",
        "arguments": {"<argument>": "<value>"}
    });
    let final_answer = serde_json::json!({
        "action": "final_answer",
        "text": "<answer for the user>"
    });
    format!(
        "{}\n\nor\n\n{}",
        serde_json::to_string_pretty(&tool_call).unwrap_or_default(),
        serde_json::to_string_pretty(&final_answer).unwrap_or_default()
    )
}

/// System prompt for one agent turn. With no tools on offer the oracle is
/// asked for prose instead of a JSON action.
pub fn agent_system_prompt(tools: &[ToolSpec]) -> String {
    if tools.is_empty() {
        return "You are a football analyst. Answer the request in the conversation in two or \
                three plain sentences. Do not use JSON, markdown or lists. Only state facts that \
                appear in the request."
            .to_string();
    }

    let catalog = serde_json::to_string_pretty(tools).unwrap_or_default();
    format!(
        "You are a football analyst agent that determines the Most Valuable Player (MVP) of a \
         football match. You work in steps: at each step you either call ONE tool or give the \
         final answer.\n\n\
         ## TOOLS\n\n\
         {catalog}\n\n\
         ## WORKFLOW\n\n\
         1. Call `validate_match` with both team names and the date (YYYY-MM-DD).\n\
         2. If the result has `\"found\": false`, give a final answer saying no such match was \
         found. Do not call any other tool.\n\
         3. Otherwise call `fetch_match_stats` with the `matchId` from step 1.\n\
         4. Call `determine_mvp` with the complete, unmodified `playerStats` list from step 3.\n\
         5. Give a final answer naming the MVP, their team and the main reasons from the \
         decision's `rationale`.\n\n\
         ## RULES\n\n\
         - Never invent match ids, players or statistics. Use only tool results.\n\
         - Arguments must match the tool's input_schema exactly. No extra fields.\n\
         - A tool result with `\"isError\": true` describes what went wrong. Correct the call or \
         explain the failure in a final answer.\n\
         - Never pick the MVP yourself; the answer must agree with `determine_mvp`.\n\n\
         ## RESPONSE FORMAT\n\n\
         Respond with ONLY a JSON object, no surrounding text:\n\n\
         {}",
        reply_protocol()
    )
}

/// The conversation so far, as the oracle's user prompt.
pub fn render_transcript(transcript: &AgentTranscript) -> Result<String, OracleError> {
    let turns = serde_json::to_string_pretty(&transcript.turns)?;
    Ok(format!(
        "Conversation so far (oldest first):\n\n{turns}\n\nDecide the next step."
    ))
}

/// Request for a short explanation of an already-made decision.
pub fn narration_prompt(decision: &MvpDecision, fixture: Option<&MatchRecord>) -> String {
    let match_line = fixture
        .map(|m| format!("Match: {} vs {} on {}.\n", m.team1, m.team2, m.date))
        .unwrap_or_default();
    let stats: Vec<String> = decision
        .contributing_stats
        .iter()
        .map(|c| format!("- {}: {} ({} points)", c.category, c.detail, c.points.round_dp(2)))
        .collect();

    format!(
        "{match_line}The MVP is {name} ({team}) with a score of {score}.\n\
         Contributing statistics:\n{stats}\n\n\
         Explain in two or three sentences why {name} was the MVP. Mention {name} by name and \
         do not name any other player as MVP.",
        name = decision.name,
        team = decision.team,
        score = decision.score,
        stats = stats.join("\n"),
    )
}
