use crate::error::OracleError;
use crate::oracle::OracleReply;

/// Extract the first JSON object from text that may surround it with prose.
///
/// Tried in order: the whole text, a fenced markdown block (```json or ```),
/// then the first balanced `{ ... }` outside string literals.
pub fn extract_json(text: &str) -> Result<String, OracleError> {
    let trimmed = text.trim();

    let candidates = [
        trimmed.starts_with('{').then(|| trimmed.to_string()),
        fenced_block(trimmed),
        first_balanced_object(trimmed),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|candidate| serde_json::from_str::<serde_json::Value>(candidate).is_ok())
        .ok_or_else(|| {
            OracleError::Parse(format!(
                "No valid JSON object found in reply (length={})",
                text.len()
            ))
        })
}

fn fenced_block(text: &str) -> Option<String> {
    const OPENERS: [&str; 4] = ["```json\n", "```json\r\n", "```\n", "```\r\n"];

    OPENERS.iter().find_map(|opener| {
        let start = text.find(opener)? + opener.len();
        let len = text[start..].find("```")?;
        Some(text[start..start + len].trim().to_string())
    })
}

fn first_balanced_object(text: &str) -> Option<String> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| text[s..=i].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Decode an oracle reply from raw CLI output.
///
/// A reply with no JSON object at all is taken as a plain-text final answer.
/// A JSON object that does not match the reply protocol is a parse error.
pub fn parse_oracle_reply(raw: &str) -> Result<OracleReply, OracleError> {
    let json_str = match extract_json(raw) {
        Ok(json_str) => json_str,
        Err(_) if !raw.trim().is_empty() && !raw.contains('{') => {
            return Ok(OracleReply::FinalAnswer {
                text: raw.trim().to_string(),
            });
        }
        Err(e) => return Err(e),
    };

    serde_json::from_str(&json_str).map_err(|e| {
        OracleError::Parse(format!("Reply does not follow the protocol: {e}\nJSON: {json_str}"))
    })
}
