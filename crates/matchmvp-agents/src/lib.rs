pub mod agent_loop;
pub mod claude_cli;
pub mod error;
pub mod oracle;
pub mod parser;
pub mod prompts;
pub mod selector;
pub mod tools;

pub mod test_support;

pub use agent_loop::AgentLoop;
pub use error::{AgentError, OracleError, SelectionError, ToolError};
pub use oracle::{ClaudeOracle, OracleReply, ReasoningOracle};
pub use selector::{MvpSelector, ScoreCard};
pub use tools::{QuerySession, ToolCall, ToolCatalog, ToolName, ToolOutput, ToolSpec};
