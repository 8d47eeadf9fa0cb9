//! Configuration types.

use std::path::PathBuf;

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Agent name for identification.
    pub name: String,
    /// System preamble sent with every completion request.
    pub system_prompt: String,
    /// Path to the calendar document.
    pub calendar_path: PathBuf,
    /// Optional webhook URL for push delivery of task events.
    pub webhook_url: Option<String>,
}

/// Default system preamble for the booking agent.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a scheduling assistant. \
     Use the book_meeting tool to reserve time slots. When you need more \
     information from the user, reply with a json fenced block containing \
     {\"status\": \"input_required\", \"question\": \"...\"}.";

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "agent-relay".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            calendar_path: PathBuf::from("./data/calendar.json"),
            webhook_url: None,
        }
    }
}
