//! Ordered extractor strategies for structured payloads in free text.
//!
//! Each extractor wraps one delimiter pattern. The classifier tries them
//! in order and the first match wins, so precedence is the list order,
//! not pattern specificity.

use regex::Regex;

/// One delimiter-based payload extractor.
pub struct Extractor {
    name: &'static str,
    pattern: Regex,
}

impl Extractor {
    /// Build an extractor from a pattern with a single capture group.
    pub fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            // Patterns are compile-time constants; a bad one is a programming error.
            pattern: Regex::new(pattern).unwrap_or_else(|e| {
                panic!("invalid extractor pattern {name}: {e}");
            }),
        }
    }

    /// The extractor's name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Return the inner content of the first match, trimmed.
    pub fn extract<'a>(&self, raw: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
    }
}

/// The default chain: plain fence, then `json` fence, then `tool_output`
/// fence.
pub fn default_extractors() -> Vec<Extractor> {
    vec![
        Extractor::new("fenced", r"(?s)```\n(.*?)```"),
        Extractor::new("fenced_json", r"(?s)```json\s*\n?(.*?)```"),
        Extractor::new("fenced_tool_output", r"(?s)```tool_output\s*\n?(.*?)```"),
    ]
}
