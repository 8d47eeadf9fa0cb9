//! Response classification — turns a raw model reply into a typed outcome.
//!
//! The classifier never fails: malformed structured content falls back to
//! plain text, and the worst case is a low-confidence text classification.

pub mod extract;

pub use extract::{Extractor, default_extractors};

use serde_json::Value;

/// Status value a structured reply uses to ask for more input.
const INPUT_REQUIRED_STATUS: &str = "input_required";

/// Prompt surfaced when a reply asks for input but carries no question.
const INPUT_PROMPT_FALLBACK: &str = "Please provide additional input to continue.";

/// The final payload of a completed classification.
#[derive(Debug, Clone, PartialEq)]
pub enum FinalPayload {
    /// Free text.
    Text(String),
    /// Structured data decoded from the reply.
    Data(Value),
}

/// Outcome of classifying one completion chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// In-progress narration; the task keeps working.
    Partial,
    /// The model needs more input from the caller.
    InputRequired { question: String },
    /// A final result, either text or structured data.
    Final(FinalPayload),
}

/// Classifies raw model replies via an ordered extractor chain.
pub struct ResponseClassifier {
    extractors: Vec<Extractor>,
}

impl ResponseClassifier {
    /// Create a classifier with the default extractor chain.
    pub fn new() -> Self {
        Self {
            extractors: default_extractors(),
        }
    }

    /// Create a classifier with a custom extractor chain.
    pub fn with_extractors(extractors: Vec<Extractor>) -> Self {
        Self { extractors }
    }

    /// Classify one completion chunk.
    pub fn classify(&self, raw: &str) -> Classification {
        // First match wins across the ordered extractor chain.
        if let Some(inner) = self.extract(raw) {
            return match serde_json::from_str::<Value>(inner) {
                Ok(value) => classify_value(value),
                // Malformed content inside a matched fence falls back to
                // the raw matched text, never raises.
                Err(_) => classify_text(inner),
            };
        }

        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) => classify_value(value),
            Err(_) => classify_text(raw),
        }
    }

    /// Run the extractor chain, returning the first match's inner content.
    fn extract<'a>(&self, raw: &'a str) -> Option<&'a str> {
        for extractor in &self.extractors {
            if let Some(inner) = extractor.extract(raw) {
                tracing::trace!(extractor = extractor.name(), "Matched fenced payload");
                return Some(inner);
            }
        }
        None
    }
}

impl Default for ResponseClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn classify_value(value: Value) -> Classification {
    if value.get("status").and_then(Value::as_str) == Some(INPUT_REQUIRED_STATUS) {
        let question = value
            .get("question")
            .and_then(Value::as_str)
            .unwrap_or(INPUT_PROMPT_FALLBACK)
            .to_string();
        return Classification::InputRequired { question };
    }
    Classification::Final(FinalPayload::Data(value))
}

fn classify_text(text: &str) -> Classification {
    if is_progress_placeholder(text) {
        Classification::Partial
    } else {
        Classification::Final(FinalPayload::Text(text.trim().to_string()))
    }
}

/// Whether `text` is orchestrator narration rather than a real answer.
///
/// Empty chunks and ellipsis-wrapped markers like `...processing...` count
/// as in-progress placeholders.
fn is_progress_placeholder(text: &str) -> bool {
    let stripped: String = text
        .trim()
        .trim_matches(|c: char| c == '.' || c == '…' || c.is_whitespace())
        .to_lowercase();
    stripped.is_empty() || stripped == "processing" || stripped == "working"
}
