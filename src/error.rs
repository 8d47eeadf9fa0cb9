//! Error types for agent-relay.

use std::path::PathBuf;

/// Top-level error type for the agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    #[error("Calendar store error: {0}")]
    Store(#[from] StoreError),

    #[error("Booking error: {0}")]
    Booking(#[from] BookingError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Task lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Caller-supplied input failed validation. Surfaced immediately, never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The requested transition is not on the lifecycle graph.
    #[error("Task {id}: cannot transition from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: String,
        to: String,
    },

    /// The task already reached a terminal state.
    #[error("Task {id} is already {state}")]
    Terminal { id: String, state: String },

    /// The language-model collaborator errored or timed out.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Operation the lifecycle deliberately does not implement.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Calendar persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Persisted state cannot be parsed. Fatal for the operation in
    /// progress; a corrupt record must not be silently skipped.
    #[error("Corrupt calendar storage at {path}: {reason}")]
    CorruptStorage { path: PathBuf, reason: String },

    #[error("Unparseable timestamp in stored event: {value}")]
    InvalidTimestamp { value: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Booking request errors. Conflicts are NOT errors — they are a normal
/// `BookingOutcome`.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Invalid booking request: {0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Event delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Delivery to sink {sink} failed: {reason}")]
    DeliveryFailed { sink: String, reason: String },

    #[error("Sink closed")]
    Closed,
}

/// Result type alias for the agent.
pub type Result<T> = std::result::Result<T, Error>;
