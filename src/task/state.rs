//! Task state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// State of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Task has been received but work has not started.
    Submitted,
    /// Task is being worked on.
    Working,
    /// The model needs more input from the caller before continuing.
    InputRequired,
    /// Task finished with an artifact.
    Completed,
    /// Task failed and cannot be completed.
    Failed,
}

impl TaskState {
    /// Check if this state allows transitioning to another state.
    pub fn can_transition_to(&self, target: TaskState) -> bool {
        use TaskState::*;

        matches!(
            (self, target),
            // From Submitted
            (Submitted, Working) | (Submitted, Failed) |
            // From Working
            (Working, InputRequired) | (Working, Completed) | (Working, Failed) |
            // From InputRequired (caller supplied more input, or gave up)
            (InputRequired, Working) | (InputRequired, Failed)
        )
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if the task is active (not terminal).
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Submitted => "submitted",
            Self::Working => "working",
            Self::InputRequired => "input_required",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A state transition record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    /// Previous state.
    pub from: TaskState,
    /// New state.
    pub to: TaskState,
    /// When the transition occurred.
    pub timestamp: DateTime<Utc>,
    /// Reason for the transition.
    pub reason: Option<String>,
}

/// One unit of conversational work.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    /// Task ID, caller-assigned or generated on first contact.
    pub id: String,
    /// Conversation context this task belongs to.
    pub context_id: String,
    /// Current state.
    pub state: TaskState,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// When the task reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    /// State transition history.
    pub transitions: Vec<StateTransition>,
}

impl Task {
    /// Create a new task in `submitted`.
    pub fn new(id: impl Into<String>, context_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            context_id: context_id.into(),
            state: TaskState::Submitted,
            created_at: Utc::now(),
            completed_at: None,
            transitions: Vec::new(),
        }
    }

    /// Transition to a new state. Terminal states never transition again.
    pub fn transition_to(
        &mut self,
        new_state: TaskState,
        reason: Option<String>,
    ) -> Result<(), TaskError> {
        if !self.state.can_transition_to(new_state) {
            return Err(TaskError::InvalidTransition {
                id: self.id.clone(),
                from: self.state.to_string(),
                to: new_state.to_string(),
            });
        }

        self.transitions.push(StateTransition {
            from: self.state,
            to: new_state,
            timestamp: Utc::now(),
            reason,
        });

        // Cap transition history to prevent unbounded memory growth
        const MAX_TRANSITIONS: usize = 100;
        if self.transitions.len() > MAX_TRANSITIONS {
            let drain_count = self.transitions.len() - MAX_TRANSITIONS;
            self.transitions.drain(..drain_count);
        }

        self.state = new_state;

        if new_state.is_terminal() {
            self.completed_at = Some(Utc::now());
        }

        Ok(())
    }
}
