//! Task events — the observable units pushed to the caller's sink.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::task::state::TaskState;

/// What an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Progress narration.
    Status,
    /// Final payload of a completed task.
    Artifact,
}

/// Payload carried by an event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Text(String),
    Data(Value),
}

impl EventPayload {
    pub fn response_type(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Data(_) => "data",
        }
    }

    fn to_content(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Data(value) => value.clone(),
        }
    }
}

/// One observable unit of task progress or output.
///
/// Events for a given task are emitted and consumed in the order produced;
/// no reordering or coalescing.
#[derive(Debug, Clone)]
pub struct TaskEvent {
    pub task_id: String,
    pub context_id: String,
    pub kind: EventKind,
    pub payload: EventPayload,
    /// Task state after the transition this event accompanies.
    pub state: TaskState,
    /// Whether this is the last event of the current turn.
    pub is_final: bool,
}

impl TaskEvent {
    /// A status (progress) event.
    pub fn status(task: &crate::task::state::Task, payload: EventPayload, is_final: bool) -> Self {
        Self {
            task_id: task.id.clone(),
            context_id: task.context_id.clone(),
            kind: EventKind::Status,
            payload,
            state: task.state,
            is_final,
        }
    }

    /// An artifact event carrying the final payload.
    pub fn artifact(task: &crate::task::state::Task, payload: EventPayload) -> Self {
        Self {
            task_id: task.id.clone(),
            context_id: task.context_id.clone(),
            kind: EventKind::Artifact,
            payload,
            state: task.state,
            is_final: true,
        }
    }

    /// The wire shape delivered to sinks.
    pub fn to_update(&self) -> TaskStatusUpdate {
        TaskStatusUpdate {
            task_id: self.task_id.clone(),
            context_id: self.context_id.clone(),
            is_task_complete: self.state == TaskState::Completed,
            require_user_input: self.state == TaskState::InputRequired,
            content: self.payload.to_content(),
            response_type: self.payload.response_type().to_string(),
        }
    }
}

/// Wire representation of a task event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusUpdate {
    pub task_id: String,
    pub context_id: String,
    pub is_task_complete: bool,
    pub require_user_input: bool,
    pub content: Value,
    pub response_type: String,
}
