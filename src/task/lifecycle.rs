//! Task lifecycle — drives one task from submission to a terminal outcome.
//!
//! Every transition emits at least one event alongside it; a transition
//! with no corresponding event is a protocol violation.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::classify::{Classification, FinalPayload, ResponseClassifier};
use crate::error::TaskError;
use crate::relay::EventRelay;
use crate::task::event::{EventPayload, TaskEvent};
use crate::task::state::{Task, TaskState};

/// Failure messages surfaced to callers are bounded to this many characters.
pub const MAX_FAILURE_MESSAGE_CHARS: usize = 500;

/// Narration emitted while a task keeps working.
const WORKING_NARRATION: &str = "Processing request...";

/// Where the task landed after one `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskProgress {
    /// Still working; more chunks expected.
    Working,
    /// Parked awaiting caller input. Ends the turn, not the task.
    InputRequired,
    /// Finished with an artifact.
    Completed,
}

/// Per-task state machine with ordered event emission.
pub struct TaskLifecycle {
    task: Arc<Mutex<Task>>,
    classifier: Arc<ResponseClassifier>,
    relay: Arc<EventRelay>,
}

impl TaskLifecycle {
    pub fn new(
        task: Arc<Mutex<Task>>,
        classifier: Arc<ResponseClassifier>,
        relay: Arc<EventRelay>,
    ) -> Self {
        Self {
            task,
            classifier,
            relay,
        }
    }

    /// Current state of the underlying task.
    pub async fn state(&self) -> TaskState {
        self.task.lock().await.state
    }

    /// Begin (or resume) a turn with the caller's query.
    ///
    /// Fails with `InvalidInput` on an empty query before any state
    /// change. A fresh task advances `submitted → working`; a task parked
    /// in `input_required` resumes to `working`.
    pub async fn start(&self, query: &str) -> Result<(), TaskError> {
        if query.trim().is_empty() {
            return Err(TaskError::InvalidInput("query is empty".to_string()));
        }

        let mut task = self.task.lock().await;
        match task.state {
            TaskState::Submitted => {
                task.transition_to(TaskState::Working, Some("started".to_string()))?;
            }
            TaskState::InputRequired => {
                task.transition_to(TaskState::Working, Some("caller supplied input".to_string()))?;
            }
            TaskState::Working => {
                // Already mid-turn; nothing to transition.
                return Ok(());
            }
            state => {
                return Err(TaskError::Terminal {
                    id: task.id.clone(),
                    state: state.to_string(),
                });
            }
        }

        tracing::debug!(task_id = %task.id, "Task started");
        let event = TaskEvent::status(
            &task,
            EventPayload::Text(WORKING_NARRATION.to_string()),
            false,
        );
        self.relay.forward(&event).await;
        Ok(())
    }

    /// Feed one completion chunk through the classifier and transition
    /// accordingly.
    pub async fn advance(&self, chunk: &str) -> Result<TaskProgress, TaskError> {
        let mut task = self.task.lock().await;
        if task.state.is_terminal() {
            return Err(TaskError::Terminal {
                id: task.id.clone(),
                state: task.state.to_string(),
            });
        }
        if task.state != TaskState::Working {
            task.transition_to(TaskState::Working, Some("chunk received".to_string()))?;
            let event = TaskEvent::status(
                &task,
                EventPayload::Text(WORKING_NARRATION.to_string()),
                false,
            );
            self.relay.forward(&event).await;
        }

        match self.classifier.classify(chunk) {
            Classification::Partial => {
                let narration = if chunk.trim().is_empty() {
                    WORKING_NARRATION.to_string()
                } else {
                    chunk.trim().to_string()
                };
                let event = TaskEvent::status(&task, EventPayload::Text(narration), false);
                self.relay.forward(&event).await;
                Ok(TaskProgress::Working)
            }
            Classification::InputRequired { question } => {
                task.transition_to(
                    TaskState::InputRequired,
                    Some("awaiting caller input".to_string()),
                )?;
                let event = TaskEvent::status(&task, EventPayload::Text(question), true);
                self.relay.forward(&event).await;
                Ok(TaskProgress::InputRequired)
            }
            Classification::Final(payload) => {
                task.transition_to(TaskState::Completed, None)?;
                let payload = match payload {
                    FinalPayload::Text(text) => EventPayload::Text(text),
                    FinalPayload::Data(value) => EventPayload::Data(value),
                };
                let event = TaskEvent::artifact(&task, payload);
                self.relay.forward(&event).await;
                tracing::info!(task_id = %task.id, "Task completed");
                Ok(TaskProgress::Completed)
            }
        }
    }

    /// Transition to `failed`, emit a truncated user-safe status event,
    /// and hand the original error back for re-raise.
    ///
    /// On an already-terminal task the state is untouched.
    pub async fn fail(&self, error: TaskError) -> TaskError {
        let mut task = self.task.lock().await;
        if task.state.is_terminal() {
            tracing::warn!(
                task_id = %task.id,
                state = %task.state,
                error = %error,
                "Failure reported on a terminal task; state unchanged"
            );
            return error;
        }

        let message = truncate_message(&error.to_string(), MAX_FAILURE_MESSAGE_CHARS);
        tracing::error!(task_id = %task.id, error = %error, "Task failed");

        if let Err(e) = task.transition_to(TaskState::Failed, Some(message.clone())) {
            // Unreachable on the lifecycle graph; never mask the original error.
            tracing::warn!(task_id = %task.id, error = %e, "Failure transition rejected");
            return error;
        }

        let event = TaskEvent::status(&task, EventPayload::Text(message), true);
        self.relay.forward(&event).await;
        error
    }

    /// Mid-flight cancellation is not supported and must be rejected
    /// explicitly, never silently accepted.
    pub async fn cancel(&self) -> Result<(), TaskError> {
        let task = self.task.lock().await;
        tracing::debug!(task_id = %task.id, "Cancellation rejected");
        Err(TaskError::Unsupported("task cancellation".to_string()))
    }
}

/// Truncate to at most `max_chars` characters, char-boundary safe, with a
/// trailing ellipsis when cut.
fn truncate_message(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let byte_offset = message
        .char_indices()
        .nth(keep)
        .map(|(i, _)| i)
        .unwrap_or(message.len());
    format!("{}...", &message[..byte_offset])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::{EventSink, StreamSink};
    use crate::task::event::TaskStatusUpdate;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio_stream::StreamExt;

    fn harness() -> (
        TaskLifecycle,
        tokio_stream::wrappers::ReceiverStream<TaskStatusUpdate>,
    ) {
        let (sink, stream) = StreamSink::channel(32);
        let task = Arc::new(Mutex::new(Task::new("t1", "ctx1")));
        let lifecycle = TaskLifecycle::new(
            task,
            Arc::new(ResponseClassifier::new()),
            Arc::new(EventRelay::new(Arc::new(sink))),
        );
        (lifecycle, stream)
    }

    #[tokio::test]
    async fn empty_query_is_invalid_input_with_no_state_change() {
        let (lifecycle, _stream) = harness();
        let err = lifecycle.start("   ").await.unwrap_err();
        assert!(matches!(err, TaskError::InvalidInput(_)));
        assert_eq!(lifecycle.state().await, TaskState::Submitted);
    }

    #[tokio::test]
    async fn start_advances_to_working_and_emits_status() {
        let (lifecycle, mut stream) = harness();
        lifecycle.start("book me a meeting").await.unwrap();
        assert_eq!(lifecycle.state().await, TaskState::Working);

        let update = stream.next().await.unwrap();
        assert!(!update.is_task_complete);
        assert!(!update.require_user_input);
        assert_eq!(update.response_type, "text");
    }

    #[tokio::test]
    async fn placeholder_chunk_keeps_working_then_json_asks_for_input() {
        let (lifecycle, mut stream) = harness();
        lifecycle.start("book me a meeting").await.unwrap();

        let progress = lifecycle.advance("...processing...").await.unwrap();
        assert_eq!(progress, TaskProgress::Working);
        assert_eq!(lifecycle.state().await, TaskState::Working);

        let chunk = "```json\n{\"status\":\"input_required\",\"question\":\"Which day?\"}\n```";
        let progress = lifecycle.advance(chunk).await.unwrap();
        assert_eq!(progress, TaskProgress::InputRequired);
        assert_eq!(lifecycle.state().await, TaskState::InputRequired);

        let _start = stream.next().await.unwrap();
        let _working = stream.next().await.unwrap();
        let question = stream.next().await.unwrap();
        assert!(question.require_user_input);
        assert_eq!(question.content, json!("Which day?"));
    }

    #[tokio::test]
    async fn final_chunk_completes_with_artifact() {
        let (lifecycle, mut stream) = harness();
        lifecycle.start("book it").await.unwrap();

        let progress = lifecycle.advance("All booked for Monday.").await.unwrap();
        assert_eq!(progress, TaskProgress::Completed);
        assert_eq!(lifecycle.state().await, TaskState::Completed);

        let _start = stream.next().await.unwrap();
        let artifact = stream.next().await.unwrap();
        assert!(artifact.is_task_complete);
        assert_eq!(artifact.content, json!("All booked for Monday."));
    }

    #[tokio::test]
    async fn input_required_then_resume() {
        let (lifecycle, _stream) = harness();
        lifecycle.start("book it").await.unwrap();
        lifecycle
            .advance("```json\n{\"status\":\"input_required\",\"question\":\"When?\"}\n```")
            .await
            .unwrap();
        assert_eq!(lifecycle.state().await, TaskState::InputRequired);

        lifecycle.start("Monday at ten").await.unwrap();
        assert_eq!(lifecycle.state().await, TaskState::Working);
    }

    #[tokio::test]
    async fn terminal_task_rejects_advance_and_ignores_fail() {
        let (lifecycle, _stream) = harness();
        lifecycle.start("book it").await.unwrap();
        lifecycle.advance("done").await.unwrap();
        assert_eq!(lifecycle.state().await, TaskState::Completed);

        let err = lifecycle.advance("more").await.unwrap_err();
        assert!(matches!(err, TaskError::Terminal { .. }));

        lifecycle
            .fail(TaskError::Upstream("late failure".to_string()))
            .await;
        assert_eq!(lifecycle.state().await, TaskState::Completed);
    }

    #[tokio::test]
    async fn fail_truncates_message_and_returns_original_error() {
        let (lifecycle, mut stream) = harness();
        lifecycle.start("book it").await.unwrap();

        let long = "x".repeat(2000);
        let returned = lifecycle.fail(TaskError::Upstream(long)).await;
        assert!(matches!(returned, TaskError::Upstream(_)));
        assert_eq!(lifecycle.state().await, TaskState::Failed);

        let _start = stream.next().await.unwrap();
        let failure = stream.next().await.unwrap();
        let content = failure.content.as_str().unwrap();
        assert!(content.chars().count() <= MAX_FAILURE_MESSAGE_CHARS);
        assert!(content.ends_with("..."));
    }

    #[tokio::test]
    async fn cancel_is_rejected_as_unsupported() {
        let (lifecycle, _stream) = harness();
        lifecycle.start("book it").await.unwrap();
        let err = lifecycle.cancel().await.unwrap_err();
        assert!(matches!(err, TaskError::Unsupported(_)));
        assert_eq!(lifecycle.state().await, TaskState::Working);
    }

    #[tokio::test]
    async fn emission_failure_never_masks_task_failure() {
        struct DeadSink;

        #[async_trait]
        impl EventSink for DeadSink {
            fn name(&self) -> &str {
                "dead"
            }
            async fn deliver(
                &self,
                _update: &TaskStatusUpdate,
            ) -> Result<(), crate::error::RelayError> {
                Err(crate::error::RelayError::Closed)
            }
        }

        let task = Arc::new(Mutex::new(Task::new("t1", "ctx1")));
        let lifecycle = TaskLifecycle::new(
            task,
            Arc::new(ResponseClassifier::new()),
            Arc::new(EventRelay::new(Arc::new(DeadSink))),
        );

        lifecycle.start("book it").await.unwrap();
        let returned = lifecycle
            .fail(TaskError::Upstream("provider down".to_string()))
            .await;
        assert!(matches!(returned, TaskError::Upstream(_)));
        assert_eq!(lifecycle.state().await, TaskState::Failed);
    }

    #[test]
    fn truncate_is_char_boundary_safe() {
        let message = "é".repeat(600);
        let truncated = truncate_message(&message, 500);
        assert!(truncated.chars().count() <= 500);
        assert!(truncated.ends_with("..."));

        let short = "fine as is";
        assert_eq!(truncate_message(short, 500), short);
    }
}
