//! Turn runner — drives a task lifecycle from an agent's chunk stream.

use std::sync::Arc;

use futures::StreamExt;

use crate::agent::registry::QueryAgent;
use crate::classify::ResponseClassifier;
use crate::error::TaskError;
use crate::relay::EventRelay;
use crate::task::{TaskLifecycle, TaskManager, TaskProgress};

/// Drives one turn at a time: start the task, pull completion chunks,
/// feed each through the lifecycle until the turn ends.
pub struct TaskRunner {
    manager: Arc<TaskManager>,
    classifier: Arc<ResponseClassifier>,
    relay: Arc<EventRelay>,
}

impl TaskRunner {
    pub fn new(
        manager: Arc<TaskManager>,
        classifier: Arc<ResponseClassifier>,
        relay: Arc<EventRelay>,
    ) -> Self {
        Self {
            manager,
            classifier,
            relay,
        }
    }

    pub fn manager(&self) -> &Arc<TaskManager> {
        &self.manager
    }

    /// Run one turn for `query` against `agent`.
    ///
    /// Upstream failures are caught here, converted into a `failed`
    /// terminal state with a truncated message, and returned as
    /// `TaskError::Upstream` — raw provider errors never cross this
    /// boundary.
    pub async fn run_turn(
        &self,
        agent: &dyn QueryAgent,
        query: &str,
        context_id: Option<&str>,
        task_id: Option<&str>,
    ) -> Result<TaskProgress, TaskError> {
        let (context_id, task) = self.manager.resolve(context_id, task_id).await;
        let lifecycle = TaskLifecycle::new(
            task,
            Arc::clone(&self.classifier),
            Arc::clone(&self.relay),
        );

        // Validation failures surface immediately, before any upstream call.
        lifecycle.start(query).await?;

        let mut chunks = match agent.stream(query, &context_id).await {
            Ok(chunks) => chunks,
            Err(e) => {
                return Err(lifecycle.fail(TaskError::Upstream(e.to_string())).await);
            }
        };

        while let Some(chunk) = chunks.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    return Err(lifecycle.fail(TaskError::Upstream(e.to_string())).await);
                }
            };
            match lifecycle.advance(&chunk).await {
                Ok(TaskProgress::Working) => continue,
                Ok(progress) => return Ok(progress),
                Err(e) => return Err(lifecycle.fail(e).await),
            }
        }

        // The stream dried up without a final chunk; the task must not be
        // left dangling in `working`.
        Err(lifecycle
            .fail(TaskError::Upstream(
                "completion stream ended without a final result".to_string(),
            ))
            .await)
    }
}
