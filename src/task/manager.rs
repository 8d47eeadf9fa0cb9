//! Task bookkeeping — one live task per conversation context.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::task::state::Task;

/// Owns the `context_id → task` map. Constructed explicitly and passed to
/// the composing application; retention beyond the map is an external
/// collaborator's concern.
pub struct TaskManager {
    tasks: RwLock<HashMap<String, Arc<Mutex<Task>>>>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }

    /// Get the live task for `context_id`, creating one when the context
    /// has none or its previous task already reached a terminal state.
    ///
    /// Missing ids are generated on first contact.
    pub async fn resolve(
        &self,
        context_id: Option<&str>,
        task_id: Option<&str>,
    ) -> (String, Arc<Mutex<Task>>) {
        let context_id = context_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        {
            let tasks = self.tasks.read().await;
            if let Some(existing) = tasks.get(&context_id) {
                if existing.lock().await.state.is_active() {
                    return (context_id, Arc::clone(existing));
                }
            }
        }

        let task_id = task_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let task = Arc::new(Mutex::new(Task::new(task_id, context_id.clone())));
        self.tasks
            .write()
            .await
            .insert(context_id.clone(), Arc::clone(&task));
        tracing::debug!(context_id, "Created task");
        (context_id, task)
    }

    /// Get the task for a context, if any.
    pub async fn get(&self, context_id: &str) -> Option<Arc<Mutex<Task>>> {
        self.tasks.read().await.get(context_id).cloned()
    }

    /// Number of tracked contexts.
    pub async fn count(&self) -> usize {
        self.tasks.read().await.len()
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}
