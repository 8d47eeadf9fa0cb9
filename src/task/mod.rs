//! Task lifecycle protocol.

pub mod event;
pub mod lifecycle;
pub mod manager;
pub mod state;

pub use event::{EventKind, EventPayload, TaskEvent, TaskStatusUpdate};
pub use lifecycle::{MAX_FAILURE_MESSAGE_CHARS, TaskLifecycle, TaskProgress};
pub use manager::TaskManager;
pub use state::{StateTransition, Task, TaskState};
