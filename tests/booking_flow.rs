//! End-to-end flows: booking through the tool surface, and a task turn
//! driven from a scripted chunk stream.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use serde_json::json;
use tokio_stream::StreamExt;

use agent_relay::agent::{QueryAgent, TaskRunner};
use agent_relay::calendar::{BookingService, CalendarStore};
use agent_relay::classify::ResponseClassifier;
use agent_relay::error::LlmError;
use agent_relay::llm::ChunkStream;
use agent_relay::relay::{EventRelay, StreamSink};
use agent_relay::task::{TaskManager, TaskProgress, TaskState};
use agent_relay::tools::builtin::BookMeetingTool;
use agent_relay::tools::{Tool, ToolContext};

fn booking_tool(dir: &tempfile::TempDir) -> (BookMeetingTool, Arc<CalendarStore>) {
    let store = Arc::new(CalendarStore::new(dir.path().join("calendar.json")));
    let booking = Arc::new(BookingService::new(Arc::clone(&store)));
    (BookMeetingTool::new(booking), store)
}

async fn book(tool: &BookMeetingTool, requester: &str, start: &str, duration: i64) -> String {
    let params = json!({
        "requester": requester,
        "start": start,
        "duration": duration,
        "message": "sync"
    });
    let output = tool.execute(params, &ToolContext::default()).await.unwrap();
    output.result.as_str().unwrap().to_string()
}

#[tokio::test]
async fn booking_scenarios_against_one_calendar() {
    let dir = tempfile::tempdir().unwrap();
    let (tool, store) = booking_tool(&dir);

    // Empty calendar books fine.
    assert_eq!(book(&tool, "alice", "2024-01-01T10:00:00", 30).await, "SUCCESS");
    assert_eq!(store.load().await.unwrap().len(), 1);

    // [10:15, 10:45) overlaps [10:00, 10:30).
    let before = tokio::fs::read(store.path()).await.unwrap();
    assert_eq!(book(&tool, "bob", "2024-01-01T10:15:00", 30).await, "CONFLICT");
    assert_eq!(store.load().await.unwrap().len(), 1);

    // The rejected attempt leaves the document byte-for-byte unchanged.
    let after = tokio::fs::read(store.path()).await.unwrap();
    assert_eq!(before, after);

    // [10:30, 10:45) abuts but does not overlap.
    assert_eq!(book(&tool, "carol", "2024-01-01T10:30:00", 15).await, "SUCCESS");

    // Round trip: exactly the previous events plus the new one.
    let events = store.load().await.unwrap();
    assert_eq!(events.len(), 2);
    let requesters: Vec<&str> = events.iter().map(|e| e.requester.as_str()).collect();
    assert!(requesters.contains(&"alice"));
    assert!(requesters.contains(&"carol"));
}

struct ScriptedAgent {
    chunks: Vec<String>,
}

impl ScriptedAgent {
    fn new(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[async_trait]
impl QueryAgent for ScriptedAgent {
    fn capability(&self) -> &str {
        "scripted"
    }

    async fn stream(&self, _query: &str, _context_id: &str) -> Result<ChunkStream, LlmError> {
        let chunks: Vec<Result<String, LlmError>> = self.chunks.iter().cloned().map(Ok).collect();
        Ok(Box::pin(stream::iter(chunks)))
    }
}

#[tokio::test]
async fn task_turn_parks_for_input_then_completes() {
    let (sink, mut events) = StreamSink::channel(64);
    let runner = TaskRunner::new(
        Arc::new(TaskManager::new()),
        Arc::new(ResponseClassifier::new()),
        Arc::new(EventRelay::new(Arc::new(sink))),
    );

    // Turn one: a processing placeholder keeps the task working, then the
    // fenced reply parks it for input.
    let agent = ScriptedAgent::new(&[
        "...processing...",
        "```json\n{\"status\":\"input_required\",\"question\":\"Which day?\"}\n```",
    ]);
    let progress = runner
        .run_turn(&agent, "book me a meeting", Some("ctx1"), None)
        .await
        .unwrap();
    assert_eq!(progress, TaskProgress::InputRequired);

    // Events arrive in emission order: start, placeholder, question.
    let start = events.next().await.unwrap();
    assert!(!start.require_user_input);
    let placeholder = events.next().await.unwrap();
    assert_eq!(placeholder.content, json!("...processing..."));
    let question = events.next().await.unwrap();
    assert!(question.require_user_input);
    assert_eq!(question.content, json!("Which day?"));

    // Turn two: the caller answers and the same task resumes to completion.
    let agent = ScriptedAgent::new(&["```json\n{\"booked\": true}\n```"]);
    let progress = runner
        .run_turn(&agent, "Monday at ten", Some("ctx1"), None)
        .await
        .unwrap();
    assert_eq!(progress, TaskProgress::Completed);

    let resumed = events.next().await.unwrap();
    assert!(!resumed.is_task_complete);
    let artifact = events.next().await.unwrap();
    assert!(artifact.is_task_complete);
    assert_eq!(artifact.response_type, "data");
    assert_eq!(artifact.content["booked"], true);

    // Terminality: the finished task never transitions again.
    let task = runner.manager().get("ctx1").await.unwrap();
    assert_eq!(task.lock().await.state, TaskState::Completed);
}
