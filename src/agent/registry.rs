//! Agent selection — capability tags mapped to factories.
//!
//! Callers never compare agent names at call sites; they ask the registry
//! for a capability and get a constructed agent back.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::LlmError;
use crate::llm::{ChatMessage, ChunkStream, CompletionRequest, LlmProvider, ToolDefinition};

/// An agent that answers queries as a stream of completion chunks.
#[async_trait]
pub trait QueryAgent: Send + Sync {
    /// Capability tag this agent serves.
    fn capability(&self) -> &str;

    /// Stream completion chunks for one query turn.
    async fn stream(&self, query: &str, context_id: &str) -> Result<ChunkStream, LlmError>;
}

/// LLM-backed query agent with a fixed preamble.
pub struct LlmQueryAgent {
    capability: String,
    provider: Arc<dyn LlmProvider>,
    system_prompt: String,
    tools: Vec<ToolDefinition>,
}

impl LlmQueryAgent {
    pub fn new(
        capability: impl Into<String>,
        provider: Arc<dyn LlmProvider>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            capability: capability.into(),
            provider,
            system_prompt: system_prompt.into(),
            tools: Vec::new(),
        }
    }

    /// Advertise tool definitions to the model via the preamble.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    fn preamble(&self) -> String {
        if self.tools.is_empty() {
            return self.system_prompt.clone();
        }
        let definitions = serde_json::to_string_pretty(&self.tools).unwrap_or_default();
        format!("{}\n\nAvailable tools:\n{}", self.system_prompt, definitions)
    }
}

#[async_trait]
impl QueryAgent for LlmQueryAgent {
    fn capability(&self) -> &str {
        &self.capability
    }

    async fn stream(&self, query: &str, context_id: &str) -> Result<ChunkStream, LlmError> {
        tracing::debug!(
            capability = %self.capability,
            context_id,
            model = self.provider.model_name(),
            "Starting completion stream"
        );
        let request = CompletionRequest::new(vec![
            ChatMessage::system(self.preamble()),
            ChatMessage::user(query),
        ]);
        self.provider.stream_completion(request).await
    }
}

/// Factory producing a configured agent for one capability.
pub type AgentFactory = Box<dyn Fn() -> Arc<dyn QueryAgent> + Send + Sync>;

/// Registry mapping capability tags to agent factories.
pub struct AgentRegistry {
    factories: RwLock<HashMap<String, AgentFactory>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Register a factory for a capability.
    pub async fn register(&self, capability: impl Into<String>, factory: AgentFactory) {
        let capability = capability.into();
        self.factories
            .write()
            .await
            .insert(capability.clone(), factory);
        tracing::debug!("Registered agent capability: {}", capability);
    }

    /// Construct the agent for a capability.
    pub async fn create(&self, capability: &str) -> Option<Arc<dyn QueryAgent>> {
        self.factories.read().await.get(capability).map(|f| f())
    }

    /// List registered capability tags.
    pub async fn capabilities(&self) -> Vec<String> {
        self.factories.read().await.keys().cloned().collect()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
