//! Bridges rig-core completion models to the `LlmProvider` trait.

use async_trait::async_trait;
use rig::completion::{AssistantContent, CompletionModel, Message};

use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, MessageRole,
};

/// Adapter from rig's `CompletionModel` to our provider trait.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
}

impl<M> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + Send + Sync,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        // rig has no system role in chat history; system messages fold
        // into the preamble. The last user message is the prompt, the
        // rest become history.
        let mut preamble = String::new();
        let mut history: Vec<Message> = Vec::new();
        let mut prompt: Option<String> = None;

        for message in request.messages {
            match message.role {
                MessageRole::System => {
                    if !preamble.is_empty() {
                        preamble.push('\n');
                    }
                    preamble.push_str(&message.content);
                }
                MessageRole::User => {
                    if let Some(previous) = prompt.take() {
                        history.push(Message::user(previous));
                    }
                    prompt = Some(message.content);
                }
                MessageRole::Assistant => {
                    history.push(Message::assistant(message.content));
                }
            }
        }

        let prompt = prompt.ok_or_else(|| LlmError::InvalidResponse {
            provider: "rig".to_string(),
            reason: "completion request has no user message".to_string(),
        })?;

        let mut builder = self.model.completion_request(Message::user(prompt));
        if !preamble.is_empty() {
            builder = builder.preamble(preamble);
        }
        if !history.is_empty() {
            builder = builder.messages(history);
        }

        let response = self.model.completion(builder.build()).await.map_err(|e| {
            LlmError::RequestFailed {
                provider: self.model_name.clone(),
                reason: e.to_string(),
            }
        })?;

        let content = response
            .choice
            .into_iter()
            .filter_map(|part| match part {
                AssistantContent::Text(text) => Some(text.text),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(CompletionResponse {
            content,
            input_tokens: response.usage.input_tokens as u32,
            output_tokens: response.usage.output_tokens as u32,
        })
    }
}
