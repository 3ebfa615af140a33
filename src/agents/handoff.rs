//! LLM-backed hand-off runtime
//!
//! Each hand-off an agent declares is offered to the model as a tool named
//! `transfer_to_<id>`. When the model calls one, the tool call and its result
//! are appended to the working message list, the target agent takes over and
//! the model is asked again with the target's instructions and tools. The
//! first reply without a tool call is the answer, and whoever was answering
//! at that point is the responder.

use crate::agents::router::{Invocation, InvocationRequest, ModelInvoker};
use crate::agents::Agent;
use crate::llm::{ChatMessage, CompletionRequest, LLMClient};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Default bound on hand-offs within one routing call
pub const DEFAULT_MAX_HANDOFFS: usize = 10;

pub struct SwarmInvoker {
    llm: Arc<dyn LLMClient>,
    max_handoffs: usize,
}

impl SwarmInvoker {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self {
            llm,
            max_handoffs: DEFAULT_MAX_HANDOFFS,
        }
    }

    pub fn with_max_handoffs(mut self, max_handoffs: usize) -> Self {
        self.max_handoffs = max_handoffs;
        self
    }

    fn completion_request(
        request: &InvocationRequest<'_>,
        agent: &Agent,
        messages: &[ChatMessage],
    ) -> CompletionRequest {
        let mut prompt = Vec::with_capacity(messages.len() + 1);
        prompt.push(ChatMessage::system(agent.instructions()));
        prompt.extend(messages.iter().cloned());

        CompletionRequest {
            model: agent.model().to_string(),
            messages: prompt,
            tools: request.registry.handoff_tools(agent),
        }
    }
}

#[async_trait]
impl ModelInvoker for SwarmInvoker {
    async fn invoke(&self, request: InvocationRequest<'_>) -> Result<Invocation> {
        let mut agent: Arc<Agent> = request
            .registry
            .get(request.active.id())
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!("Agent '{}' is not in the catalog", request.active.id()))
            })?;
        let mut messages: Vec<ChatMessage> =
            request.context.iter().map(ChatMessage::from).collect();
        let mut handoffs = 0;

        loop {
            let completion = Self::completion_request(&request, &agent, &messages);
            let response = self.llm.complete(&completion).await?;

            if !response.has_tool_calls() {
                tracing::debug!(agent = %agent.id(), handoffs, "Agent answered");
                return Ok(Invocation {
                    responder: agent.id().to_string(),
                    content: response.content,
                });
            }

            if handoffs >= self.max_handoffs {
                return Err(AppError::LLM(format!(
                    "Gave up after {} hand-offs without an answer",
                    handoffs
                )));
            }

            // Every call needs a tool result; the last hand-off wins.
            let mut next = None;
            let mut results = Vec::with_capacity(response.tool_calls.len());
            for call in &response.tool_calls {
                let target = request
                    .registry
                    .resolve_handoff_tool(&agent, &call.name)
                    .ok_or_else(|| {
                        AppError::LLM(format!(
                            "{} called unknown tool '{}'",
                            agent.name(),
                            call.name
                        ))
                    })?;
                results.push(ChatMessage::tool(
                    call.id.clone(),
                    serde_json::json!({ "assistant": target.name() }).to_string(),
                ));
                next = Some(Arc::clone(target));
            }

            messages.push(ChatMessage::Assistant {
                content: response.content,
                tool_calls: response.tool_calls,
            });
            messages.extend(results);

            if let Some(target) = next {
                tracing::debug!(from = %agent.id(), to = %target.id(), "Model requested hand-off");
                agent = target;
            }
            handoffs += 1;
        }
    }
}
