//! Mock implementations for testing.
//!
//! Mock LLM clients and model invokers shared by the integration tests, so
//! none of them needs a network connection.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use swarm_chat::agents::{Invocation, InvocationRequest, ModelInvoker};
use swarm_chat::llm::{CompletionRequest, LLMClient, LLMResponse};
use swarm_chat::types::{AppError, Result, ToolCall};

/// Mock LLM client that replays a script of responses.
///
/// Every request is recorded so tests can inspect what was sent. Once the
/// script runs out the client fails like an unreachable server would.
///
/// # Examples
///
/// ```ignore
/// // Dispatcher hands off to BGB, BGB answers
/// let client = MockLLMClient::scripted(vec![
///     MockLLMClient::handoff("bgb"),
///     MockLLMClient::answer("§ 433 BGB"),
/// ]);
///
/// // Every call fails
/// let client = MockLLMClient::failing();
/// ```
#[derive(Default)]
pub struct MockLLMClient {
    script: Mutex<VecDeque<LLMResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
    should_fail: bool,
}

impl MockLLMClient {
    /// Create a mock client that answers every request with `response`.
    pub fn new(response: &str) -> Self {
        Self::scripted(vec![Self::answer(response); 16])
    }

    /// Create a mock client that returns the given responses in order.
    pub fn scripted(responses: Vec<LLMResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// A plain text reply
    pub fn answer(text: &str) -> LLMResponse {
        LLMResponse {
            content: text.to_string(),
            tool_calls: vec![],
            finish_reason: "stop".to_string(),
        }
    }

    /// A reply that calls the hand-off tool for `agent_id`
    pub fn handoff(agent_id: &str) -> LLMResponse {
        LLMResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: format!("call_{}", agent_id),
                name: format!("transfer_to_{}", agent_id),
                arguments: serde_json::json!({}),
            }],
            finish_reason: "tool_calls".to_string(),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<LLMResponse> {
        self.requests.lock().push(request.clone());
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        self.script
            .lock()
            .pop_front()
            .ok_or_else(|| AppError::LLM("Connection refused".to_string()))
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}

/// Model port that skips the LLM entirely and reports a fixed responder.
pub struct MockInvoker {
    responder: Option<String>,
    content: String,
    calls: AtomicUsize,
}

impl MockInvoker {
    /// The active agent answers with `content`
    pub fn echo_active(content: &str) -> Self {
        Self {
            responder: None,
            content: content.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    /// The agent with id `responder` answers with `content`
    pub fn responder(responder: &str, content: &str) -> Self {
        Self {
            responder: Some(responder.to_string()),
            content: content.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelInvoker for MockInvoker {
    async fn invoke(&self, request: InvocationRequest<'_>) -> Result<Invocation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let responder = self
            .responder
            .clone()
            .unwrap_or_else(|| request.active.id().to_string());
        Ok(Invocation {
            responder,
            content: self.content.clone(),
        })
    }
}
