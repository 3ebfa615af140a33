//! LLM client abstractions
//!
//! The router never talks to a provider directly. It goes through the
//! [`LLMClient`] trait so tests can substitute a scripted client and so any
//! OpenAI-compatible endpoint (OpenAI itself, a local Ollama server) can be used.

use crate::types::{Result, ToolCall, ToolDefinition};
use crate::utils::credentials::CredentialStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One message in a chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        ChatMessage::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }

    /// The wire role name.
    pub fn role(&self) -> &'static str {
        match self {
            ChatMessage::System { .. } => "system",
            ChatMessage::User { .. } => "user",
            ChatMessage::Assistant { .. } => "assistant",
            ChatMessage::Tool { .. } => "tool",
        }
    }
}

/// A single chat-completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model identifier, taken from the agent that is currently answering
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Functions offered to the model; empty means plain completion
    pub tools: Vec<ToolDefinition>,
}

/// Response from an LLM generation request
#[derive(Debug, Clone, Default)]
pub struct LLMResponse {
    /// The text content of the response
    pub content: String,
    /// Any tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
    /// The reason generation stopped (e.g., "stop", "tool_calls", "length")
    pub finish_reason: String,
}

impl LLMResponse {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Generic LLM client trait for provider abstraction
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Run one chat completion, optionally offering tools.
    async fn complete(&self, request: &CompletionRequest) -> Result<LLMResponse>;

    /// Human-readable provider name, for logs and `config` output
    fn provider_name(&self) -> &str;
}

/// Provider enum for runtime selection
///
/// Both variants speak the OpenAI chat-completions dialect; Ollama exposes a
/// compatible endpoint under `/v1`.
#[derive(Debug, Clone, PartialEq)]
pub enum Provider {
    /// OpenAI API (or any compatible gateway)
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_base: "https://api.openai.com/v1".to_string(),
    /// };
    /// ```
    OpenAI { api_base: String },

    /// Local Ollama server
    Ollama { base_url: String },
}

impl Provider {
    /// Base URL of the chat-completions API for this provider
    pub fn api_base(&self) -> String {
        match self {
            Provider::OpenAI { api_base } => api_base.trim_end_matches('/').to_string(),
            Provider::Ollama { base_url } => {
                format!("{}/v1", base_url.trim_end_matches('/'))
            }
        }
    }

    /// Whether requests must carry the API key
    pub fn requires_key(&self) -> bool {
        matches!(self, Provider::OpenAI { .. })
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }

    /// Create a client instance for this provider.
    ///
    /// The key is read from `credentials` on every request, so a key saved at
    /// runtime applies to the next call without rebuilding the client.
    pub fn create_client(&self, credentials: Arc<CredentialStore>) -> Result<Box<dyn LLMClient>> {
        Ok(Box::new(super::openai::OpenAIClient::new(
            self.clone(),
            credentials,
        )?))
    }
}
