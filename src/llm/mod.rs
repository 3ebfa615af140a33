//! LLM Provider Clients and Abstractions
//!
//! - [`LLMClient`] - The core trait that the hand-off runtime calls
//! - [`Provider`] - Runtime provider selection (OpenAI, Ollama)
//! - [`openai::OpenAIClient`] - OpenAI-compatible chat-completions client with tool calling

/// Core LLM client trait and request/response types.
pub mod client;
/// OpenAI-compatible HTTP client.
pub mod openai;

pub use client::{ChatMessage, CompletionRequest, LLMClient, LLMResponse, Provider};
