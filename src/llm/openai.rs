use crate::llm::client::{ChatMessage, CompletionRequest, LLMClient, LLMResponse, Provider};
use crate::types::{AppError, Result, ToolCall, ToolDefinition};
use crate::utils::credentials::CredentialStore;
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessage,
        ChatCompletionTool, ChatCompletionToolChoiceOption, ChatCompletionToolType,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, FunctionCall,
        FunctionObject,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

/// Chat-completions client for OpenAI and compatible servers.
///
/// The API key is read from the [`CredentialStore`] on every request, so a
/// key saved mid-session applies to the next call.
pub struct OpenAIClient {
    http: reqwest::Client,
    provider: Provider,
    credentials: Arc<CredentialStore>,
}

impl OpenAIClient {
    pub fn new(provider: Provider, credentials: Arc<CredentialStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("swarm-chat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            provider,
            credentials,
        })
    }

    fn client(&self) -> Result<Client<OpenAIConfig>> {
        let api_key = match self.credentials.current() {
            Some(key) => key.expose().to_string(),
            None if self.provider.requires_key() => {
                return Err(AppError::Auth(format!(
                    "{} is not set; save a key before sending messages",
                    self.credentials.key_name()
                )));
            }
            None => String::new(),
        };

        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(self.provider.api_base());

        Ok(Client::with_config(config).with_http_client(self.http.clone()))
    }

    fn convert_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
        let converted = match message {
            ChatMessage::System { content } => ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage::from(content.clone()),
            ),
            ChatMessage::User { content } => ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessage::from(content.clone()),
            ),
            ChatMessage::Assistant {
                content,
                tool_calls,
            } => {
                let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                if !content.is_empty() || tool_calls.is_empty() {
                    args.content(content.clone());
                }
                if !tool_calls.is_empty() {
                    args.tool_calls(
                        tool_calls
                            .iter()
                            .map(|call| ChatCompletionMessageToolCall {
                                id: call.id.clone(),
                                r#type: ChatCompletionToolType::Function,
                                function: FunctionCall {
                                    name: call.name.clone(),
                                    arguments: call.arguments.to_string(),
                                },
                            })
                            .collect::<Vec<_>>(),
                    );
                }
                ChatCompletionRequestMessage::Assistant(args.build().map_err(build_error)?)
            }
            ChatMessage::Tool {
                tool_call_id,
                content,
            } => ChatCompletionRequestMessage::Tool(
                ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(tool_call_id.clone())
                    .content(content.clone())
                    .build()
                    .map_err(build_error)?,
            ),
        };
        Ok(converted)
    }

    fn convert_tool(tool: &ToolDefinition) -> ChatCompletionTool {
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                parameters: Some(tool.parameters.clone()),
                strict: None,
            },
        }
    }

    /// Build the chat-completions request for a completion request
    pub fn build_request(request: &CompletionRequest) -> Result<CreateChatCompletionRequest> {
        let messages = request
            .messages
            .iter()
            .map(Self::convert_message)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&request.model).messages(messages);

        if !request.tools.is_empty() {
            let tools: Vec<ChatCompletionTool> =
                request.tools.iter().map(Self::convert_tool).collect();
            args.tools(tools).tool_choice(ChatCompletionToolChoiceOption::Auto);
        }

        args.build().map_err(build_error)
    }

    fn map_api_error(&self, err: OpenAIError) -> AppError {
        let provider = self.provider.name();
        match err {
            OpenAIError::ApiError(api) => {
                let code = api.code.as_ref().map(ToString::to_string).unwrap_or_default();
                let kind = api.r#type.as_deref().unwrap_or_default();
                if code.contains("invalid_api_key") || kind == "authentication_error" {
                    AppError::Auth(format!("{} rejected the API key: {}", provider, api.message))
                } else {
                    AppError::LLM(format!("{} API error: {}", provider, api.message))
                }
            }
            other => AppError::LLM(format!("{} request failed: {}", provider, other)),
        }
    }
}

fn build_error(e: impl std::fmt::Display) -> AppError {
    AppError::LLM(format!("Failed to build request: {}", e))
}

fn parse_arguments(call: &ChatCompletionMessageToolCall) -> serde_json::Value {
    let raw = call.function.arguments.trim();
    if raw.is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!(
            tool = %call.function.name,
            error = %e,
            "Malformed tool-call arguments, using an empty object"
        );
        json!({})
    })
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<LLMResponse> {
        let client = self.client()?;
        let body = Self::build_request(request)?;

        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending chat completion"
        );

        let response = client
            .chat()
            .create(body)
            .await
            .map_err(|e| self.map_api_error(e))?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| AppError::LLM(format!("No response from {}", self.provider.name())))?;

        let content = choice.message.content.clone().unwrap_or_default();
        let finish_reason = choice
            .finish_reason
            .as_ref()
            .and_then(|r| serde_json::to_value(r).ok())
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());

        let tool_calls = match &choice.message.tool_calls {
            Some(calls) => calls
                .iter()
                .map(|call| ToolCall {
                    id: call.id.clone(),
                    name: call.function.name.clone(),
                    arguments: parse_arguments(call),
                })
                .collect(),
            None => vec![],
        };

        Ok(LLMResponse {
            content,
            tool_calls,
            finish_reason,
        })
    }

    fn provider_name(&self) -> &str {
        self.provider.name()
    }
}
