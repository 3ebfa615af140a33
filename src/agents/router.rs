use crate::agents::{Agent, AgentRegistry};
use crate::conversation::session::Exchange;
use crate::conversation::{Session, Turn};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Default upper bound on a single routing call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// What the model side reported for one routing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Id of the agent that produced the final answer
    pub responder: String,
    pub content: String,
}

/// Input to a routing call
#[derive(Debug, Clone, Copy)]
pub struct InvocationRequest<'a> {
    pub registry: &'a AgentRegistry,
    /// Agent the call starts with
    pub active: &'a Agent,
    /// Transcript including the new user turn
    pub context: &'a [Turn],
}

/// The "classify and select" port.
///
/// Implementations decide, however they like, which agent answers and what it
/// says. The router only checks that the answer came from an agent the active
/// agent was allowed to hand off to.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(&self, request: InvocationRequest<'_>) -> Result<Invocation>;
}

/// Result of routing one user message
#[derive(Debug, Clone)]
pub enum RouteOutcome {
    /// Blank input; nothing was recorded and no call was made
    Ignored,
    /// The model answered; `responder` is now the active agent
    Answered {
        responder: Arc<Agent>,
        text: String,
        handed_off: bool,
    },
    /// The call failed; an error turn was recorded and `agent` stays active
    Failed { agent: Arc<Agent>, error: String },
}

impl RouteOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, RouteOutcome::Answered { .. })
    }

    /// `(speaker, text)` as a front-end would print it
    pub fn display_pair(&self) -> Option<(&str, String)> {
        match self {
            RouteOutcome::Ignored => None,
            RouteOutcome::Answered {
                responder, text, ..
            } => Some((responder.name(), text.clone())),
            RouteOutcome::Failed { agent, error } => {
                Some((agent.name(), format!("Error: {}", error)))
            }
        }
    }
}

/// Conversation router: runs a user message through the model port and
/// records the outcome in the session.
pub struct Router {
    registry: Arc<AgentRegistry>,
    invoker: Arc<dyn ModelInvoker>,
    timeout: Duration,
}

impl Router {
    pub fn new(registry: Arc<AgentRegistry>, invoker: Arc<dyn ModelInvoker>) -> Self {
        Self {
            registry,
            invoker,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bound every routing call by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Route one user message within `session`.
    ///
    /// Blank input is a no-op. Otherwise exactly two turns are appended: the
    /// user turn and either the reply or a synthetic error turn.
    pub async fn route(&self, session: &mut Session, user_text: &str) -> Result<RouteOutcome> {
        let Some(exchange) = session.prepare(user_text) else {
            return Ok(RouteOutcome::Ignored);
        };

        let result = self.resolve(&exchange).await;
        session.commit(exchange, result)
    }

    /// Run the model call for a prepared exchange without touching the session.
    pub async fn resolve(&self, exchange: &Exchange) -> Result<(Arc<Agent>, String)> {
        let active = &exchange.active;
        let request = InvocationRequest {
            registry: &self.registry,
            active: active.as_ref(),
            context: &exchange.context,
        };

        tracing::info!(agent = %active.id(), turns = exchange.context.len(), "Routing message");

        let call = self.invoker.invoke(request);
        let invocation = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(invocation)) => invocation,
            Ok(Err(e)) => {
                tracing::warn!(agent = %active.id(), error = %e, "Model call failed");
                return Err(e);
            }
            Err(_) => {
                tracing::warn!(
                    agent = %active.id(),
                    timeout = ?self.timeout,
                    "Model call timed out"
                );
                return Err(AppError::LLM(format!(
                    "No reply within {} seconds",
                    self.timeout.as_secs()
                )));
            }
        };

        let responder = self
            .registry
            .get(&invocation.responder)
            .cloned()
            .ok_or_else(|| {
                AppError::LLM(format!(
                    "Model named unknown agent '{}' as responder",
                    invocation.responder
                ))
            })?;

        if !self.registry.can_reach(active.id(), responder.id()) {
            return Err(AppError::LLM(format!(
                "{} cannot hand off to {}",
                active.name(),
                responder.name()
            )));
        }

        if responder.id() != active.id() {
            tracing::info!(from = %active.id(), to = %responder.id(), "Hand-off");
        }

        Ok((responder, invocation.content))
    }
}
