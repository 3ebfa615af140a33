use crate::agents::{Agent, AgentRegistry, RouteOutcome};
use crate::conversation::{ExchangeView, Transcript, Turn};
use crate::types::{AppError, Result};
use std::sync::Arc;
use uuid::Uuid;

/// Snapshot of a session taken when a user message is submitted.
///
/// Nothing is written to the session until the exchange is committed, so an
/// exchange that is dropped (cancelled, superseded) leaves no trace.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// The user turn that will be recorded on commit
    pub user_turn: Turn,
    /// Agent that was active when the message was submitted
    pub active: Arc<Agent>,
    /// Transcript context plus the new user turn, as sent to the model
    pub context: Vec<Turn>,
    base_len: usize,
}

/// One conversation: the transcript and the currently active agent
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    registry: Arc<AgentRegistry>,
    active: Arc<Agent>,
    transcript: Transcript,
}

impl Session {
    /// Start a session on the registry's dispatcher with an empty transcript
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        let active = Arc::clone(registry.dispatcher());
        Self {
            id: Uuid::new_v4(),
            registry,
            active,
            transcript: Transcript::new(),
        }
    }

    /// Start a session whose transcript opens with an unanswered user turn
    pub fn with_seed(registry: Arc<AgentRegistry>, seed: &str) -> Self {
        let mut session = Self::new(registry);
        if !seed.trim().is_empty() {
            session.transcript.push(Turn::user(seed.trim()));
        }
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn active_agent(&self) -> &Arc<Agent> {
        &self.active
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Make another catalog agent active (the front-end switched tabs).
    pub fn select_agent(&mut self, key: &str) -> Result<&Arc<Agent>> {
        let agent = self
            .registry
            .find(key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("No agent named '{}'", key.trim())))?;
        tracing::debug!(session = %self.id, agent = %agent.id(), "Agent selected");
        self.active = agent;
        Ok(&self.active)
    }

    /// Exchanges answered by the agent with `id`
    pub fn view_for(&self, id: &str) -> Vec<ExchangeView<'_>> {
        self.transcript
            .exchanges()
            .into_iter()
            .filter(|e| e.reply.speaker.as_ref().is_some_and(|s| s.id == id))
            .collect()
    }

    /// Snapshot the session for a new user message. Blank input yields `None`.
    pub fn prepare(&self, user_text: &str) -> Option<Exchange> {
        let text = user_text.trim();
        if text.is_empty() {
            return None;
        }

        let user_turn = Turn::user(text);
        let mut context = self.transcript.context();
        context.push(user_turn.clone());

        Some(Exchange {
            user_turn,
            active: Arc::clone(&self.active),
            context,
            base_len: self.transcript.len(),
        })
    }

    /// Record the outcome of a prepared exchange.
    ///
    /// On success the user turn and the reply are appended and the responder
    /// becomes active. On failure the user turn and a synthetic error turn are
    /// appended and the active agent stays as it was. An exchange prepared
    /// before the transcript last changed is rejected with `Cancelled`.
    pub fn commit(
        &mut self,
        exchange: Exchange,
        result: Result<(Arc<Agent>, String)>,
    ) -> Result<RouteOutcome> {
        if exchange.base_len != self.transcript.len() {
            return Err(AppError::Cancelled);
        }

        self.transcript.push(exchange.user_turn);

        match result {
            Ok((responder, text)) => {
                let handed_off = responder.id() != exchange.active.id();
                self.transcript.push(Turn::assistant(&responder, text.clone()));
                self.active = Arc::clone(&responder);
                Ok(RouteOutcome::Answered {
                    responder,
                    text,
                    handed_off,
                })
            }
            Err(error) => {
                self.transcript
                    .push(Turn::failure(&exchange.active, &error));
                Ok(RouteOutcome::Failed {
                    agent: exchange.active,
                    error: error.to_string(),
                })
            }
        }
    }
}
