//! Conversation state
//!
//! A [`Transcript`] is the append-only log of user and assistant turns. It is
//! the context window for every routing call. A [`Session`] pairs one
//! transcript with the currently active agent; the [`Dispatcher`] runs routing
//! calls for a session in the background.

pub mod dispatcher;
pub mod session;

pub use dispatcher::{Dispatcher, PendingReply};
pub use session::{Exchange, Session};

use crate::agents::Agent;
use crate::llm::ChatMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// The agent an assistant turn is attributed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    pub id: String,
    pub name: String,
}

impl From<&Agent> for Speaker {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id().to_string(),
            name: agent.name().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Set on assistant turns only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<Speaker>,
    /// Synthetic turn recording a failed model call
    #[serde(default)]
    pub failed: bool,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            speaker: None,
            failed: false,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(agent: &Agent, content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            speaker: Some(Speaker::from(agent)),
            failed: false,
            timestamp: Utc::now(),
        }
    }

    /// Visible record of a failed call, attributed to the agent that was asked
    pub fn failure(agent: &Agent, error: impl std::fmt::Display) -> Self {
        Self {
            role: Role::Assistant,
            content: format!("Error: {}", error),
            speaker: Some(Speaker::from(agent)),
            failed: true,
            timestamp: Utc::now(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// Display name of the producing agent, if any
    pub fn speaker_name(&self) -> Option<&str> {
        self.speaker.as_ref().map(|s| s.name.as_str())
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        match turn.role {
            Role::User => ChatMessage::user(turn.content.clone()),
            Role::Assistant => ChatMessage::assistant(turn.content.clone()),
        }
    }
}

/// A user turn and the assistant turn that answered it
#[derive(Debug, Clone, Copy)]
pub struct ExchangeView<'a> {
    pub user: &'a Turn,
    pub reply: &'a Turn,
}

/// Ordered, append-only log of turns
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn. There is no way to edit or remove one.
    pub(crate) fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Turns sent to the model: synthetic failure turns are left out
    pub fn context(&self) -> Vec<Turn> {
        self.turns.iter().filter(|t| !t.failed).cloned().collect()
    }

    /// Answered exchanges in order. A user turn with no reply yet is skipped.
    pub fn exchanges(&self) -> Vec<ExchangeView<'_>> {
        self.turns
            .windows(2)
            .filter_map(|pair| match (&pair[0], &pair[1]) {
                (user, reply) if user.is_user() && !reply.is_user() => {
                    Some(ExchangeView { user, reply })
                }
                _ => None,
            })
            .collect()
    }

    /// Exchanges grouped by the agent that answered them (keyed by agent id)
    ///
    /// This is the tabbed layout: every agent owns the part of the
    /// conversation it answered.
    pub fn partition_by_agent(&self) -> BTreeMap<String, Vec<ExchangeView<'_>>> {
        let mut partitions: BTreeMap<String, Vec<ExchangeView<'_>>> = BTreeMap::new();
        for exchange in self.exchanges() {
            if let Some(speaker) = &exchange.reply.speaker {
                partitions
                    .entry(speaker.id.clone())
                    .or_default()
                    .push(exchange);
            }
        }
        partitions
    }
}
