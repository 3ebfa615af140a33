//! Agent Registry
//!
//! Holds the fixed catalog of agents: one dispatcher plus any number of
//! specialists, and the directed hand-off graph between them. The registry is
//! validated once when it is built; a hand-off that names an agent missing
//! from the catalog is a programming error and fails construction.
//!
//! The registry never decides who answers. It only answers questions about
//! the graph (which agents exist, which are reachable from which) so the
//! router can reject a responder the model was not allowed to pick.

use crate::agents::{handoff_tool_name, Agent, HANDOFF_TOOL_PREFIX};
use crate::types::{AppError, Result, ToolDefinition};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

/// Immutable catalog of agents and their hand-off capabilities
#[derive(Debug)]
pub struct AgentRegistry {
    /// Agents in declaration order
    agents: Vec<Arc<Agent>>,
    /// Agent id -> position in `agents`
    index: HashMap<String, usize>,
    /// Id of the agent every session starts with
    dispatcher: String,
}

impl AgentRegistry {
    /// Start declaring a registry
    pub fn builder() -> AgentRegistryBuilder {
        AgentRegistryBuilder::new()
    }

    /// Get an agent by id
    pub fn get(&self, id: &str) -> Option<&Arc<Agent>> {
        self.index.get(id).map(|&i| &self.agents[i])
    }

    /// Get an agent by its display name
    pub fn get_by_name(&self, name: &str) -> Option<&Arc<Agent>> {
        self.agents.iter().find(|a| a.name() == name)
    }

    /// Look an agent up by id or display name, ignoring case
    ///
    /// Used by front-ends where the user types which agent they want to see.
    pub fn find(&self, key: &str) -> Option<&Arc<Agent>> {
        let key = key.trim();
        self.get(key).or_else(|| {
            self.agents
                .iter()
                .find(|a| a.id().eq_ignore_ascii_case(key) || a.name().eq_ignore_ascii_case(key))
        })
    }

    /// The dispatcher agent
    pub fn dispatcher(&self) -> &Arc<Agent> {
        // Presence is checked by the builder
        &self.agents[self.index[&self.dispatcher]]
    }

    /// All agents in declaration order
    pub fn agents(&self) -> impl Iterator<Item = &Arc<Agent>> {
        self.agents.iter()
    }

    pub fn agent_ids(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.id().to_string()).collect()
    }

    pub fn agent_names(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.name().to_string()).collect()
    }

    pub fn has_agent(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Direct hand-off targets of an agent
    pub fn handoff_targets(&self, id: &str) -> Vec<&Arc<Agent>> {
        self.get(id)
            .map(|agent| {
                agent
                    .handoffs()
                    .iter()
                    .filter_map(|target| self.get(target))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether `to` can become the responder of a call that starts at `from`.
    ///
    /// An agent always reaches itself; otherwise `to` must be reachable by
    /// following hand-off edges, since a specialist may hand off again.
    pub fn can_reach(&self, from: &str, to: &str) -> bool {
        if !self.has_agent(from) || !self.has_agent(to) {
            return false;
        }
        if from == to {
            return true;
        }

        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            for target in self.handoff_targets(current) {
                if target.id() == to {
                    return true;
                }
                queue.push_back(target.id());
            }
        }
        false
    }

    /// The hand-off graph as id -> set of target ids
    pub fn capability_graph(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.agents
            .iter()
            .map(|a| {
                (
                    a.id().to_string(),
                    a.handoffs().iter().cloned().collect::<BTreeSet<_>>(),
                )
            })
            .collect()
    }

    /// Tool definitions offered to the model while `agent` is answering
    pub fn handoff_tools(&self, agent: &Agent) -> Vec<ToolDefinition> {
        agent
            .handoffs()
            .iter()
            .filter_map(|target| self.get(target))
            .map(|target| ToolDefinition {
                name: handoff_tool_name(target.id()),
                description: format!("Hand the conversation off to {}.", target.name()),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                }),
            })
            .collect()
    }

    /// Resolve a tool call made while `from` was answering to its hand-off target.
    ///
    /// Returns `None` for tools that are not hand-offs declared on `from`.
    pub fn resolve_handoff_tool(&self, from: &Agent, tool_name: &str) -> Option<&Arc<Agent>> {
        let target = tool_name.strip_prefix(HANDOFF_TOOL_PREFIX)?;
        if from.handoffs().iter().any(|h| h == target) {
            self.get(target)
        } else {
            None
        }
    }
}

/// Builder for creating AgentRegistry with fluent API
#[derive(Debug, Default)]
pub struct AgentRegistryBuilder {
    agents: Vec<Agent>,
    dispatcher: Option<String>,
}

impl AgentRegistryBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent declaration
    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    /// Add several agent declarations
    pub fn with_agents<I: IntoIterator<Item = Agent>>(mut self, agents: I) -> Self {
        self.agents.extend(agents);
        self
    }

    /// Designate the dispatcher by id. Defaults to the first declared agent.
    pub fn with_dispatcher(mut self, id: impl Into<String>) -> Self {
        self.dispatcher = Some(id.into());
        self
    }

    fn validate_id(id: &str) -> Result<()> {
        let valid = !id.is_empty()
            && id.len() + HANDOFF_TOOL_PREFIX.len() <= 64
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            Ok(())
        } else {
            Err(AppError::Configuration(format!(
                "Agent id '{}' must be 1-{} characters of [A-Za-z0-9_-]",
                id,
                64 - HANDOFF_TOOL_PREFIX.len()
            )))
        }
    }

    /// Validate the declarations and build the AgentRegistry
    pub fn build(self) -> Result<AgentRegistry> {
        if self.agents.is_empty() {
            return Err(AppError::Configuration(
                "Agent registry needs at least one agent".into(),
            ));
        }

        let mut index = HashMap::new();
        let mut names = BTreeSet::new();
        for (i, agent) in self.agents.iter().enumerate() {
            Self::validate_id(agent.id())?;
            if index.insert(agent.id().to_string(), i).is_some() {
                return Err(AppError::Configuration(format!(
                    "Agent id '{}' is declared twice",
                    agent.id()
                )));
            }
            if agent.name().trim().is_empty() {
                return Err(AppError::Configuration(format!(
                    "Agent '{}' has an empty name",
                    agent.id()
                )));
            }
            if !names.insert(agent.name().to_string()) {
                return Err(AppError::Configuration(format!(
                    "Agent name '{}' is declared twice",
                    agent.name()
                )));
            }
            if agent.instructions().trim().is_empty() {
                return Err(AppError::Configuration(format!(
                    "Agent '{}' has no instructions",
                    agent.id()
                )));
            }
            if agent.model().trim().is_empty() {
                return Err(AppError::Configuration(format!(
                    "Agent '{}' has no model",
                    agent.id()
                )));
            }
        }

        for agent in &self.agents {
            for target in agent.handoffs() {
                if !index.contains_key(target) {
                    return Err(AppError::Configuration(format!(
                        "Agent '{}' hands off to '{}', which is not in the catalog",
                        agent.id(),
                        target
                    )));
                }
                if target == agent.id() {
                    return Err(AppError::Configuration(format!(
                        "Agent '{}' cannot hand off to itself",
                        agent.id()
                    )));
                }
            }
        }

        let dispatcher = match self.dispatcher {
            Some(id) if index.contains_key(&id) => id,
            Some(id) => {
                return Err(AppError::Configuration(format!(
                    "Dispatcher '{}' is not in the catalog",
                    id
                )));
            }
            None => self.agents[0].id().to_string(),
        };

        tracing::debug!(
            agents = self.agents.len(),
            dispatcher = %dispatcher,
            "Agent registry built"
        );

        Ok(AgentRegistry {
            agents: self.agents.into_iter().map(Arc::new).collect(),
            index,
            dispatcher,
        })
    }
}
