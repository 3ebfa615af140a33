pub mod handoff;
pub mod presets;
pub mod registry;
pub mod router;

use serde::Serialize;

// Re-export commonly used types
pub use handoff::SwarmInvoker;
pub use presets::Preset;
pub use registry::{AgentRegistry, AgentRegistryBuilder};
pub use router::{Invocation, InvocationRequest, ModelInvoker, RouteOutcome, Router};

/// Prefix of the tool the model calls to hand a conversation to another agent
pub const HANDOFF_TOOL_PREFIX: &str = "transfer_to_";

/// A named persona: fixed instructions, a model, and the agents it may hand off to.
///
/// Agents are immutable once declared. The only way to obtain one with
/// hand-offs is through the builder methods before it is placed in a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Agent {
    id: String,
    name: String,
    instructions: String,
    model: String,
    handoffs: Vec<String>,
}

impl Agent {
    /// Declare an agent. `id` is the short catalog key, `name` the display name.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            instructions: instructions.into(),
            model: model.into(),
            handoffs: Vec::new(),
        }
    }

    /// Declare the agents (by id) this agent may hand off to
    pub fn with_handoffs<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for target in targets {
            let target = target.into();
            if !self.handoffs.contains(&target) {
                self.handoffs.push(target);
            }
        }
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ids of the agents this one may hand off to, in declaration order
    pub fn handoffs(&self) -> &[String] {
        &self.handoffs
    }

    pub fn can_hand_off(&self) -> bool {
        !self.handoffs.is_empty()
    }
}

/// Tool name the model uses to hand off to the agent with `id`
pub fn handoff_tool_name(id: &str) -> String {
    format!("{}{}", HANDOFF_TOOL_PREFIX, id)
}
