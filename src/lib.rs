//! # swarm-chat
//!
//! A multi-agent chat router. A dispatcher agent ("Agent Dirk") receives every
//! new conversation and hands it off to specialist agents, here a set of
//! German legal specialists, through an OpenAI-compatible chat API.
//!
//! ## Overview
//!
//! - [`agents`]: the agent catalog with its hand-off graph, the presets, the
//!   router and the LLM-backed hand-off runtime.
//! - [`conversation`]: transcript, sessions and the background dispatcher.
//! - [`llm`]: the chat-completions client.
//! - [`utils`]: `swarm.toml` configuration and the `.env` credential store.
//!
//! ## Library usage
//!
//! ```rust,ignore
//! use swarm_chat::{AppState, SwarmConfig};
//!
//! #[tokio::main]
//! async fn main() -> swarm_chat::Result<()> {
//!     let state = AppState::from_config(SwarmConfig::default())?;
//!     let mut session = state.new_session();
//!
//!     let outcome = state
//!         .router
//!         .route(&mut session, "Was regelt das BGB zu Kaufverträgen?")
//!         .await?;
//!     if let Some((speaker, text)) = outcome.display_pair() {
//!         println!("{}: {}", speaker, text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod cli;
pub mod conversation;
pub mod llm;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use agents::{
    Agent, AgentRegistry, Invocation, InvocationRequest, ModelInvoker, Preset, RouteOutcome,
    Router, SwarmInvoker,
};
pub use conversation::{Dispatcher, PendingReply, Session, Transcript, Turn};
pub use llm::{ChatMessage, LLMClient, LLMResponse, Provider};
pub use types::{AppError, Result};
pub use utils::credentials::CredentialStore;
pub use utils::toml_config::SwarmConfig;

use std::sync::Arc;

/// Everything a front-end needs, built once from configuration
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SwarmConfig>,
    pub credentials: Arc<CredentialStore>,
    pub registry: Arc<AgentRegistry>,
    pub router: Arc<Router>,
}

impl AppState {
    /// Load the credential from the configured env file and wire the router
    /// to the configured provider.
    pub fn from_config(config: SwarmConfig) -> Result<Self> {
        let credentials = Arc::new(CredentialStore::load(
            &config.llm.env_file,
            &config.llm.api_key_env,
        )?);
        let client = config.provider().create_client(Arc::clone(&credentials))?;
        let llm: Arc<dyn LLMClient> = Arc::from(client);
        let invoker = SwarmInvoker::new(llm).with_max_handoffs(config.llm.max_handoffs);
        Self::with_invoker(config, credentials, Arc::new(invoker))
    }

    /// Wire the state around a custom model port
    pub fn with_invoker(
        config: SwarmConfig,
        credentials: Arc<CredentialStore>,
        invoker: Arc<dyn ModelInvoker>,
    ) -> Result<Self> {
        let registry = Arc::new(config.build_registry()?);
        let router = Router::new(Arc::clone(&registry), invoker)
            .with_timeout(config.request_timeout());

        tracing::info!(
            agents = registry.len(),
            dispatcher = %registry.dispatcher().id(),
            provider = config.provider().name(),
            "Application state ready"
        );

        Ok(Self {
            config: Arc::new(config),
            credentials,
            registry,
            router: Arc::new(router),
        })
    }

    /// Fresh session on the dispatcher, seeded if configured
    pub fn new_session(&self) -> Session {
        match self.config.seed_message() {
            Some(seed) => Session::with_seed(Arc::clone(&self.registry), seed),
            None => Session::new(Arc::clone(&self.registry)),
        }
    }
}
