//! TOML-based configuration for swarm-chat
//!
//! Everything in `swarm.toml` is optional; a missing file means defaults.
//!
//! ```toml
//! [app]
//! log_level = "info"
//!
//! [llm]
//! provider = "openai"            # or "ollama"
//! api_base = "https://api.openai.com/v1"
//! env_file = ".env"
//! api_key_env = "OPENAI_API_KEY"
//! default_model = "gpt-4"
//! request_timeout_secs = 120
//! max_handoffs = 10
//!
//! [session]
//! seed = true
//! tabbed = false
//!
//! [catalog]
//! preset = "legal"
//!
//! [agents.bgb]                   # override a preset agent...
//! model = "gpt-4o"
//!
//! [agents.mietrecht]             # ...or declare a new one
//! name = "Agent Mietrecht"
//! instructions = "Du bist ein Experte für Mietrecht."
//! ```

use crate::agents::presets::{DEFAULT_MODEL, SEED_MESSAGE};
use crate::agents::{Agent, AgentRegistry, Preset};
use crate::llm::Provider;
use crate::types::AppError;
use crate::utils::credentials::DEFAULT_KEY_NAME;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_FILE: &str = "swarm.toml";

/// Root configuration structure loaded from swarm.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwarmConfig {
    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Per-agent overrides and additions, keyed by agent id
    #[serde(default)]
    pub agents: BTreeMap<String, AgentConfig>,
}

// ============= App Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAI,
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    /// OpenAI-compatible API base (used when provider = "openai")
    #[serde(default = "default_openai_base")]
    pub api_base: String,

    /// Ollama server URL (used when provider = "ollama")
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    /// Dotenv file holding the API key
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,

    /// Name of the key inside the env file
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model for preset agents and for added agents that name none
    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_handoffs")]
    pub max_handoffs: usize,
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

fn default_api_key_env() -> String {
    DEFAULT_KEY_NAME.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_request_timeout() -> u64 {
    120
}

fn default_max_handoffs() -> usize {
    10
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_base: default_openai_base(),
            base_url: default_ollama_url(),
            env_file: default_env_file(),
            api_key_env: default_api_key_env(),
            default_model: default_model(),
            request_timeout_secs: default_request_timeout(),
            max_handoffs: default_max_handoffs(),
        }
    }
}

// ============= Session Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Open every session with the "which agents are there?" question
    #[serde(default = "default_true")]
    pub seed: bool,

    #[serde(default = "default_seed_message")]
    pub seed_message: String,

    /// Start the chat in the per-agent tab layout
    #[serde(default)]
    pub tabbed: bool,
}

fn default_true() -> bool {
    true
}

fn default_seed_message() -> String {
    SEED_MESSAGE.to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: true,
            seed_message: default_seed_message(),
            tabbed: false,
        }
    }
}

// ============= Catalog Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Id of the agent that opens every session (defaults to the preset's)
    #[serde(default)]
    pub dispatcher: Option<String>,
}

fn default_preset() -> String {
    Preset::default().as_str().to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            dispatcher: None,
        }
    }
}

/// Agent entry. For a preset agent every field is an override; a new agent
/// needs at least `name` and `instructions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub instructions: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    /// Replaces the preset's hand-off list when present
    #[serde(default)]
    pub handoffs: Option<Vec<String>>,
}

// ============= Errors =============

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Agent '{0}' must set '{1}'")]
    IncompleteAgent(String, &'static str),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl SwarmConfig {
    /// Load and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: SwarmConfig = toml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path.as_ref()) {
            Err(ConfigError::FileNotFound(path)) => {
                tracing::debug!(path = %path.display(), "No configuration file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Check the configuration, including that the agent catalog it
    /// describes can be built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.api_key_env.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.api_key_env must not be empty".to_string(),
            ));
        }
        if self.llm.default_model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.default_model must not be empty".to_string(),
            ));
        }
        if self.llm.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "llm.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.llm.provider == ProviderKind::OpenAI && !is_http_url(&self.llm.api_base) {
            return Err(ConfigError::ValidationError(format!(
                "llm.api_base '{}' is not an http(s) URL",
                self.llm.api_base
            )));
        }
        if self.llm.provider == ProviderKind::Ollama && !is_http_url(&self.llm.base_url) {
            return Err(ConfigError::ValidationError(format!(
                "llm.base_url '{}' is not an http(s) URL",
                self.llm.base_url
            )));
        }

        self.build_registry().map(|_| ())
    }

    pub fn preset(&self) -> Result<Preset, ConfigError> {
        self.catalog.preset.parse().map_err(|e| match e {
            AppError::Configuration(msg) => ConfigError::ValidationError(msg),
            other => ConfigError::ValidationError(other.to_string()),
        })
    }

    /// The configured provider
    pub fn provider(&self) -> Provider {
        match self.llm.provider {
            ProviderKind::OpenAI => Provider::OpenAI {
                api_base: self.llm.api_base.clone(),
            },
            ProviderKind::Ollama => Provider::Ollama {
                base_url: self.llm.base_url.clone(),
            },
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.request_timeout_secs)
    }

    /// Seed message for new sessions, if seeding is enabled
    pub fn seed_message(&self) -> Option<&str> {
        self.session.seed.then_some(self.session.seed_message.as_str())
    }

    /// Build the agent catalog: the preset's agents with `[agents.*]`
    /// overrides applied, followed by any newly declared agents.
    pub fn build_registry(&self) -> Result<AgentRegistry, ConfigError> {
        let preset = self.preset()?;
        let model = &self.llm.default_model;

        let mut agents = preset.agents(model);
        for agent in agents.iter_mut() {
            if let Some(overrides) = self.agents.get(agent.id()) {
                *agent = apply_overrides(agent, overrides);
            }
        }

        for (id, entry) in &self.agents {
            if agents.iter().any(|a| a.id() == id) {
                continue;
            }
            let name = entry
                .name
                .clone()
                .ok_or_else(|| ConfigError::IncompleteAgent(id.clone(), "name"))?;
            let instructions = entry
                .instructions
                .clone()
                .ok_or_else(|| ConfigError::IncompleteAgent(id.clone(), "instructions"))?;
            let agent_model = entry.model.clone().unwrap_or_else(|| model.clone());
            agents.push(
                Agent::new(id.clone(), name, instructions, agent_model)
                    .with_handoffs(entry.handoffs.clone().unwrap_or_default()),
            );
        }

        let mut builder = AgentRegistry::builder().with_agents(agents);
        if let Some(dispatcher) = &self.catalog.dispatcher {
            builder = builder.with_dispatcher(dispatcher.clone());
        }
        builder.build().map_err(|e| match e {
            AppError::Configuration(msg) => ConfigError::ValidationError(msg),
            other => ConfigError::ValidationError(other.to_string()),
        })
    }
}

fn apply_overrides(agent: &Agent, overrides: &AgentConfig) -> Agent {
    let handoffs = overrides
        .handoffs
        .clone()
        .unwrap_or_else(|| agent.handoffs().to_vec());
    Agent::new(
        agent.id(),
        overrides.name.as_deref().unwrap_or(agent.name()),
        overrides
            .instructions
            .as_deref()
            .unwrap_or(agent.instructions()),
        overrides.model.as_deref().unwrap_or(agent.model()),
    )
    .with_handoffs(handoffs)
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
