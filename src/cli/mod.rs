//! CLI module for swarm-chat
//!
//! Command-line parsing for the `swarm-chat` binary, the interactive chat loop
//! and colored terminal output.

pub mod output;
pub mod repl;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// swarm-chat - talk to a dispatcher agent that hands off to specialists
#[derive(Parser, Debug)]
#[command(
    name = "swarm-chat",
    version,
    about = "Multi-agent chat: a dispatcher hands conversations off to specialist agents",
    long_about = "Chat with \"Agent Dirk\", a dispatcher that forwards your question to the\n\
                  matching specialist agent (BGB, HGB, StGB, ...) through an\n\
                  OpenAI-compatible API.\n\n\
                  Run without a subcommand to start chatting.",
    after_help = "EXAMPLES:\n    \
                  swarm-chat                        # Chat with the legal catalog\n    \
                  swarm-chat chat --tabbed          # One tab per agent\n    \
                  swarm-chat chat --catalog it-support\n    \
                  swarm-chat set-key sk-...         # Save OPENAI_API_KEY to .env\n    \
                  swarm-chat agent show bgb         # Inspect an agent"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "swarm.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Agent catalog to load (legal or it-support)
        #[arg(long)]
        catalog: Option<String>,

        /// Show the conversation split into one tab per agent
        #[arg(long)]
        tabbed: bool,

        /// Do not open the session with the "which agents are there?" question
        #[arg(long)]
        no_seed: bool,
    },

    /// Save a new API key to the env file
    SetKey {
        /// The key value
        value: String,
    },

    /// Inspect the agent catalog
    #[command(subcommand)]
    Agent(AgentCommands),

    /// Show configuration information
    Config {
        /// Validate the configuration file and agent catalog
        #[arg(long)]
        validate: bool,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Chat {
            catalog: None,
            tabbed: false,
            no_seed: false,
        }
    }
}

/// Agent inspection subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum AgentCommands {
    /// List all agents in the catalog
    List,

    /// Show details for a specific agent
    Show {
        /// Id or display name of the agent
        name: String,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
