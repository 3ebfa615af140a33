use anyhow::Context;
use swarm_chat::cli::output::Output;
use swarm_chat::cli::repl::Repl;
use swarm_chat::cli::{AgentCommands, Cli, Commands};
use swarm_chat::{AppState, CredentialStore, SwarmConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Picks up RUST_LOG and friends; the API key itself is read by the credential store
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let mut config = SwarmConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    init_tracing(&config, cli.verbose);

    match cli.command.unwrap_or_default() {
        Commands::Chat {
            catalog,
            tabbed,
            no_seed,
        } => {
            if let Some(catalog) = catalog {
                config.catalog.preset = catalog;
            }
            if no_seed {
                config.session.seed = false;
            }
            let tabbed = tabbed || config.session.tabbed;

            let state = AppState::from_config(config).context("Failed to start chat")?;
            let mut repl = Repl::new(state, output, tabbed);
            repl.run().await?;
        }
        Commands::SetKey { value } => {
            let store = CredentialStore::load(&config.llm.env_file, &config.llm.api_key_env)?;
            match store.set(&value) {
                Ok(()) => {
                    let masked = store.current().map(|k| k.masked()).unwrap_or_default();
                    output.success(&format!(
                        "{} saved to {} ({})",
                        store.key_name(),
                        store.env_file().display(),
                        masked
                    ));
                }
                Err(e) => {
                    output.error(&e.to_string());
                    std::process::exit(1);
                }
            }
        }
        Commands::Agent(command) => {
            let registry = config.build_registry()?;
            match command {
                AgentCommands::List => {
                    output.header("Agents");
                    output.table_header(&["Id", "Name", "Model", "Hand-offs"]);
                    for agent in registry.agents() {
                        let handoffs = agent.handoffs().join(",");
                        output.table_row(&[agent.id(), agent.name(), agent.model(), &handoffs]);
                    }
                    output.newline();
                }
                AgentCommands::Show { name } => {
                    let Some(agent) = registry.find(&name) else {
                        output.error(&format!("No agent named '{}'", name));
                        std::process::exit(1);
                    };
                    output.header(agent.name());
                    output.kv("Id", agent.id());
                    output.kv("Model", agent.model());
                    output.kv(
                        "Dispatcher",
                        if registry.dispatcher().id() == agent.id() { "yes" } else { "no" },
                    );
                    if agent.can_hand_off() {
                        output.kv("Hand-off tools", "");
                        for tool in registry.handoff_tools(agent) {
                            output.list_item(&tool.name);
                        }
                    }
                    output.kv("Instructions", "");
                    for line in agent.instructions().lines() {
                        output.list_item(line);
                    }
                }
            }
        }
        Commands::Config { validate } => {
            if validate {
                match config.validate() {
                    Ok(()) => output.success("Configuration is valid"),
                    Err(e) => {
                        output.error(&e.to_string());
                        std::process::exit(1);
                    }
                }
            }

            output.header("Configuration");
            output.kv("File", &cli.config.display().to_string());
            output.kv("Provider", config.provider().name());
            output.kv("API base", &config.provider().api_base());
            output.kv("Default model", &config.llm.default_model);
            output.kv("Env file", &config.llm.env_file.display().to_string());
            output.kv("Key name", &config.llm.api_key_env);
            output.kv("Timeout", &format!("{}s", config.llm.request_timeout_secs));
            output.kv("Max hand-offs", &config.llm.max_handoffs.to_string());
            output.kv("Catalog", &config.catalog.preset);
            output.kv("Seed message", config.seed_message().unwrap_or("(none)"));
            output.kv("Tabbed", &config.session.tabbed.to_string());

            let store = CredentialStore::load(&config.llm.env_file, &config.llm.api_key_env)?;
            let key = store
                .current()
                .map(|k| k.masked())
                .unwrap_or_else(|| "(not set)".to_string());
            output.kv("API key", &key);
        }
    }

    Ok(())
}

fn init_tracing(config: &SwarmConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.app.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("swarm_chat={},warn", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
