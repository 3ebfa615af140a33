//! Interactive chat loop
//!
//! Plain lines are routed to the active agent; lines starting with `/` are
//! commands. The routing call runs in the background through the
//! [`Dispatcher`]; Ctrl-C while waiting abandons it.

use crate::cli::output::Output;
use crate::conversation::Dispatcher;
use crate::types::{AppError, Result};
use crate::{AppState, RouteOutcome};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Empty,
    Message(String),
    Agents,
    Use(String),
    Tab,
    History,
    Key(String),
    Help,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplCommand::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return ReplCommand::Message(line.to_string());
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };
        match (name.to_lowercase().as_str(), arg) {
            ("agents", _) => ReplCommand::Agents,
            ("use", arg) if !arg.is_empty() => ReplCommand::Use(arg.to_string()),
            ("tab", _) => ReplCommand::Tab,
            ("history", _) => ReplCommand::History,
            ("key", arg) if !arg.is_empty() => ReplCommand::Key(arg.to_string()),
            ("help", _) => ReplCommand::Help,
            ("quit" | "exit", _) => ReplCommand::Quit,
            _ => ReplCommand::Unknown(line.to_string()),
        }
    }
}

pub struct Repl {
    state: AppState,
    dispatcher: Dispatcher,
    output: Output,
    tabbed: bool,
}

impl Repl {
    pub fn new(state: AppState, output: Output, tabbed: bool) -> Self {
        let dispatcher = Dispatcher::new(Arc::clone(&state.router), state.new_session());
        Self {
            state,
            dispatcher,
            output,
            tabbed,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Read stdin until EOF or `/quit`
    pub async fn run(&mut self) -> Result<()> {
        self.output.banner(self.state.config.catalog.preset.as_str());
        if !self.state.credentials.is_set() && self.state.config.provider().requires_key() {
            self.output.warning(&format!(
                "{} is not set. Use /key <value> to save one.",
                self.state.credentials.key_name()
            ));
        }
        self.print_history().await;
        self.output
            .hint("Commands: /agents /use <agent> /tab /history /key <value> /quit");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let label = self.visible_label().await;
            self.output.prompt(&label);

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => {
                    self.output.newline();
                    tracing::debug!("Interrupted at the prompt");
                    break;
                }
            };
            let Some(line) = line else {
                break;
            };
            if !self.handle(ReplCommand::parse(&line)).await? {
                break;
            }
        }

        tracing::debug!("Chat loop finished");
        Ok(())
    }

    /// Execute one command. Returns `false` when the loop should stop.
    pub async fn handle(&mut self, command: ReplCommand) -> Result<bool> {
        match command {
            ReplCommand::Empty => {}
            ReplCommand::Quit => return Ok(false),
            ReplCommand::Message(text) => self.send(&text).await?,
            ReplCommand::Agents => self.list_agents().await,
            ReplCommand::Use(key) => {
                let mut session = self.dispatcher.session().lock().await;
                let selected = session
                    .select_agent(&key)
                    .map(|agent| (agent.id().to_string(), agent.name().to_string()));
                match selected {
                    Ok((id, name)) => {
                        self.output.success(&format!("{} is now active", name));
                        if self.tabbed {
                            self.output.tab(&name, &session.view_for(&id));
                        }
                    }
                    Err(e) => self.output.error(&e.to_string()),
                }
            }
            ReplCommand::Tab => {
                let session = self.dispatcher.session().lock().await;
                let agent = session.active_agent();
                self.output.tab(agent.name(), &session.view_for(agent.id()));
            }
            ReplCommand::History => self.print_history().await,
            ReplCommand::Key(value) => match self.state.credentials.set(&value) {
                Ok(()) => self.output.success(&format!(
                    "{} saved to {}",
                    self.state.credentials.key_name(),
                    self.state.credentials.env_file().display()
                )),
                Err(e) => self.output.error(&e.to_string()),
            },
            ReplCommand::Help => {
                self.output.header("Commands");
                self.output.list_item("/agents          list the agents and their hand-offs");
                self.output.list_item("/use <agent>     make an agent active (switch tab)");
                self.output.list_item("/tab             show the active agent's tab");
                self.output.list_item("/history         show the whole conversation");
                self.output.list_item("/key <value>     save a new API key");
                self.output.list_item("/quit            leave");
            }
            ReplCommand::Unknown(line) => {
                self.output
                    .warning(&format!("Unknown command '{}'. Try /help", line));
            }
        }
        Ok(true)
    }

    async fn send(&mut self, text: &str) -> Result<()> {
        let Some(pending) = self.dispatcher.submit(text).await? else {
            return Ok(());
        };

        let result = tokio::select! {
            result = pending.wait() => result,
            _ = tokio::signal::ctrl_c() => {
                self.dispatcher.cancel();
                Err(AppError::Cancelled)
            }
        };

        match result {
            Ok(RouteOutcome::Ignored) => {}
            Ok(RouteOutcome::Answered {
                responder,
                text,
                handed_off,
            }) => {
                if handed_off {
                    tracing::debug!(agent = %responder.id(), "Now talking to specialist");
                }
                self.output.reply(responder.name(), &text, false);
            }
            Ok(RouteOutcome::Failed { agent, error }) => {
                self.output
                    .reply(agent.name(), &format!("Error: {}", error), true);
            }
            Err(AppError::Cancelled) => self.output.warning("Request cancelled"),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    async fn list_agents(&self) {
        let session = self.dispatcher.session().lock().await;
        let active = session.active_agent().id().to_string();
        let registry = session.registry();

        self.output.header("Agents");
        for agent in registry.agents() {
            let marker = if agent.id() == active { "*" } else { " " };
            let targets = registry
                .handoff_targets(agent.id())
                .iter()
                .map(|a| a.name())
                .collect::<Vec<_>>()
                .join(", ");
            if targets.is_empty() {
                self.output
                    .list_item(&format!("{} {} ({})", marker, agent.name(), agent.id()));
            } else {
                self.output.list_item(&format!(
                    "{} {} ({}) -> {}",
                    marker,
                    agent.name(),
                    agent.id(),
                    targets
                ));
            }
        }
    }

    async fn print_history(&self) {
        let session = self.dispatcher.session().lock().await;
        if self.tabbed {
            let partitions = session.transcript().partition_by_agent();
            for (id, exchanges) in &partitions {
                let name = session
                    .registry()
                    .get(id)
                    .map(|a| a.name().to_string())
                    .unwrap_or_else(|| id.clone());
                self.output.tab(&name, exchanges);
            }
            return;
        }
        for turn in session.transcript().turns() {
            self.output.turn(turn);
        }
    }

    async fn visible_label(&self) -> String {
        self.dispatcher
            .session()
            .lock()
            .await
            .active_agent()
            .name()
            .to_string()
    }
}
