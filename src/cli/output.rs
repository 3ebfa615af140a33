//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for swarm-chat.

use crate::conversation::{ExchangeView, Turn};
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    pub fn banner(&self, catalog: &str) {
        if self.colored {
            println!(
                "\n  {} {} {}\n",
                "swarm-chat".bright_cyan().bold(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed(),
                format!("[{}]", catalog).dimmed()
            );
        } else {
            println!("\n  swarm-chat v{} [{}]\n", env!("CARGO_PKG_VERSION"), catalog);
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a list item
    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Print a table header row
    pub fn table_header(&self, columns: &[&str]) {
        let header = table_line(columns);
        if self.colored {
            println!("    {}", header.bright_white().bold());
            println!("    {}", "─".repeat(columns.len() * 16).dimmed());
        } else {
            println!("    {}", header);
            println!("    {}", "-".repeat(columns.len() * 16));
        }
    }

    /// Print a table row
    pub fn table_row(&self, values: &[&str]) {
        println!("    {}", table_line(values));
    }

    /// Input prompt naming the visible agent
    pub fn prompt(&self, label: &str) {
        if self.colored {
            print!("{} ", format!("[{}] >", label).bright_cyan().bold());
        } else {
            print!("[{}] > ", label);
        }
        io::stdout().flush().ok();
    }

    /// `<speaker>: <text>`, the way every reply is presented
    pub fn reply(&self, speaker: &str, text: &str, failed: bool) {
        if !self.colored {
            println!("{}: {}", speaker, text);
        } else if failed {
            println!("{}: {}", speaker.red().bold(), text.red());
        } else {
            println!("{}: {}", speaker.bright_green().bold(), text);
        }
    }

    /// One transcript turn
    pub fn turn(&self, turn: &Turn) {
        match turn.speaker_name() {
            Some(speaker) => self.reply(speaker, &turn.content, turn.failed),
            None if self.colored => println!("{}: {}", "You".bright_white().bold(), turn.content),
            None => println!("You: {}", turn.content),
        }
    }

    /// One tab of the per-agent layout
    pub fn tab(&self, agent_name: &str, exchanges: &[ExchangeView<'_>]) {
        self.header(agent_name);
        if exchanges.is_empty() {
            self.info("No replies in this tab yet");
            return;
        }
        for exchange in exchanges {
            self.turn(exchange.user);
            self.turn(exchange.reply);
        }
    }

    /// Print newline
    pub fn newline(&self) {
        println!();
    }
}

fn table_line(values: &[&str]) -> String {
    values
        .iter()
        .map(|v| format!("{:<15}", v))
        .collect::<Vec<_>>()
        .join(" ")
}
