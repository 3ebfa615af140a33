//! CLI Integration Tests for swarm-chat
//!
//! Runs the built binary in a scratch directory and checks the config, agent,
//! set-key and chat commands. None of these make a model call.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Run swarm-chat with arguments inside `dir`
fn run(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_swarm-chat"))
        .args(args)
        .arg("--no-color")
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

/// Run the chat loop feeding `input` on stdin
fn chat(args: &[&str], input: &str, dir: &Path) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_swarm-chat"))
        .arg("chat")
        .args(args)
        .arg("--no-color")
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn chat");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");

    child.wait_with_output().expect("Failed to wait for chat")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let dir = TempDir::new().unwrap();
    let output = run(&["--help"], dir.path());

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("swarm-chat"));
    assert!(text.contains("set-key"));
    assert!(text.contains("agent"));
}

#[test]
fn test_version_command() {
    let dir = TempDir::new().unwrap();
    let output = run(&["--version"], dir.path());

    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

// =============================================================================
// Agent Command Tests
// =============================================================================

#[test]
fn test_agent_list() {
    let dir = TempDir::new().unwrap();
    let output = run(&["agent", "list"], dir.path());

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Agent Dirk"));
    assert!(text.contains("Agent BGB"));
    assert!(text.contains("Agent Baurecht"));
}

#[test]
fn test_agent_show_dispatcher() {
    let dir = TempDir::new().unwrap();
    let output = run(&["agent", "show", "Agent Dirk"], dir.path());

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("transfer_to_bgb"));
    assert!(text.contains("yes"));
}

#[test]
fn test_agent_show_unknown() {
    let dir = TempDir::new().unwrap();
    let output = run(&["agent", "show", "nobody"], dir.path());
    assert!(!output.status.success());
}

#[test]
fn test_agent_list_with_custom_config() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("swarm.toml"),
        "[catalog]\npreset = \"it-support\"\n",
    )
    .unwrap();

    let output = run(&["agent", "list"], dir.path());
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Agent Mona"));
    assert!(!text.contains("Agent BGB"));
}

// =============================================================================
// Config Command Tests
// =============================================================================

#[test]
fn test_config_validate_defaults() {
    let dir = TempDir::new().unwrap();
    let output = run(&["config", "--validate"], dir.path());

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Configuration is valid"));
    assert!(text.contains("OPENAI_API_KEY"));
}

#[test]
fn test_config_invalid_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("swarm.toml"),
        "[agents.dirk]\nhandoffs = [\"nobody\"]\n",
    )
    .unwrap();

    let output = run(&["config", "--validate"], dir.path());
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nobody"));
}

// =============================================================================
// Set-Key Command Tests
// =============================================================================

#[test]
fn test_set_key_writes_env_file() {
    let dir = TempDir::new().unwrap();
    let output = run(&["set-key", "sk-cli-test-1234"], dir.path());

    assert!(output.status.success());
    let env = fs::read_to_string(dir.path().join(".env")).unwrap();
    assert!(env.contains("OPENAI_API_KEY='sk-cli-test-1234'"));
    // Only the masked form is printed
    assert!(!stdout(&output).contains("sk-cli-test-1234"));
}

#[test]
fn test_set_key_rejects_blank() {
    let dir = TempDir::new().unwrap();
    let output = run(&["set-key", "   "], dir.path());

    assert!(!output.status.success());
    assert!(!dir.path().join(".env").exists());
}

// =============================================================================
// Chat Tests
// =============================================================================

#[test]
fn test_chat_commands_without_model_calls() {
    let dir = TempDir::new().unwrap();
    let output = chat(
        &["--no-seed"],
        "/agents\n/use bgb\n/tab\n/dance\n/quit\n",
        dir.path(),
    );

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Agent Dirk"));
    assert!(text.contains("Agent BGB is now active"));
    assert!(text.contains("No replies in this tab yet"));
    assert!(text.contains("Unknown command"));
}

#[test]
fn test_chat_shows_seed_and_stops_at_eof() {
    let dir = TempDir::new().unwrap();
    let output = chat(&[], "", dir.path());

    assert!(output.status.success());
    assert!(stdout(&output).contains("You: Welche Agenten stehen zur Verfügung?"));
}

#[test]
fn test_chat_key_command_saves_key() {
    let dir = TempDir::new().unwrap();
    let output = chat(&["--no-seed"], "/key sk-from-chat\n/quit\n", dir.path());

    assert!(output.status.success());
    let env = fs::read_to_string(dir.path().join(".env")).unwrap();
    assert!(env.contains("sk-from-chat"));
}

#[cfg(unix)]
#[test]
fn test_interrupt_at_prompt_exits_after_a_message() {
    use std::time::{Duration, Instant};

    let dir = TempDir::new().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_swarm-chat"))
        .args(["chat", "--no-seed", "--no-color"])
        .current_dir(dir.path())
        .env_remove("OPENAI_API_KEY")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn chat");

    // Without a key the message fails at once and the loop returns to the prompt
    let mut stdin = child.stdin.take().expect("stdin is piped");
    stdin.write_all(b"Hallo\n").expect("Failed to write stdin");
    std::thread::sleep(Duration::from_millis(1500));

    let status = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .expect("Failed to send SIGINT");
    assert!(status.success());

    let deadline = Instant::now() + Duration::from_secs(10);
    let exit = loop {
        if let Some(exit) = child.try_wait().expect("Failed to poll chat") {
            break exit;
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("chat kept running after SIGINT at the prompt");
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    drop(stdin);

    assert!(exit.success());
}
