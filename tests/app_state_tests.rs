//! Application wiring tests
//!
//! Build the state from TOML configuration and run conversations through the
//! background dispatcher.

mod common;

use common::mocks::MockInvoker;
use std::sync::Arc;
use std::time::Duration;
use swarm_chat::types::AppError;
use swarm_chat::{AppState, CredentialStore, Dispatcher, RouteOutcome, SwarmConfig};
use tempfile::TempDir;

fn config(toml: &str, dir: &TempDir) -> SwarmConfig {
    let mut config: SwarmConfig = toml::from_str(toml).unwrap();
    config.llm.env_file = dir.path().join(".env");
    config.llm.api_key_env = "SWARM_CHAT_STATE_TEST_KEY".to_string();
    config.validate().unwrap();
    config
}

#[test]
fn test_from_config_without_key() {
    let dir = TempDir::new().unwrap();
    let state = AppState::from_config(config("", &dir)).unwrap();

    assert!(!state.credentials.is_set());
    assert_eq!(state.registry.dispatcher().name(), "Agent Dirk");
    assert_eq!(state.router.timeout(), Duration::from_secs(120));
}

#[test]
fn test_from_config_reads_env_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(".env"),
        "SWARM_CHAT_STATE_TEST_KEY=sk-state-1234\n",
    )
    .unwrap();

    let state = AppState::from_config(config("[llm]\nrequest_timeout_secs = 30", &dir)).unwrap();
    assert_eq!(state.credentials.current().unwrap().expose(), "sk-state-1234");
    assert_eq!(state.router.timeout(), Duration::from_secs(30));
}

#[test]
fn test_new_session_honours_seed_setting() {
    let dir = TempDir::new().unwrap();
    let credentials = Arc::new(CredentialStore::in_memory(dir.path().join(".env"), None));

    let seeded = AppState::with_invoker(
        config("", &dir),
        Arc::clone(&credentials),
        Arc::new(MockInvoker::echo_active("x")),
    )
    .unwrap();
    assert_eq!(seeded.new_session().transcript().len(), 1);

    let unseeded = AppState::with_invoker(
        config("[session]\nseed = false", &dir),
        credentials,
        Arc::new(MockInvoker::echo_active("x")),
    )
    .unwrap();
    assert!(unseeded.new_session().transcript().is_empty());
}

#[tokio::test]
async fn test_dispatcher_conversation_with_custom_agent() {
    let dir = TempDir::new().unwrap();
    let toml = r#"
        [session]
        seed = false

        [agents.mietrecht]
        name = "Agent Mietrecht"
        instructions = "Du bist ein Experte für Mietrecht."

        [agents.dirk]
        handoffs = ["bgb", "mietrecht"]
    "#;
    let credentials = Arc::new(CredentialStore::in_memory(dir.path().join(".env"), None));
    let state = AppState::with_invoker(
        config(toml, &dir),
        credentials,
        Arc::new(MockInvoker::responder(
            "mietrecht",
            "Die Kaution beträgt höchstens drei Monatsmieten.",
        )),
    )
    .unwrap();

    let dispatcher = Dispatcher::new(Arc::clone(&state.router), state.new_session());
    let pending = dispatcher.submit("Wie hoch darf die Kaution sein?").await.unwrap().unwrap();

    match pending.wait().await.unwrap() {
        RouteOutcome::Answered {
            responder,
            handed_off,
            ..
        } => {
            assert_eq!(responder.name(), "Agent Mietrecht");
            assert!(handed_off);
        }
        other => panic!("expected an answer, got {:?}", other),
    }

    let session = dispatcher.session().lock().await;
    assert_eq!(session.active_agent().id(), "mietrecht");
    let partitions = session.transcript().partition_by_agent();
    assert_eq!(partitions.len(), 1);
    assert_eq!(partitions["mietrecht"].len(), 1);
}

#[tokio::test]
async fn test_unreachable_custom_agent_is_rejected() {
    let dir = TempDir::new().unwrap();
    let toml = r#"
        [session]
        seed = false

        [agents.mietrecht]
        name = "Agent Mietrecht"
        instructions = "Du bist ein Experte für Mietrecht."
    "#;
    let credentials = Arc::new(CredentialStore::in_memory(dir.path().join(".env"), None));
    let state = AppState::with_invoker(
        config(toml, &dir),
        credentials,
        Arc::new(MockInvoker::responder("mietrecht", "…")),
    )
    .unwrap();

    let dispatcher = Dispatcher::new(Arc::clone(&state.router), state.new_session());
    let outcome = dispatcher
        .submit("Kaution?")
        .await
        .unwrap()
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert!(matches!(outcome, RouteOutcome::Failed { .. }));
    assert_eq!(dispatcher.session().lock().await.active_agent().id(), "dirk");
}

#[test]
fn test_invalid_catalog_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut config: SwarmConfig = toml::from_str("[catalog]\ndispatcher = \"ghost\"").unwrap();
    config.llm.env_file = dir.path().join(".env");

    let credentials = Arc::new(CredentialStore::in_memory(dir.path().join(".env"), None));
    let invoker = Arc::new(MockInvoker::echo_active("x"));
    let result = AppState::with_invoker(config, credentials, invoker);
    assert!(matches!(result, Err(AppError::Configuration(_))));
}
