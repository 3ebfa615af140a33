//! Credential store integration tests
//!
//! The key lives in a dotenv file; saving it must survive a reload and must
//! never clobber unrelated entries.

use std::fs;
use std::sync::Arc;
use swarm_chat::types::AppError;
use swarm_chat::CredentialStore;
use tempfile::TempDir;

const KEY: &str = "SWARM_CHAT_IT_KEY";

#[test]
fn test_round_trip_through_env_file() {
    let dir = TempDir::new().unwrap();
    let env_file = dir.path().join(".env");

    let store = CredentialStore::load(&env_file, KEY).unwrap();
    assert!(!store.is_set());

    store.set("sk-round-trip-1234").unwrap();
    assert_eq!(store.current().unwrap().expose(), "sk-round-trip-1234");

    let reloaded = CredentialStore::load(&env_file, KEY).unwrap();
    assert_eq!(reloaded.current().unwrap().expose(), "sk-round-trip-1234");
}

#[test]
fn test_update_keeps_other_entries() {
    let dir = TempDir::new().unwrap();
    let env_file = dir.path().join(".env");
    fs::write(
        &env_file,
        format!("# local settings\nRUST_LOG=debug\n{}=old-value\nOTHER=1\n", KEY),
    )
    .unwrap();

    let store = CredentialStore::load(&env_file, KEY).unwrap();
    assert_eq!(store.current().unwrap().expose(), "old-value");

    store.set("new-value").unwrap();

    let content = fs::read_to_string(&env_file).unwrap();
    assert!(content.contains("# local settings"));
    assert!(content.contains("RUST_LOG=debug"));
    assert!(content.contains("OTHER=1"));
    assert!(!content.contains("old-value"));
    assert_eq!(content.matches(KEY).count(), 1);

    let reloaded = CredentialStore::load(&env_file, KEY).unwrap();
    assert_eq!(reloaded.current().unwrap().expose(), "new-value");
}

#[test]
fn test_empty_key_is_rejected_without_write() {
    let dir = TempDir::new().unwrap();
    let env_file = dir.path().join(".env");
    fs::write(&env_file, format!("{}=keep-me\n", KEY)).unwrap();
    let before = fs::read_to_string(&env_file).unwrap();

    let store = CredentialStore::load(&env_file, KEY).unwrap();
    for blank in ["", "   ", "\t"] {
        assert!(matches!(store.set(blank), Err(AppError::InvalidInput(_))));
    }

    assert_eq!(fs::read_to_string(&env_file).unwrap(), before);
    assert_eq!(store.current().unwrap().expose(), "keep-me");
}

#[test]
fn test_value_with_special_characters_round_trips() {
    let dir = TempDir::new().unwrap();
    let env_file = dir.path().join(".env");

    let store = CredentialStore::load(&env_file, KEY).unwrap();
    store.set("sk-a#b c$d").unwrap();

    let reloaded = CredentialStore::load(&env_file, KEY).unwrap();
    assert_eq!(reloaded.current().unwrap().expose(), "sk-a#b c$d");
}

#[test]
fn test_value_with_quote_and_dollar_round_trips() {
    let dir = TempDir::new().unwrap();
    let env_file = dir.path().join(".env");

    let store = CredentialStore::load(&env_file, KEY).unwrap();
    store.set("sk-a'b$HOME").unwrap();
    assert_eq!(store.current().unwrap().expose(), "sk-a'b$HOME");

    let reloaded = CredentialStore::load(&env_file, KEY).unwrap();
    assert_eq!(reloaded.current().unwrap().expose(), "sk-a'b$HOME");
}

#[cfg(unix)]
#[test]
fn test_save_keeps_restrictive_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let env_file = dir.path().join(".env");
    fs::write(&env_file, format!("{}=old-value\n", KEY)).unwrap();
    fs::set_permissions(&env_file, fs::Permissions::from_mode(0o600)).unwrap();

    let store = CredentialStore::load(&env_file, KEY).unwrap();
    store.set("sk-private-1234").unwrap();

    let mode = fs::metadata(&env_file).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    assert!(!dir.path().join(".env.tmp").exists());
    assert!(!dir.path().join("..env.tmp").exists());
}

#[cfg(unix)]
#[test]
fn test_new_env_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let env_file = dir.path().join(".env");

    let store = CredentialStore::load(&env_file, KEY).unwrap();
    store.set("sk-fresh-1234").unwrap();

    let mode = fs::metadata(&env_file).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_concurrent_readers_see_whole_values() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(CredentialStore::load(dir.path().join(".env"), KEY).unwrap());
    store.set("first-value").unwrap();

    let reader = {
        let store = Arc::clone(&store);
        std::thread::spawn(move || {
            for _ in 0..1000 {
                let value = store.current().unwrap();
                assert!(value.expose() == "first-value" || value.expose() == "second-value");
            }
        })
    };
    store.set("second-value").unwrap();
    reader.join().unwrap();

    assert_eq!(store.current().unwrap().expose(), "second-value");
}
