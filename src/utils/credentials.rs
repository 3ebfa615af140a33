//! `.env`-backed API key storage
//!
//! The key is read once at start-up and can be replaced while the program is
//! running. A replacement is persisted to the `.env` file first and only then
//! swapped into memory, so the file and the live value never disagree for
//! longer than the rename takes.

use crate::types::{AppError, Result};
use arc_swap::ArcSwapOption;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default name of the credential inside the `.env` file
pub const DEFAULT_KEY_NAME: &str = "OPENAI_API_KEY";

/// An API key. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw secret, for building request headers
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Masked form for display: first three and last four characters.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 8 {
            return "****".to_string();
        }
        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&"<redacted>").finish()
    }
}

/// Process-wide credential holder backed by a `.env` file
pub struct CredentialStore {
    env_file: PathBuf,
    key_name: String,
    current: ArcSwapOption<ApiKey>,
}

impl CredentialStore {
    /// Load the credential from `env_file`, falling back to the process environment.
    ///
    /// A missing or empty key is not an error: a warning is logged and model
    /// calls will fail authentication until a key is saved.
    pub fn load<P: AsRef<Path>>(env_file: P, key_name: &str) -> Result<Self> {
        let env_file = env_file.as_ref().to_path_buf();
        let from_file = Self::read_from_file(&env_file, key_name)?;
        let value = from_file.or_else(|| std::env::var(key_name).ok());

        let current = match value.filter(|v| !v.trim().is_empty()) {
            Some(v) => {
                debug!(key = key_name, file = %env_file.display(), "Loaded API key");
                Some(Arc::new(ApiKey::new(v.trim())))
            }
            None => {
                warn!(
                    key = key_name,
                    file = %env_file.display(),
                    "No API key configured; model calls will fail until one is saved"
                );
                None
            }
        };

        Ok(Self {
            env_file,
            key_name: key_name.to_string(),
            current: ArcSwapOption::new(current),
        })
    }

    /// Store with a fixed in-memory key and no backing file contents (tests, embedding)
    pub fn in_memory<P: AsRef<Path>>(env_file: P, key: Option<&str>) -> Self {
        Self {
            env_file: env_file.as_ref().to_path_buf(),
            key_name: DEFAULT_KEY_NAME.to_string(),
            current: ArcSwapOption::new(key.map(|k| Arc::new(ApiKey::new(k)))),
        }
    }

    fn read_from_file(path: &Path, key_name: &str) -> Result<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }

        let iter = dotenvy::from_path_iter(path).map_err(|e| {
            AppError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let mut found = None;
        for item in iter {
            let (name, value) = item.map_err(|e| {
                AppError::Configuration(format!("Failed to parse {}: {}", path.display(), e))
            })?;
            if name == key_name {
                found = Some(value);
            }
        }
        Ok(found)
    }

    /// Name of the variable this store manages
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Path of the backing `.env` file
    pub fn env_file(&self) -> &Path {
        &self.env_file
    }

    /// The key currently in effect
    pub fn current(&self) -> Option<Arc<ApiKey>> {
        self.current.load_full()
    }

    pub fn is_set(&self) -> bool {
        self.current.load().is_some()
    }

    /// Replace the key, persisting it to the `.env` file.
    ///
    /// Blank input is rejected without touching the file or the live value.
    pub fn set(&self, new_value: &str) -> Result<()> {
        let value = new_value.trim();
        if value.is_empty() {
            return Err(AppError::InvalidInput("No key entered".to_string()));
        }
        if value.contains('\n') || value.contains('\r') {
            return Err(AppError::InvalidInput(
                "Key must be a single line".to_string(),
            ));
        }

        self.persist(value)?;
        self.current.store(Some(Arc::new(ApiKey::new(value))));
        info!(key = %self.key_name, file = %self.env_file.display(), "API key saved");
        Ok(())
    }

    fn persist(&self, value: &str) -> Result<()> {
        let existing = if self.env_file.exists() {
            fs::read_to_string(&self.env_file)?
        } else {
            String::new()
        };

        let contents = upsert_assignment(&existing, &self.key_name, value);

        replace_file(&self.env_file, &contents)?;
        Ok(())
    }
}

/// Replace `path` through a sibling temp file and a rename, keeping its permissions.
///
/// The temp file is removed if either step fails.
fn replace_file(path: &Path, contents: &str) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".env".to_string());
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));
    let permissions = fs::metadata(path).ok().map(|m| m.permissions());

    let written =
        write_private(&tmp, contents, permissions).and_then(|()| fs::rename(&tmp, path));
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}

/// Write `contents` to `path`, applying `permissions` or owner-only access for a new file.
fn write_private(
    path: &Path,
    contents: &str,
    permissions: Option<fs::Permissions>,
) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())?;

    match permissions {
        Some(permissions) => file.set_permissions(permissions)?,
        #[cfg(unix)]
        None => {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?
        }
        #[cfg(not(unix))]
        None => {}
    }
    file.sync_all()
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("env_file", &self.env_file)
            .field("key_name", &self.key_name)
            .field("is_set", &self.is_set())
            .finish()
    }
}

/// Quote a value the way `.env` readers expect.
///
/// Single quotes are literal. A value containing one is double-quoted instead,
/// with `$` escaped so the reader does not substitute variables.
fn quote_value(value: &str) -> String {
    if value.contains('\'') {
        let escaped = value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('$', "\\$");
        format!("\"{}\"", escaped)
    } else {
        format!("'{}'", value)
    }
}

fn assigns_key(line: &str, key: &str) -> bool {
    let trimmed = line.trim_start();
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed).trim_start();
    trimmed
        .strip_prefix(key)
        .map(|rest| rest.trim_start().starts_with('='))
        .unwrap_or(false)
}

/// Replace every assignment of `key` in `contents`, or append one, preserving other lines.
fn upsert_assignment(contents: &str, key: &str, value: &str) -> String {
    let assignment = format!("{}={}", key, quote_value(value));
    let mut replaced = false;
    let mut lines: Vec<String> = Vec::new();

    for line in contents.lines() {
        if assigns_key(line, key) {
            if !replaced {
                lines.push(assignment.clone());
                replaced = true;
            }
        } else {
            lines.push(line.to_string());
        }
    }

    if !replaced {
        lines.push(assignment);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_masked_key() {
        assert_eq!(ApiKey::new("sk-abcdefghijkl").masked(), "sk-...ijkl");
        assert_eq!(ApiKey::new("short").masked(), "****");
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = ApiKey::new("sk-secret-value");
        let printed = format!("{:?}", key);
        assert!(!printed.contains("secret"));
    }

    #[test]
    fn test_upsert_replaces_existing_line() {
        let contents = "FOO=1\nOPENAI_API_KEY=old\nBAR=2\n";
        let out = upsert_assignment(contents, "OPENAI_API_KEY", "new");
        assert_eq!(out, "FOO=1\nOPENAI_API_KEY='new'\nBAR=2\n");
    }

    #[test]
    fn test_upsert_appends_when_missing() {
        let out = upsert_assignment("FOO=1", "OPENAI_API_KEY", "sk-1");
        assert_eq!(out, "FOO=1\nOPENAI_API_KEY='sk-1'\n");
    }

    #[test]
    fn test_upsert_handles_export_and_duplicates() {
        let contents = "export OPENAI_API_KEY = a\nOPENAI_API_KEY=b\nOPENAI_API_KEY_2=c\n";
        let out = upsert_assignment(contents, "OPENAI_API_KEY", "z");
        assert_eq!(out, "OPENAI_API_KEY='z'\nOPENAI_API_KEY_2=c\n");
    }

    #[test]
    fn test_quote_value_with_single_quote() {
        assert_eq!(quote_value("a'b"), "\"a'b\"");
        assert_eq!(quote_value("a'b$HOME"), "\"a'b\\$HOME\"");
        assert_eq!(quote_value("a'b\"c\\d"), "\"a'b\\\"c\\\\d\"");
    }

    #[test]
    fn test_failed_replace_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("occupied");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("inner"), "x").unwrap();

        assert!(replace_file(&target, "KEY='v'\n").is_err());
        assert!(!dir.path().join(".occupied.tmp").exists());
        assert!(target.is_dir());
    }

    #[test]
    fn test_load_missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let store =
            CredentialStore::load(dir.path().join(".env"), "SWARM_CHAT_TEST_UNSET_KEY").unwrap();
        assert!(!store.is_set());
    }

    #[test]
    fn test_set_and_reload_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "OTHER=keep\n").unwrap();

        let store = CredentialStore::load(&path, "SWARM_CHAT_TEST_KEY").unwrap();
        store.set("  sk-new-key-1234  ").unwrap();
        assert_eq!(store.current().unwrap().expose(), "sk-new-key-1234");

        let reloaded = CredentialStore::load(&path, "SWARM_CHAT_TEST_KEY").unwrap();
        assert_eq!(reloaded.current().unwrap().expose(), "sk-new-key-1234");

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("OTHER=keep"));
    }

    #[test]
    fn test_blank_value_is_rejected_without_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "SWARM_CHAT_TEST_KEY2=original\n").unwrap();

        let store = CredentialStore::load(&path, "SWARM_CHAT_TEST_KEY2").unwrap();
        let result = store.set("   ");
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(store.current().unwrap().expose(), "original");
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "SWARM_CHAT_TEST_KEY2=original\n"
        );
    }
}
