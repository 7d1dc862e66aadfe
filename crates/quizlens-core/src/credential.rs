use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use quizlens_config::CredentialBootstrap;
use quizlens_config::credential::CredentialConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("No API key configured")]
    Missing,

    #[error("API key is empty")]
    Empty,

    #[error("API key must start with one of: {0}")]
    UnrecognizedPrefix(String),

    #[error("Credential file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credential file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to replace credential file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// A validated API key
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(3).collect();
        write!(f, "ApiKey({prefix}***)")
    }
}

#[derive(Serialize, Deserialize)]
struct CredentialRecord {
    api_key: String,
}

/// Flat `{"api_key": "..."}` file
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<String>, CredentialError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record: CredentialRecord = serde_json::from_str(&data)?;
        Ok(Some(record.api_key))
    }

    /// Replace the record via temp file + rename in the same directory
    pub fn save(&self, api_key: &str) -> Result<(), CredentialError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let record = CredentialRecord {
            api_key: api_key.to_string(),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(serde_json::to_string_pretty(&record)?.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;

        Ok(())
    }
}

/// Loads, validates and saves the API key according to the bootstrap policy
///
/// Nothing is cached: every `load` goes back to the environment and disk.
pub struct CredentialManager {
    store: CredentialStore,
    bootstrap: CredentialBootstrap,
    env_var: String,
    accepted_prefixes: Vec<String>,
}

impl CredentialManager {
    pub fn new(store: CredentialStore, config: &CredentialConfig) -> Self {
        Self {
            store,
            bootstrap: config.bootstrap,
            env_var: config.env_var.clone(),
            accepted_prefixes: config.accepted_prefixes.clone(),
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn bootstrap(&self) -> CredentialBootstrap {
        self.bootstrap
    }

    /// Current valid key, if any
    pub fn load(&self) -> Option<ApiKey> {
        if self.bootstrap == CredentialBootstrap::Environment
            && let Ok(value) = std::env::var(&self.env_var)
        {
            match self.validate(&value) {
                Ok(key) => return Some(key),
                Err(e) => tracing::warn!("Ignoring {}: {}", self.env_var, e),
            }
        }

        match self.store.load() {
            Ok(Some(value)) => match self.validate(&value) {
                Ok(key) => Some(key),
                Err(e) => {
                    tracing::warn!("Stored API key rejected: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", self.store.path().display(), e);
                None
            }
        }
    }

    /// Shape check only, no network round trip
    pub fn validate(&self, candidate: &str) -> Result<ApiKey, CredentialError> {
        let key = candidate.trim();
        if key.is_empty() {
            return Err(CredentialError::Empty);
        }

        if !self.accepted_prefixes.is_empty()
            && !self.accepted_prefixes.iter().any(|p| key.starts_with(p.as_str()))
        {
            return Err(CredentialError::UnrecognizedPrefix(
                self.accepted_prefixes.join(", "),
            ));
        }

        Ok(ApiKey(key.to_string()))
    }

    pub fn save(&self, candidate: &str) -> Result<ApiKey, CredentialError> {
        let key = self.validate(candidate)?;
        self.store.save(key.expose())?;
        tracing::info!("API key saved to {}", self.store.path().display());
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(dir: &Path, bootstrap: CredentialBootstrap, env_var: &str) -> CredentialManager {
        let config = CredentialConfig {
            bootstrap,
            env_var: env_var.to_string(),
            ..Default::default()
        };
        CredentialManager::new(CredentialStore::new(dir.join("credentials.json")), &config)
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), CredentialBootstrap::Prompt, "QUIZLENS_TEST_UNUSED");

        assert!(manager.load().is_none());
        manager.save("sk-test-123").unwrap();
        assert_eq!(manager.load().unwrap().expose(), "sk-test-123");

        let raw = std::fs::read_to_string(dir.path().join("credentials.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!({ "api_key": "sk-test-123" }));
    }

    #[test]
    fn validate_requires_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), CredentialBootstrap::Prompt, "QUIZLENS_TEST_UNUSED");

        assert!(matches!(manager.validate("   "), Err(CredentialError::Empty)));
        assert!(matches!(
            manager.validate("pk-123"),
            Err(CredentialError::UnrecognizedPrefix(_))
        ));
        assert_eq!(manager.validate("  sk-abc \n").unwrap().expose(), "sk-abc");
    }

    #[test]
    fn invalid_save_keeps_previous_key() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), CredentialBootstrap::Prompt, "QUIZLENS_TEST_UNUSED");

        manager.save("sk-good").unwrap();
        assert!(manager.save("bad").is_err());
        assert_eq!(manager.load().unwrap().expose(), "sk-good");
        // no temp files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn corrupt_or_invalid_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), CredentialBootstrap::Prompt, "QUIZLENS_TEST_UNUSED");
        let path = dir.path().join("credentials.json");

        std::fs::write(&path, "{ not json").unwrap();
        assert!(manager.load().is_none());

        std::fs::write(&path, r#"{ "api_key": "" }"#).unwrap();
        assert!(manager.load().is_none());
    }

    #[test]
    fn reads_disk_on_every_load() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), CredentialBootstrap::Prompt, "QUIZLENS_TEST_UNUSED");

        manager.save("sk-first").unwrap();
        assert_eq!(manager.load().unwrap().expose(), "sk-first");

        CredentialStore::new(dir.path().join("credentials.json"))
            .save("sk-second")
            .unwrap();
        assert_eq!(manager.load().unwrap().expose(), "sk-second");
    }

    #[test]
    fn environment_bootstrap_prefers_env_var() {
        let dir = tempfile::tempdir().unwrap();
        let var = "QUIZLENS_TEST_ENV_BOOTSTRAP_KEY";
        let manager = manager(dir.path(), CredentialBootstrap::Environment, var);

        manager.store().save("sk-from-file").unwrap();
        assert_eq!(manager.load().unwrap().expose(), "sk-from-file");

        // SAFETY: the variable name is unique to this test
        unsafe { std::env::set_var(var, "sk-from-env") };
        assert_eq!(manager.load().unwrap().expose(), "sk-from-env");

        unsafe { std::env::set_var(var, "garbage") };
        assert_eq!(manager.load().unwrap().expose(), "sk-from-file");

        unsafe { std::env::remove_var(var) };
    }

    #[test]
    fn prompt_bootstrap_ignores_env_var() {
        let dir = tempfile::tempdir().unwrap();
        let var = "QUIZLENS_TEST_PROMPT_BOOTSTRAP_KEY";
        let manager = manager(dir.path(), CredentialBootstrap::Prompt, var);

        // SAFETY: the variable name is unique to this test
        unsafe { std::env::set_var(var, "sk-from-env") };
        assert!(manager.load().is_none());
        unsafe { std::env::remove_var(var) };
    }

    #[test]
    fn debug_output_hides_key() {
        let key = ApiKey("sk-secret-value".to_string());
        assert_eq!(format!("{key:?}"), "ApiKey(sk-***)");
    }
}
