use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::Config;

/// Load the default config shipped in the repo
fn load_repo_default_config() -> anyhow::Result<Config> {
    tracing::info!("Loading repo default config...");
    let file = File::open("config.json")?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)?;
    Ok(config)
}

/// Windows Roaming folder
#[cfg(windows)]
fn config_root() -> anyhow::Result<PathBuf> {
    use windows::Win32::UI::Shell::{FOLDERID_RoamingAppData, KF_FLAG_DEFAULT, SHGetKnownFolderPath};

    unsafe {
        let path = SHGetKnownFolderPath(&FOLDERID_RoamingAppData, KF_FLAG_DEFAULT, None)
            .context("Failed to get RoamingAppData")?;
        let path = path.to_string().context("RoamingAppData is not valid UTF-16")?;
        Ok(PathBuf::from(path))
    }
}

/// `$XDG_CONFIG_HOME`, else `$HOME/.config`
#[cfg(not(windows))]
fn config_root() -> anyhow::Result<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var_os("HOME").context("Neither XDG_CONFIG_HOME nor HOME is set")?;
    Ok(PathBuf::from(home).join(".config"))
}

/// Represents a user profile
#[derive(Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub value: Config,
}

/// `QuizLens/` folder holding profiles and the credential record
pub struct ProfileStore {
    root: PathBuf,
}

impl ProfileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn locate() -> anyhow::Result<Self> {
        Ok(Self::new(config_root()?.join("QuizLens")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn profiles_dir(&self) -> PathBuf {
        self.root.join("profiles")
    }

    /// Initialize user config folders and main profile if missing
    pub fn init(&self) -> anyhow::Result<()> {
        fs::create_dir_all(self.profiles_dir())?;

        let main_profile = self.profiles_dir().join("main.json");

        if !main_profile.exists() {
            let default_config = load_repo_default_config().unwrap_or_else(|e| {
                tracing::debug!("No repo default config ({}), using built-in defaults", e);
                Config::default()
            });
            let profile = Profile {
                name: "main".into(),
                value: default_config,
            };
            fs::write(&main_profile, serde_json::to_string_pretty(&profile)?)?;
            tracing::info!("Created main profile at {}", main_profile.display());
        }

        Ok(())
    }

    /// Load a user profile by name, defaulting to main if name not found
    pub fn load(&self, name: &str) -> anyhow::Result<Config> {
        let profile_file = self.profiles_dir().join(format!("{name}.json"));

        if profile_file.exists() {
            return read_profile(&profile_file);
        }

        tracing::warn!("Profile {name} not found, falling back to main profile");
        let main_file = self.profiles_dir().join("main.json");
        if main_file.exists() {
            read_profile(&main_file)
        } else {
            Ok(load_repo_default_config().unwrap_or_default())
        }
    }

    /// Where the API key lives, honoring an explicit override
    pub fn credential_path(&self, config: &Config) -> PathBuf {
        match &config.credential.path {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => self.root.join("credentials.json"),
        }
    }
}

fn read_profile(path: &Path) -> anyhow::Result<Config> {
    let data = fs::read_to_string(path)?;
    let profile: Profile = serde_json::from_str(&data)
        .with_context(|| format!("Invalid profile {}", path.display()))?;
    Ok(profile.value)
}
