// Per-repository configuration at `<repo>/.sprout/config.toml`.
//
// Every field has a default so the tool works in a bare checkout with no
// config file at all.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Path to the config file under a repository root.
pub fn config_path(repo_root: &Path) -> PathBuf {
    repo_root.join(".sprout").join("config.toml")
}

/// Configuration for one target repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Git remote and branch to sync with.
    pub git: GitConfig,
    /// Artifact file names, relative to the repository root.
    pub artifacts: ArtifactConfig,
    /// Delays between commit attempts.
    pub pacing: PacingConfig,
}

impl Config {
    /// Load from `<repo>/.sprout/config.toml`. Returns defaults if the
    /// file doesn't exist or can't be parsed.
    pub fn load(repo_root: &Path) -> Self {
        let path = config_path(repo_root);
        Self::load_from(&path).unwrap_or_else(|error| {
            debug!(path = %path.display(), %error, "using default config");
            Self::default()
        })
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        toml::from_str(&contents).map_err(ConfigError::Parse)
    }

    /// Save to a specific path (creates parent directories).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Git sync settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GitConfig {
    /// Remote name (defaults to `"origin"`).
    pub remote: String,
    /// Branch to push to (defaults to `"main"`).
    pub branch: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self { remote: "origin".into(), branch: "main".into() }
    }
}

/// Artifact file names, relative to the repository root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArtifactConfig {
    pub data_file: String,
    pub progress_file: String,
    pub backfill_log: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            data_file: "data.json".into(),
            progress_file: "daily-progress.md".into(),
            backfill_log: "backfill-log.txt".into(),
        }
    }
}

/// Delays between commit attempts. Cosmetic pacing, not a correctness
/// mechanism.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PacingConfig {
    /// Pause between live commits, in milliseconds.
    pub commit_delay_ms: u64,
    /// Pause after each backfill commit attempt, in milliseconds.
    pub backfill_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self { commit_delay_ms: 2000, backfill_delay_ms: 500 }
    }
}

impl PacingConfig {
    pub fn commit_delay(&self) -> Duration {
        Duration::from_millis(self.commit_delay_ms)
    }

    pub fn backfill_delay(&self) -> Duration {
        Duration::from_millis(self.backfill_delay_ms)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(std::io::Error),

    #[error("config parse error: {0}")]
    Parse(toml::de::Error),

    #[error("config serialize error: {0}")]
    Serialize(toml::ser::Error),
}
