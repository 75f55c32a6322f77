pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the config directory
pub const HOME_ENV: &str = "AEROLAB_HOME";
pub const DEFAULTS_FILE: &str = "defaults.yaml";
pub const INVENTORY_FILE: &str = "inventory.json";
pub const KEYS_DIR: &str = "keys";

/// AeroLab's config directory, created on first use
///
/// `$AEROLAB_HOME` when set, `<user config dir>/aerolab` otherwise.
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = match std::env::var_os(HOME_ENV) {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => dirs::config_dir()
            .ok_or(ConfigError::ConfigDirNotFound)?
            .join("aerolab"),
    };

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        tracing::debug!("Created config directory: {}", config_dir.display());
    }

    Ok(config_dir)
}

/// Inventory backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Docker,
    /// JSON inventory snapshot on disk
    File,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Docker => write!(f, "docker"),
            Backend::File => write!(f, "file"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "docker" => Ok(Backend::Docker),
            "file" => Ok(Backend::File),
            other => Err(ConfigError::InvalidValue {
                key: "backend",
                reason: format!("unknown backend '{}', expected docker or file", other),
            }),
        }
    }
}

/// Option defaults from `defaults.yaml`; command line flags win over these
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub parallel_threads: usize,
    pub connect_timeout_secs: u64,
    /// 0 leaves sessions unbounded
    pub session_timeout_secs: u64,
    pub ssh_user: String,
    /// Defaults to `<config dir>/keys`
    pub ssh_key_dir: Option<PathBuf>,
    pub backend: Backend,
    /// Defaults to `<config dir>/inventory.json`
    pub inventory_file: Option<PathBuf>,
    /// Only list docker resources of this `AEROLAB_PROJECT`
    pub docker_project: Option<String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            parallel_threads: 10,
            connect_timeout_secs: 30,
            session_timeout_secs: 600,
            ssh_user: "root".to_string(),
            ssh_key_dir: None,
            backend: Backend::default(),
            inventory_file: None,
            docker_project: None,
        }
    }
}

impl Defaults {
    /// Load `defaults.yaml` from the config directory
    pub fn load() -> Result<Self> {
        Self::load_from(get_config_dir()?.join(DEFAULTS_FILE))
    }

    /// Load a defaults file; a missing file yields the built-in defaults
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("Defaults file {} not found, using built-in defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let defaults: Defaults =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::InvalidDefaults {
                path: path.display().to_string(),
                source,
            })?;
        defaults.validate()?;
        Ok(defaults)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.parallel_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "parallel_threads",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "connect_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn session_timeout(&self) -> Option<Duration> {
        (self.session_timeout_secs > 0).then(|| Duration::from_secs(self.session_timeout_secs))
    }

    pub fn ssh_key_dir(&self, config_dir: &Path) -> PathBuf {
        self.ssh_key_dir
            .clone()
            .unwrap_or_else(|| config_dir.join(KEYS_DIR))
    }

    pub fn inventory_file(&self, config_dir: &Path) -> PathBuf {
        self.inventory_file
            .clone()
            .unwrap_or_else(|| config_dir.join(INVENTORY_FILE))
    }
}
