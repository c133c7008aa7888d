use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Default port offered when connecting a local network project.
pub const DEFAULT_LOCAL_PORT: u16 = 8545;

/// Application configuration stored at `~/.chainview/config.json`.
///
/// Provider API tokens are read from the environment (see the `*_token_env`
/// fields), never written to the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainviewConfig {
    /// File the service/project tree is persisted to. Relative paths are
    /// resolved against [`ChainviewConfig::base_dir`].
    pub tree_file: PathBuf,

    /// Port suggested by the connect flow for new local projects.
    pub default_local_port: u16,

    /// Base URL of the Infura project API.
    pub infura_api_url: String,
    /// Base URL of the third-party provider (consortium) API.
    pub provider_api_url: String,
    /// Base URL of the data-manager API.
    pub data_manager_api_url: String,

    /// Environment variable holding the Infura access token.
    pub infura_token_env: String,
    /// Environment variable holding the provider access token.
    pub provider_token_env: String,
    /// Environment variable holding the data-manager access token.
    pub data_manager_token_env: String,
}

impl Default for ChainviewConfig {
    fn default() -> Self {
        Self {
            tree_file: PathBuf::from("tree.json"),
            default_local_port: DEFAULT_LOCAL_PORT,
            infura_api_url: "https://api.infura.io/v1".into(),
            provider_api_url: "https://consortium.example.com/api/v1".into(),
            data_manager_api_url: "https://datamanager.example.com/api/v1".into(),
            infura_token_env: "CHAINVIEW_INFURA_TOKEN".into(),
            provider_token_env: "CHAINVIEW_PROVIDER_TOKEN".into(),
            data_manager_token_env: "CHAINVIEW_DATA_MANAGER_TOKEN".into(),
        }
    }
}

impl ChainviewConfig {
    /// Base directory for all chainview state: `~/.chainview`.
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        let dir = home.join(".chainview");
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(dir)
    }

    /// Path to the config file: `~/.chainview/config.json`.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Directory for rotated log files: `~/.chainview/logs`.
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Absolute path of the persisted tree file.
    pub fn tree_path(&self) -> Result<PathBuf> {
        if self.tree_file.is_absolute() {
            Ok(self.tree_file.clone())
        } else {
            Ok(Self::base_dir()?.join(&self.tree_file))
        }
    }

    /// Load the config from disk, falling back to defaults when the file is
    /// missing. A corrupt file is an error, not a silent reset.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load the config from an explicit path (tests, embedded hosts).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Corrupt config file: {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    /// Write the config back to disk as pretty-printed JSON.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Look up a provider token from the configured environment variable.
    /// Returns `None` for unset or empty values.
    pub fn token_from_env(var: &str) -> Option<String> {
        match std::env::var(var) {
            Ok(v) if !v.trim().is_empty() => Some(v),
            _ => None,
        }
    }

    /// Check that every configured provider endpoint is a well-formed
    /// HTTP(S) URL. Run after load so a bad edit fails early, not mid-flow.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("infura_api_url", &self.infura_api_url),
            ("provider_api_url", &self.provider_api_url),
            ("data_manager_api_url", &self.data_manager_api_url),
        ] {
            if !validate_url(value) {
                anyhow::bail!("invalid {name}: {value}");
            }
        }
        Ok(())
    }
}

/// Validate that a URL is well-formed and uses HTTP or HTTPS.
pub fn validate_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            (scheme == "http" || scheme == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}
