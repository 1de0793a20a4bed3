// src/core/config_manager.rs
//! Configuration: `config.yaml` with per-environment sections, plus environment variable overrides

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment: String,
    pub storage: StorageConfig,
    pub mirror: MirrorConfig,
    pub admin: AdminConfig,
    pub server: ServerSettings,
    /// Remote credential supplied through `CV_GITHUB_TOKEN`, wins over the stored one
    pub remote_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: EnvironmentConfig,
    production: Option<EnvironmentConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub storage: StorageConfig,
    pub mirror: MirrorConfig,
    pub admin: AdminConfig,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Slot directory for `file`, database file for `sqlite`
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: PathBuf::from("data/slots"),
        }
    }
}

/// Where the document and images are mirrored
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub data_path: String,
    pub asset_dir: String,
    pub api_base: String,
    pub raw_base: String,
    pub cdn_base: String,
    pub timeout_seconds: u64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            owner: "your-github-user".to_string(),
            repo: "cv".to_string(),
            branch: "main".to_string(),
            data_path: "cv-data.json".to_string(),
            asset_dir: "assets/images".to_string(),
            api_base: "https://api.github.com".to_string(),
            raw_base: "https://raw.githubusercontent.com".to_string(),
            cdn_base: "https://cdn.jsdelivr.net/gh".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl MirrorConfig {
    pub fn cdn_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}@{}/{}",
            self.cdn_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.branch,
            path.trim_start_matches('/')
        )
    }

    pub fn raw_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.raw_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.branch,
            path.trim_start_matches('/')
        )
    }

    pub fn contents_url(&self, path: &str) -> String {
        format!("{}/contents/{}", self.repo_url(), path.trim_start_matches('/'))
    }

    pub fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_base.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }

    pub fn user_url(&self) -> String {
        format!("{}/user", self.api_base.trim_end_matches('/'))
    }

    /// Whether a stored image reference is a path inside the mirrored repository
    pub fn is_repo_asset(&self, reference: &str) -> bool {
        let prefix = format!("{}/", self.asset_dir.trim_matches('/'));
        reference.starts_with(&prefix)
    }

    pub fn is_cdn_url(&self, reference: &str) -> bool {
        reference.starts_with(self.cdn_base.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,
    /// Initial password, replaced by the stored one once changed
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "change-me".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

impl ConfigManager {
    /// Load configuration for the current environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Like [`ConfigManager::load`], with an explicit file taking precedence over `CV_CONFIG`
    pub fn load_from(path: Option<PathBuf>) -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let config_path = path
            .or_else(|| std::env::var("CV_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let env_config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            Self::parse_environment(&content, &environment)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            info!(
                "{} not found, using built-in defaults",
                config_path.display()
            );
            EnvironmentConfig::default()
        };

        let mut config = Self::from_environment_config(environment, env_config)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("CV_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    /// Pick the section for `environment`; production falls back to local when absent
    pub fn parse_environment(content: &str, environment: &str) -> Result<EnvironmentConfig> {
        let config_file: ConfigFile =
            serde_yaml::from_str(content).context("Invalid configuration YAML")?;

        Ok(match environment {
            "production" => config_file.production.unwrap_or(config_file.local),
            _ => config_file.local,
        })
    }

    pub fn from_environment_config(environment: String, env_config: EnvironmentConfig) -> Result<Self> {
        let mut storage = env_config.storage;
        storage.path = Self::resolve_path(&storage.path)?;

        Ok(Self {
            environment,
            storage,
            mirror: env_config.mirror,
            admin: env_config.admin,
            server: env_config.server,
            remote_token: None,
        })
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(port) = std::env::var("ROCKET_PORT") {
            self.server.port = port
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("ROCKET_PORT must be a valid port number"))?;
        }

        self.remote_token = std::env::var("CV_GITHUB_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(())
    }

    fn resolve_path(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }
}
