//! Configuration loading for fs-sandbox
//!
//! Configuration is assembled once at startup, later sources overriding
//! earlier ones:
//! 1. Built-in defaults
//! 2. TOML file: `FS_SANDBOX_CONFIG`, else `./fs-sandbox.toml`,
//!    else `$XDG_CONFIG_HOME/fs-sandbox/config.toml`
//! 3. Environment: `ALLOWED_DIRS`, `MAX_FILE_SIZE` / `MAX_MB`, `RATE_LIMIT`,
//!    `MAX_LIST_ENTRIES`, `CLIENT_ID`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

const MIB: u64 = 1024 * 1024;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathConfig,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathConfig {
    /// Directories operations may touch; empty means nothing is reachable
    #[serde(default)]
    pub allowed: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum file size in bytes, for reads and writes alike
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Requests per minute per client
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
    /// Maximum entries returned by list_directory
    #[serde(default = "default_max_list_entries")]
    pub max_list_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Identifier the stdio client is rate-limited under
    #[serde(default = "default_client_id")]
    pub id: String,
}

fn default_max_file_size() -> u64 {
    8 * MIB
}

fn default_rate_limit() -> u32 {
    60
}

fn default_max_list_entries() -> usize {
    1000
}

fn default_client_id() -> String {
    "default".to_string()
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            rate_limit_per_minute: default_rate_limit(),
            max_list_entries: default_max_list_entries(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            id: default_client_id(),
        }
    }
}

impl Config {
    /// Load configuration from file and process environment
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_path() {
            Some(path) => {
                tracing::info!("Loading config from: {}", path.display());
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                toml::from_str(&content)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => {
                tracing::info!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup("ALLOWED_DIRS") {
            self.paths.allowed = parse_allowed(&raw);
        }

        if let Some(raw) = lookup("MAX_FILE_SIZE") {
            self.limits.max_file_size = raw
                .trim()
                .parse()
                .with_context(|| format!("MAX_FILE_SIZE is not a byte count: {raw}"))?;
        } else if let Some(raw) = lookup("MAX_MB") {
            let mb: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("MAX_MB is not a number: {raw}"))?;
            self.limits.max_file_size = match mb.max(1).checked_mul(MIB) {
                Some(bytes) => bytes,
                None => bail!("MAX_MB is too large: {raw}"),
            };
        }

        if let Some(raw) = lookup("RATE_LIMIT") {
            self.limits.rate_limit_per_minute = raw
                .trim()
                .parse()
                .with_context(|| format!("RATE_LIMIT is not a number: {raw}"))?;
        }

        if let Some(raw) = lookup("MAX_LIST_ENTRIES") {
            self.limits.max_list_entries = raw
                .trim()
                .parse()
                .with_context(|| format!("MAX_LIST_ENTRIES is not a number: {raw}"))?;
        }

        if let Some(id) = lookup("CLIENT_ID").filter(|id| !id.trim().is_empty()) {
            self.client.id = id.trim().to_string();
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.limits.max_file_size == 0 {
            bail!("max_file_size must be positive");
        }
        if self.limits.rate_limit_per_minute == 0 {
            bail!("rate_limit_per_minute must be positive");
        }
        if self.limits.max_list_entries == 0 {
            bail!("max_list_entries must be positive");
        }
        Ok(())
    }

    fn find_config_path() -> Option<PathBuf> {
        // 1. Explicit path always wins, even if missing (reported on read)
        if let Ok(path) = std::env::var("FS_SANDBOX_CONFIG") {
            return Some(PathBuf::from(path));
        }

        // 2. Local override
        let local = PathBuf::from("fs-sandbox.toml");
        if local.exists() {
            return Some(local);
        }

        // 3. $XDG_CONFIG_HOME/fs-sandbox/config.toml
        dirs::config_dir()
            .map(|dir| dir.join("fs-sandbox").join("config.toml"))
            .filter(|path| path.exists())
    }
}

/// Parse an allowlist given either as a JSON array or comma-separated
pub fn parse_allowed(raw: &str) -> Vec<String> {
    if let Ok(list) = serde_json::from_str::<Vec<String>>(raw) {
        return list
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
