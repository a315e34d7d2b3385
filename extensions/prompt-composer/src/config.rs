//! Configuration loading for prompt-composer
//!
//! Defaults, then a TOML file (`PROMPT_COMPOSER_CONFIG`, else
//! `./prompt-composer.toml`, else `$XDG_CONFIG_HOME/prompt-composer/config.toml`),
//! then `RATE_LIMIT`, `MAX_BLOCKS`, `MAX_PROMPT_BYTES` and `CLIENT_ID` from
//! the environment.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    /// Requests per minute per client
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
    /// Most blocks held at once
    #[serde(default = "default_max_blocks")]
    pub max_blocks: usize,
    /// Largest composed prompt, in bytes
    #[serde(default = "default_max_prompt_bytes")]
    pub max_prompt_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_client_id")]
    pub id: String,
}

fn default_rate_limit() -> u32 {
    60
}

fn default_max_blocks() -> usize {
    256
}

fn default_max_prompt_bytes() -> usize {
    256 * 1024
}

fn default_client_id() -> String {
    "default".to_string()
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: default_rate_limit(),
            max_blocks: default_max_blocks(),
            max_prompt_bytes: default_max_prompt_bytes(),
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
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_path() {
            Some(path) => {
                tracing::info!("Loading config from: {}", path.display());
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                toml::from_str(&content)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup("RATE_LIMIT") {
            self.limits.rate_limit_per_minute = raw
                .trim()
                .parse()
                .with_context(|| format!("RATE_LIMIT is not a number: {raw}"))?;
        }
        if let Some(raw) = lookup("MAX_BLOCKS") {
            self.limits.max_blocks = raw
                .trim()
                .parse()
                .with_context(|| format!("MAX_BLOCKS is not a number: {raw}"))?;
        }
        if let Some(raw) = lookup("MAX_PROMPT_BYTES") {
            self.limits.max_prompt_bytes = raw
                .trim()
                .parse()
                .with_context(|| format!("MAX_PROMPT_BYTES is not a number: {raw}"))?;
        }
        if let Some(id) = lookup("CLIENT_ID").filter(|id| !id.trim().is_empty()) {
            self.client.id = id.trim().to_string();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.limits.rate_limit_per_minute == 0 {
            bail!("rate_limit_per_minute must be positive");
        }
        if self.limits.max_blocks == 0 {
            bail!("max_blocks must be positive");
        }
        if self.limits.max_prompt_bytes == 0 {
            bail!("max_prompt_bytes must be positive");
        }
        Ok(())
    }

    fn find_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("PROMPT_COMPOSER_CONFIG") {
            return Some(PathBuf::from(path));
        }

        let local = PathBuf::from("prompt-composer.toml");
        if local.exists() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("prompt-composer").join("config.toml"))
            .filter(|path| path.exists())
    }
}
