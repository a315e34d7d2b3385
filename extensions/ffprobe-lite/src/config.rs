//! Configuration loading for ffprobe-lite
//!
//! Sources, later overriding earlier:
//! 1. Built-in defaults
//! 2. TOML file: `FFPROBE_LITE_CONFIG`, else `./ffprobe-lite.toml`,
//!    else `$XDG_CONFIG_HOME/ffprobe-lite/config.toml`
//! 3. Environment: `ALLOWED_DIRS`, `RATE_LIMIT`, `FFPROBE_BIN`,
//!    `FFPROBE_TIMEOUT`, `CLIENT_ID`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use fs_sandbox::config::{parse_allowed, ClientConfig, PathConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathConfig,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub ffprobe: FfprobeConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    /// Requests per minute per client
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FfprobeConfig {
    /// Executable name looked up on `PATH`, or a path to it
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Wall-clock limit for one ffprobe run
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_rate_limit() -> u32 {
    60
}

fn default_binary() -> String {
    "ffprobe".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: default_rate_limit(),
        }
    }
}

impl Default for FfprobeConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            timeout_secs: default_timeout_secs(),
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
        if let Some(raw) = lookup("ALLOWED_DIRS") {
            self.paths.allowed = parse_allowed(&raw);
        }

        if let Some(raw) = lookup("RATE_LIMIT") {
            self.limits.rate_limit_per_minute = raw
                .trim()
                .parse()
                .with_context(|| format!("RATE_LIMIT is not a number: {raw}"))?;
        }

        if let Some(bin) = lookup("FFPROBE_BIN").filter(|b| !b.trim().is_empty()) {
            self.ffprobe.binary = bin.trim().to_string();
        }

        if let Some(raw) = lookup("FFPROBE_TIMEOUT") {
            self.ffprobe.timeout_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("FFPROBE_TIMEOUT is not a number of seconds: {raw}"))?;
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
        if self.ffprobe.timeout_secs == 0 {
            bail!("ffprobe timeout_secs must be positive");
        }
        Ok(())
    }

    fn find_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("FFPROBE_LITE_CONFIG") {
            return Some(PathBuf::from(path));
        }

        let local = PathBuf::from("ffprobe-lite.toml");
        if local.exists() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("ffprobe-lite").join("config.toml"))
            .filter(|path| path.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.ffprobe.binary, "ffprobe");
        assert_eq!(config.ffprobe.timeout_secs, 10);
        assert_eq!(config.limits.rate_limit_per_minute, 60);
        assert!(config.paths.allowed.is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("ALLOWED_DIRS", r#"["~/Movies"]"#),
                ("FFPROBE_BIN", "/opt/ffmpeg/bin/ffprobe"),
                ("FFPROBE_TIMEOUT", "3"),
            ]))
            .unwrap();

        assert_eq!(config.paths.allowed, vec!["~/Movies"]);
        assert_eq!(config.ffprobe.binary, "/opt/ffmpeg/bin/ffprobe");
        assert_eq!(config.ffprobe.timeout_secs, 3);
    }

    #[test]
    fn test_zero_timeout_invalid() {
        let mut config = Config::default();
        config.apply_env(env(&[("FFPROBE_TIMEOUT", "0")])).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_sections() {
        let config: Config = toml::from_str(
            r#"
            [paths]
            allowed = ["/srv/media"]

            [ffprobe]
            timeout_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.paths.allowed, vec!["/srv/media"]);
        assert_eq!(config.ffprobe.timeout_secs, 30);
        assert_eq!(config.ffprobe.binary, "ffprobe");
    }
}
