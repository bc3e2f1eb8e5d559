//! Driver configuration: optional TOML file merged with command-line flags.
//!
//! Lookup order for the file:
//! 1. `--config` / `WORKCAST_CONFIG`
//! 2. `$WORKCAST_CONFIG_DIR/config.toml`
//! 3. `~/.config/workcast/config.toml`
//!
//! Flags and their environment variables win over the file, and the file
//! wins over the library defaults.

use crate::cli::HubArgs;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use workkit::HubConfig;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "WORKCAST_CONFIG_DIR";

/// Source id used when neither a flag nor the file sets one.
pub const DEFAULT_SOURCE_ID: &str = "workcast";

/// Contents of `config.toml`. Every field is optional.
///
/// ```toml
/// hub_url = "https://hub.example.com"
/// source_id = "platform-team"
/// consumer = "cluster-east"
/// health_timeout = "30s"
/// timeout = "10s"
/// page_size = 500
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub hub_url: Option<String>,
    pub source_id: Option<String>,
    /// Default consumer for commands that take `-c`.
    pub consumer: Option<String>,
    pub health_timeout: Option<String>,
    pub timeout: Option<String>,
    pub insecure_skip_verify: Option<bool>,
    pub page_size: Option<usize>,
}

impl FileConfig {
    /// Load the config file.
    ///
    /// An explicit path must exist; the default location may be absent, in
    /// which case an empty config is returned.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    log::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Merge flags over this file into a hub config.
    pub fn resolve(&self, args: &HubArgs) -> Result<HubConfig> {
        let Some(hub_url) = args.hub_url.clone().or_else(|| self.hub_url.clone()) else {
            bail!("No hub URL configured. Pass --hub-url, set WORKCAST_HUB_URL, or add hub_url to the config file");
        };
        let source_id = args
            .source_id
            .clone()
            .or_else(|| self.source_id.clone())
            .unwrap_or_else(|| DEFAULT_SOURCE_ID.to_string());

        let mut config = HubConfig::new(hub_url, source_id)
            .insecure_skip_verify(
                args.insecure_skip_verify || self.insecure_skip_verify.unwrap_or(false),
            );

        if let Some(timeout) = pick_duration(args.health_timeout, self.health_timeout.as_deref(), "health_timeout")? {
            config = config.health_timeout(timeout);
        }
        if let Some(timeout) = pick_duration(args.timeout, self.timeout.as_deref(), "timeout")? {
            config = config.request_timeout(timeout);
        }
        if let Some(size) = self.page_size {
            config = config.page_size(size);
        }

        config.validate()?;
        Ok(config)
    }

    /// Consumer from the flag, else from the file.
    pub fn consumer(&self, flag: Option<String>) -> Result<String> {
        match flag.or_else(|| self.consumer.clone()) {
            Some(consumer) if !consumer.trim().is_empty() => Ok(consumer),
            _ => bail!("No consumer given. Pass -c/--consumer, set WORKCAST_CONSUMER, or add consumer to the config file"),
        }
    }
}

fn pick_duration(flag: Option<Duration>, file: Option<&str>, key: &str) -> Result<Option<Duration>> {
    if flag.is_some() {
        return Ok(flag);
    }
    file.map(|raw| {
        parse_duration(raw).map_err(|e| anyhow::anyhow!("Invalid {key} in config file: {e}"))
    })
    .transpose()
}

/// Default config file location.
pub fn default_path() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        return Some(PathBuf::from(dir).join("config.toml"));
    }
    dirs::home_dir().map(|home| home.join(".config").join("workcast").join("config.toml"))
}

/// Parse a duration such as `500ms`, `20s`, `2m` or a bare number of seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(split);

    let value: u64 = number
        .parse()
        .map_err(|_| format!("Invalid duration: '{input}'"))?;

    match unit.trim() {
        "ms" => Ok(Duration::from_millis(value)),
        "" | "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        other => Err(format!("Unknown duration unit '{other}' (use ms, s or m)")),
    }
}
