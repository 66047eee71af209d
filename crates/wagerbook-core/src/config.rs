//! Configuration resolution for Wagerbook.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/wagerbook/settings.json)
//! 3. Explicit config file (`--config`)
//! 4. Environment variables
//! 5. CLI arguments (applied by the binary, highest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete Wagerbook configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub whitelist: WhitelistConfig,
}

/// HTTP server and storage settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub database_path: Option<PathBuf>,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            database_path: None,
            log_level: "info".to_string(),
        }
    }
}

/// Money rules of the ledger, in whole units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LedgerConfig {
    /// Balance a user starts with on first login.
    pub initial_balance: i64,
    /// Amount credited by a daily reward claim.
    pub daily_reward: i64,
    /// Default number of rows in the leaderboard.
    pub leaderboard_limit: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_balance: 5000,
            daily_reward: 500,
            leaderboard_limit: 20,
        }
    }
}

/// Name-pair whitelist settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct WhitelistConfig {
    pub enabled: bool,
    /// Roster CSV (`id,chinese_name,english_name`).
    pub roster_csv: Option<PathBuf>,
    /// CSV that entries added at runtime are appended to.
    pub additions_csv: Option<PathBuf>,
}

/// Load configuration with hierarchical resolution.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            let global = load_config_file(&global_path)?;
            merge_config(&mut config, global);
        }
    }

    if let Some(path) = explicit {
        let file = load_config_file(path)?;
        merge_config(&mut config, file);
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        .map(|p| p.join("wagerbook").join("settings.json"))
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn merge_config(base: &mut Config, overlay: Config) {
    if overlay.server.database_path.is_some() {
        base.server.database_path = overlay.server.database_path;
    }
    base.server.addr = overlay.server.addr;
    base.server.log_level = overlay.server.log_level;

    base.ledger = overlay.ledger;

    if overlay.whitelist.roster_csv.is_some() {
        base.whitelist.roster_csv = overlay.whitelist.roster_csv;
    }
    if overlay.whitelist.additions_csv.is_some() {
        base.whitelist.additions_csv = overlay.whitelist.additions_csv;
    }
    base.whitelist.enabled = overlay.whitelist.enabled;
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("WAGERBOOK_ADDR") {
        config.server.addr = val;
    }
    if let Some(val) = var("WAGERBOOK_DB_PATH") {
        config.server.database_path = Some(PathBuf::from(val));
    }
    if let Some(val) = var("WAGERBOOK_LOG_LEVEL") {
        config.server.log_level = val;
    }
    if let Some(n) = var("WAGERBOOK_INITIAL_BALANCE").and_then(|v| v.parse().ok()) {
        config.ledger.initial_balance = n;
    }
    if let Some(n) = var("WAGERBOOK_DAILY_REWARD").and_then(|v| v.parse().ok()) {
        config.ledger.daily_reward = n;
    }
    if let Some(val) = var("WAGERBOOK_WHITELIST") {
        config.whitelist.enabled = matches!(val.as_str(), "1" | "true" | "on" | "yes");
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.ledger.initial_balance < 0 {
        return Err(Error::Config("ledger.initial_balance must not be negative".into()));
    }
    if config.ledger.daily_reward < 0 {
        return Err(Error::Config("ledger.daily_reward must not be negative".into()));
    }
    if config.whitelist.enabled && config.whitelist.roster_csv.is_none() {
        return Err(Error::Config(
            "whitelist.enabled requires whitelist.roster_csv".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.ledger.initial_balance, 5000);
        assert_eq!(config.ledger.leaderboard_limit, 20);
        assert!(!config.whitelist.enabled);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"ledger": {"daily_reward": 250}}"#).unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.ledger.daily_reward, 250);
        assert_eq!(config.ledger.initial_balance, 5000);
        assert_eq!(config.server.addr, "0.0.0.0:8080");
    }

    #[test]
    fn unreadable_or_malformed_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let Error::Config(msg) = load_config_file(&missing).unwrap_err();
        assert!(msg.contains("missing.json"), "{msg}");

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ledger").unwrap();
        let Error::Config(msg) = load_config_file(&broken).unwrap_err();
        assert!(msg.starts_with("Failed to parse"), "{msg}");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| match key {
            "WAGERBOOK_DAILY_REWARD" => Some("42".into()),
            "WAGERBOOK_WHITELIST" => Some("true".into()),
            "WAGERBOOK_INITIAL_BALANCE" => Some("not-a-number".into()),
            _ => None,
        });
        assert_eq!(config.ledger.daily_reward, 42);
        assert_eq!(config.ledger.initial_balance, 5000);
        assert!(config.whitelist.enabled);
    }

    #[test]
    fn whitelist_needs_roster() {
        let mut config = Config::default();
        config.whitelist.enabled = true;
        assert!(validate(&config).is_err());
        config.whitelist.roster_csv = Some(PathBuf::from("roster.csv"));
        assert!(validate(&config).is_ok());
    }
}
