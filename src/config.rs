use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_ENV: &str = "SCHOOLD_CONFIG";
pub const LOG_ENV: &str = "SCHOOLD_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub log_filter: String,
    /// Log allowed decisions too, not only refusals.
    pub audit_decisions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_filter: "info".to_string(),
            audit_decisions: false,
        }
    }
}

/// JSON first, YAML as fallback.
pub fn parse_config_str(raw: &str) -> anyhow::Result<Config> {
    match serde_json::from_str(raw) {
        Ok(cfg) => Ok(cfg),
        Err(json_err) => serde_yaml::from_str(raw)
            .map_err(|yaml_err| anyhow!("json error: {json_err}; yaml error: {yaml_err}")),
    }
}

pub fn load_config_from_path(path: &Path) -> anyhow::Result<Config> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.to_string_lossy()))?;
    parse_config_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.to_string_lossy()))
}

/// Config file named by `SCHOOLD_CONFIG` (if any), then `SCHOOLD_LOG` on top.
pub fn load_config() -> anyhow::Result<Config> {
    let mut cfg = match std::env::var_os(CONFIG_ENV) {
        Some(p) if !p.is_empty() => load_config_from_path(Path::new(&p))?,
        _ => Config::default(),
    };
    if let Ok(filter) = std::env::var(LOG_ENV) {
        if !filter.trim().is_empty() {
            cfg.log_filter = filter;
        }
    }
    Ok(cfg)
}
