// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::filter::FilterParams;
use crate::snapshot::DEFAULT_FETCH_TIMEOUT_SECS;

pub const ENV_CONFIG_PATH: &str = "PHD_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/phd_agent.toml";

pub const ENV_DATA_LOCATION: &str = "PHD_DATA_LOCATION";
pub const ENV_PROFILE_PATH: &str = "PHD_PROFILE_PATH";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "PHD_FETCH_TIMEOUT_SECS";

pub const ENV_FUNDING: &str = "PHD_FUNDING";
pub const ENV_MIN_SCORE: &str = "PHD_MIN_SCORE";
pub const ENV_SOURCE_TYPE: &str = "PHD_SOURCE_TYPE";
pub const ENV_ONLY_NEW: &str = "PHD_ONLY_NEW";

pub const DEFAULT_DATA_LOCATION: &str = "data/latest.json";
pub const DEFAULT_PROFILE_PATH: &str = "state/profile.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP(S) URL or local path of the snapshot document.
    pub data_location: String,
    /// JSON file backing the profile store.
    pub profile_path: PathBuf,
    pub fetch_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_location: DEFAULT_DATA_LOCATION.to_string(),
            profile_path: PathBuf::from(DEFAULT_PROFILE_PATH),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Resolve the config:
    /// 1) $PHD_CONFIG_PATH (must exist)
    /// 2) config/phd_agent.toml
    /// 3) built-in defaults
    ///
    /// then apply env overrides.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else {
            let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
            if fallback.exists() {
                Self::load_from_file(&fallback)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Unset or unparseable variables leave the current value alone.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = non_empty_env(ENV_DATA_LOCATION) {
            self.data_location = v;
        }
        if let Some(v) = non_empty_env(ENV_PROFILE_PATH) {
            self.profile_path = PathBuf::from(v);
        }
        if let Some(secs) = non_empty_env(ENV_FETCH_TIMEOUT_SECS).and_then(|v| v.parse().ok()) {
            self.fetch_timeout_secs = secs;
        }
    }

    /// Zero means "use the default", not "no timeout".
    pub fn fetch_timeout(&self) -> Duration {
        match self.fetch_timeout_secs {
            0 => Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            s => Duration::from_secs(s),
        }
    }
}

/// Filter parameters from `PHD_FUNDING`, `PHD_MIN_SCORE`, `PHD_SOURCE_TYPE`,
/// `PHD_ONLY_NEW`. Missing variables mean "no constraint".
pub fn filter_params_from_env() -> FilterParams {
    let get = |k: &str| std::env::var(k).unwrap_or_default();
    FilterParams::from_raw(
        &get(ENV_FUNDING),
        &get(ENV_MIN_SCORE),
        &get(ENV_SOURCE_TYPE),
        &get(ENV_ONLY_NEW),
    )
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: AppConfig = toml::from_str(r#"data_location = "https://example.org/latest.json""#)
            .unwrap();
        assert_eq!(cfg.data_location, "https://example.org/latest.json");
        assert_eq!(cfg.profile_path, PathBuf::from(DEFAULT_PROFILE_PATH));
        assert_eq!(cfg.fetch_timeout_secs, DEFAULT_FETCH_TIMEOUT_SECS);
    }

    #[test]
    fn zero_timeout_means_default() {
        let cfg = AppConfig {
            fetch_timeout_secs: 0,
            ..AppConfig::default()
        };
        assert_eq!(cfg.fetch_timeout(), Duration::from_secs(15));
    }
}
