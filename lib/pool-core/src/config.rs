//! On-disk configuration model
//!
//! The YAML file is deserialized into these types as-is; defaults are
//! resolved and validated when building a [`PoolRegistry`](crate::PoolRegistry).

use crate::{CoreError, Result};
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration file
#[derive(Clone, Debug, Deserialize)]
pub struct WatchConfig {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub message: MessageConfig,
    /// Address for the `/metrics` listener, disabled when absent
    #[serde(default)]
    pub metrics_addr: Option<String>,
    #[serde(default)]
    pub pools: Vec<PoolEntry>,
}

impl WatchConfig {
    /// Parse a configuration document
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read and parse a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text)
    }
}

/// Global defaults applied to every pool unless overridden
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub api_timeout_secs: u64,
    pub stratum_timeout_secs: u64,
    pub retry_limit: u32,
    /// Share of total hash rate (percent) at which a pool is called out
    pub hash_power_warn_pct: f64,
    /// Maximum number of pools probed at the same time
    pub check_concurrency: usize,
    pub api_paths: ApiPaths,
    /// Algorithm key looked up in NOMP `algos`
    pub nomp_algo: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            api_timeout_secs: 30,
            stratum_timeout_secs: 10,
            retry_limit: 3,
            hash_power_warn_pct: 40.0,
            check_concurrency: 1,
            api_paths: ApiPaths::default(),
            nomp_algo: "yescrypt".to_string(),
        }
    }
}

/// Status API path per backend family
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ApiPaths {
    pub mpos: String,
    pub nomp: String,
}

impl Default for ApiPaths {
    fn default() -> Self {
        Self {
            mpos: "/index.php?page=api&action=public".to_string(),
            nomp: "/api/stats".to_string(),
        }
    }
}

/// Cadences used by the process-level scheduler
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub check_interval_secs: u64,
    pub digest_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 300,
            digest_interval_secs: 6 * 60 * 60,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    /// Appended as the last line of alerts and digests when non-empty
    pub footer: String,
}

/// A single pool as written in the file
#[derive(Clone, Debug, Deserialize)]
pub struct PoolEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub shortname: Option<String>,
    pub url: String,
    pub backend: String,
    #[serde(default)]
    pub api_path: Option<String>,
    pub stratum: StratumEntry,
    #[serde(default)]
    pub api_timeout_secs: Option<u64>,
    #[serde(default)]
    pub stratum_timeout_secs: Option<u64>,
    #[serde(default)]
    pub retry_limit: Option<u32>,
    #[serde(default = "default_alert")]
    pub alert: bool,
}

fn default_alert() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize)]
pub struct StratumEntry {
    pub host: String,
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_document_uses_defaults() {
        let config = WatchConfig::from_yaml(
            r#"
pools:
  - id: a
    name: Pool A
    url: https://a.example
    backend: mpos
    stratum: { host: a.example, port: 3333 }
"#,
        )
        .expect("valid config");

        assert_eq!(config.defaults.api_timeout_secs, 30);
        assert_eq!(config.defaults.retry_limit, 3);
        assert_eq!(config.defaults.nomp_algo, "yescrypt");
        assert_eq!(config.schedule.check_interval_secs, 300);
        assert!(config.metrics_addr.is_none());
        assert_eq!(config.pools.len(), 1);
        assert!(config.pools[0].alert);
        assert!(config.pools[0].shortname.is_none());
    }

    #[test]
    fn test_partial_defaults_override() {
        let config = WatchConfig::from_yaml(
            r##"
defaults:
  retry_limit: 5
  api_paths:
    nomp: /api/pool_stats
message:
  footer: "#bitzeny #ZNY"
pools: []
"##,
        )
        .expect("valid config");

        assert_eq!(config.defaults.retry_limit, 5);
        assert_eq!(config.defaults.stratum_timeout_secs, 10);
        assert_eq!(config.defaults.api_paths.nomp, "/api/pool_stats");
        assert_eq!(
            config.defaults.api_paths.mpos,
            "/index.php?page=api&action=public"
        );
        assert_eq!(config.message.footer, "#bitzeny #ZNY");
    }

    #[test]
    fn test_missing_required_field_is_error() {
        let result = WatchConfig::from_yaml(
            r#"
pools:
  - id: a
    url: https://a.example
    backend: mpos
    stratum: { host: a.example, port: 3333 }
"#,
        );
        assert!(matches!(result, Err(CoreError::ConfigParse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = WatchConfig::load("/nonexistent/pools.yaml");
        assert!(matches!(result, Err(CoreError::ConfigRead { .. })));
    }
}
