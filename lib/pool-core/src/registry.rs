//! Pool registry holding the configured endpoints

use crate::config::{Defaults, PoolEntry, WatchConfig};
use crate::{BackendType, CoreError, EndpointConfig, Result};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// PoolRegistry is the immutable, ordered list of configured pools
#[derive(Clone, Debug)]
pub struct PoolRegistry {
    endpoints: Vec<EndpointConfig>,
    index: HashMap<String, usize>,
    hash_power_warn_pct: f64,
    check_concurrency: usize,
}

impl PoolRegistry {
    /// Build a registry from resolved endpoints
    pub fn new(endpoints: Vec<EndpointConfig>, hash_power_warn_pct: f64) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(CoreError::EmptyRegistry);
        }

        let mut index = HashMap::with_capacity(endpoints.len());
        for (i, endpoint) in endpoints.iter().enumerate() {
            if index.insert(endpoint.id.clone(), i).is_some() {
                return Err(CoreError::DuplicateEndpoint(endpoint.id.clone()));
            }
        }

        Ok(Self {
            endpoints,
            index,
            hash_power_warn_pct,
            check_concurrency: 1,
        })
    }

    /// Resolve and validate every pool in a configuration file
    pub fn from_config(config: &WatchConfig) -> Result<Self> {
        let endpoints = config
            .pools
            .iter()
            .map(|entry| resolve_entry(entry, &config.defaults))
            .collect::<Result<Vec<_>>>()?;

        let registry = Self::new(endpoints, config.defaults.hash_power_warn_pct)?
            .with_check_concurrency(config.defaults.check_concurrency);

        debug!("Loaded {} pools into registry", registry.len());
        Ok(registry)
    }

    /// Set how many endpoints a check cycle may probe at once (minimum 1)
    pub fn with_check_concurrency(mut self, concurrency: usize) -> Self {
        self.check_concurrency = concurrency.max(1);
        self
    }

    pub fn endpoints(&self) -> &[EndpointConfig] {
        &self.endpoints
    }

    pub fn get(&self, id: &str) -> Option<&EndpointConfig> {
        self.index.get(id).map(|&i| &self.endpoints[i])
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.endpoints.iter().map(|e| e.id.as_str())
    }

    pub fn hash_power_warn_pct(&self) -> f64 {
        self.hash_power_warn_pct
    }

    pub fn check_concurrency(&self) -> usize {
        self.check_concurrency
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

fn resolve_entry(entry: &PoolEntry, defaults: &Defaults) -> Result<EndpointConfig> {
    let invalid = |reason: &str| CoreError::InvalidConfiguration {
        endpoint: if entry.id.is_empty() { entry.name.clone() } else { entry.id.clone() },
        reason: reason.to_string(),
    };

    if entry.id.trim().is_empty() {
        return Err(invalid("id must not be empty"));
    }
    if entry.url.trim().is_empty() {
        return Err(invalid("url must not be empty"));
    }
    if entry.stratum.host.trim().is_empty() {
        return Err(invalid("stratum host must not be empty"));
    }
    if entry.stratum.port == 0 {
        return Err(invalid("stratum port must not be 0"));
    }

    let backend = BackendType::parse(&entry.backend);
    let api_path = match (&entry.api_path, &backend) {
        (Some(path), _) => path.clone(),
        (None, BackendType::Mpos) => defaults.api_paths.mpos.clone(),
        (None, BackendType::Nomp) => defaults.api_paths.nomp.clone(),
        (None, BackendType::Unknown(_)) => {
            return Err(invalid("unknown backend requires an explicit api_path"));
        }
    };

    let api_timeout_secs = entry.api_timeout_secs.unwrap_or(defaults.api_timeout_secs);
    let stratum_timeout_secs = entry
        .stratum_timeout_secs
        .unwrap_or(defaults.stratum_timeout_secs);
    if api_timeout_secs == 0 || stratum_timeout_secs == 0 {
        return Err(invalid("timeouts must be at least one second"));
    }

    let retry_limit = entry.retry_limit.unwrap_or(defaults.retry_limit);
    if retry_limit == 0 {
        return Err(invalid("retry_limit must be at least 1"));
    }

    Ok(EndpointConfig {
        id: entry.id.clone(),
        name: entry.name.clone(),
        shortname: entry.shortname.clone(),
        base_url: entry.url.clone(),
        backend,
        api_path,
        nomp_algo: defaults.nomp_algo.clone(),
        stratum_host: entry.stratum.host.clone(),
        stratum_port: entry.stratum.port,
        api_timeout: Duration::from_secs(api_timeout_secs),
        stratum_timeout: Duration::from_secs(stratum_timeout_secs),
        alert_enabled: entry.alert,
        retry_limit,
    })
}
