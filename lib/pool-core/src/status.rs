//! Last-known status per endpoint

use crate::{CoreError, PoolRegistry, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Reachability and hash rate of one endpoint after a check
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EndpointStatus {
    pub api_reachable: bool,
    pub stratum_reachable: bool,
    /// kH/s, 0 when the API is down or the backend is unknown
    pub hash_rate: f64,
}

impl EndpointStatus {
    pub fn new(api_reachable: bool, stratum_reachable: bool, hash_rate: f64) -> Self {
        Self {
            api_reachable,
            stratum_reachable,
            hash_rate,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.api_reachable && self.stratum_reachable
    }

    /// True when either reachability flag differs; hash rate is ignored
    pub fn reachability_differs(&self, other: &EndpointStatus) -> bool {
        self.api_reachable != other.api_reachable
            || self.stratum_reachable != other.stratum_reachable
    }
}

impl Default for EndpointStatus {
    /// Optimistic startup state
    fn default() -> Self {
        Self::new(true, true, 0.0)
    }
}

/// Result of [`StateStore::compare_and_set`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub previous: EndpointStatus,
    pub changed: bool,
}

/// StateStore holds exactly one status per registered endpoint.
///
/// Statuses are only ever replaced whole through `compare_and_set`.
#[derive(Clone)]
pub struct StateStore {
    statuses: Arc<RwLock<HashMap<String, EndpointStatus>>>,
}

impl StateStore {
    /// Create a store seeded with the optimistic default for every pool
    pub fn new(registry: &PoolRegistry) -> Self {
        let statuses = registry
            .ids()
            .map(|id| (id.to_string(), EndpointStatus::default()))
            .collect();

        Self {
            statuses: Arc::new(RwLock::new(statuses)),
        }
    }

    /// Get the status of one endpoint
    pub async fn get(&self, id: &str) -> Result<EndpointStatus> {
        let statuses = self.statuses.read().await;
        statuses
            .get(id)
            .copied()
            .ok_or_else(|| CoreError::EndpointNotFound(id.to_string()))
    }

    /// Copy of every status, for digests
    pub async fn snapshot(&self) -> HashMap<String, EndpointStatus> {
        let statuses = self.statuses.read().await;
        statuses.clone()
    }

    /// Swap in a new status, returning the old one and whether reachability changed
    pub async fn compare_and_set(&self, id: &str, status: EndpointStatus) -> Result<Transition> {
        let mut statuses = self.statuses.write().await;
        let slot = statuses
            .get_mut(id)
            .ok_or_else(|| CoreError::EndpointNotFound(id.to_string()))?;

        let previous = std::mem::replace(slot, status);
        let changed = previous.reachability_differs(&status);
        if changed {
            debug!(
                "Status of {} changed: api {} -> {}, stratum {} -> {}",
                id,
                previous.api_reachable,
                status.api_reachable,
                previous.stratum_reachable,
                status.stratum_reachable
            );
        }

        Ok(Transition { previous, changed })
    }

    pub async fn len(&self) -> usize {
        let statuses = self.statuses.read().await;
        statuses.len()
    }
}
