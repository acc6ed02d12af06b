//! Prometheus metrics for check and digest cycles

use anyhow::Result;
use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Prometheus metrics collector for the watcher
#[derive(Clone)]
pub struct WatchMetrics {
    /// Failed probe results by channel and failure kind
    pub probe_failures_total: CounterVec,
    /// Alerts by outcome (posted, suppressed, dry_run, failed)
    pub alerts_total: CounterVec,
    /// Cycles by cycle name and outcome (completed, skipped)
    pub cycles_total: CounterVec,
    /// 1 when the channel of an endpoint was reachable at the last check
    pub endpoint_up: GaugeVec,
    /// Prometheus registry for metrics
    pub registry: Arc<Registry>,
}

impl WatchMetrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let probe_failures_total = CounterVec::new(
            Opts::new("pool_watch_probe_failures_total", "Failed probe results"),
            &["channel", "kind"],
        )?;

        let alerts_total = CounterVec::new(
            Opts::new("pool_watch_alerts_total", "Transition alerts by outcome"),
            &["outcome"],
        )?;

        let cycles_total = CounterVec::new(
            Opts::new("pool_watch_cycles_total", "Check and digest cycles by outcome"),
            &["cycle", "outcome"],
        )?;

        let endpoint_up = GaugeVec::new(
            Opts::new("pool_watch_endpoint_up", "Reachability at the last check"),
            &["endpoint", "channel"],
        )?;

        registry.register(Box::new(probe_failures_total.clone()))?;
        registry.register(Box::new(alerts_total.clone()))?;
        registry.register(Box::new(cycles_total.clone()))?;
        registry.register(Box::new(endpoint_up.clone()))?;

        Ok(Self {
            probe_failures_total,
            alerts_total,
            cycles_total,
            endpoint_up,
            registry,
        })
    }

    pub fn record_probe(&self, endpoint: &str, channel: &str, up: bool, failure: Option<&str>) {
        self.endpoint_up
            .with_label_values(&[endpoint, channel])
            .set(if up { 1.0 } else { 0.0 });
        if let Some(kind) = failure {
            self.probe_failures_total
                .with_label_values(&[channel, kind])
                .inc();
        }
    }

    pub fn record_alert(&self, outcome: &str) {
        self.alerts_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_cycle(&self, cycle: &str, outcome: &str) {
        self.cycles_total.with_label_values(&[cycle, outcome]).inc();
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_contains_recorded_series() {
        let metrics = WatchMetrics::new().unwrap();
        metrics.record_probe("pool-a", "api", false, Some("timeout"));
        metrics.record_probe("pool-a", "stratum", true, None);
        metrics.record_alert("posted");
        metrics.record_cycle("check", "completed");

        let text = metrics.gather().unwrap();
        assert!(text.contains("pool_watch_probe_failures_total{channel=\"api\",kind=\"timeout\"} 1"));
        assert!(text.contains("pool_watch_endpoint_up{channel=\"api\",endpoint=\"pool-a\"} 0"));
        assert!(text.contains("pool_watch_endpoint_up{channel=\"stratum\",endpoint=\"pool-a\"} 1"));
        assert!(text.contains("pool_watch_alerts_total{outcome=\"posted\"} 1"));
        assert!(text.contains("pool_watch_cycles_total{cycle=\"check\",outcome=\"completed\"} 1"));
    }

    #[test]
    fn test_separate_instances_do_not_share_registries() {
        let a = WatchMetrics::new().unwrap();
        let b = WatchMetrics::new().unwrap();
        a.record_alert("posted");
        assert!(!b.gather().unwrap().contains("outcome=\"posted\""));
    }
}
