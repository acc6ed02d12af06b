//! Check and digest cycles
//!
//! The orchestrator is driven from outside: something calls
//! [`Orchestrator::run_check_cycle`] and [`Orchestrator::run_digest_cycle`] on
//! their own cadences. Each cycle has its own in-flight guard, and a call that
//! arrives while the same cycle is still running is skipped rather than queued.

use crate::metrics::WatchMetrics;
use chrono::Utc;
use futures::{stream, FutureExt, StreamExt};
use pool_core::{EndpointConfig, EndpointStatus, PoolRegistry, StateStore};
use pool_notify::{
    AlertComposer, AlertDecision, DigestComposer, Notifier, Renderer, StyleOptions,
};
use pool_probe::{CheckResult, Probe};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of asking a cycle to run
#[derive(Clone, Debug, PartialEq)]
pub enum CycleOutcome<T> {
    /// The same cycle was already running
    Skipped,
    Completed(T),
}

/// Summary of one check cycle
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CheckReport {
    pub checked: usize,
    pub transitions: usize,
    pub alerts_posted: usize,
    pub alerts_suppressed: usize,
    pub alerts_dry_run: usize,
    pub alerts_failed: usize,
    /// Endpoints whose processing errored or panicked
    pub endpoint_failures: usize,
}

/// Summary of one digest cycle
#[derive(Clone, Debug, PartialEq)]
pub struct DigestReport {
    pub healthy: usize,
    pub total: usize,
    pub image_attached: bool,
    pub delivery: Delivery,
}

/// What happened to a message handed to the notifier
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    Posted,
    /// Dry-run mode, nothing was sent
    DryRun,
    Failed,
}

impl Delivery {
    fn as_str(&self) -> &'static str {
        match self {
            Delivery::Posted => "posted",
            Delivery::DryRun => "dry_run",
            Delivery::Failed => "failed",
        }
    }
}

enum EndpointOutcome {
    Unchanged,
    Suppressed,
    Alerted(Delivery),
    Failed,
}

// Clears the flag when the cycle ends, including by panic.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Ties probes, state, composers and the notifier together
pub struct Orchestrator {
    registry: Arc<PoolRegistry>,
    state: StateStore,
    probe: Arc<dyn Probe>,
    notifier: Arc<dyn Notifier>,
    renderer: Option<(Arc<dyn Renderer>, StyleOptions)>,
    alerts: AlertComposer,
    digests: DigestComposer,
    metrics: WatchMetrics,
    dry_run: bool,
    check_running: AtomicBool,
    digest_running: AtomicBool,
}

impl Orchestrator {
    /// Create an orchestrator with a fresh, optimistically seeded state store
    pub fn new(
        registry: Arc<PoolRegistry>,
        probe: Arc<dyn Probe>,
        notifier: Arc<dyn Notifier>,
        metrics: WatchMetrics,
    ) -> Self {
        let state = StateStore::new(&registry);
        Self {
            registry,
            state,
            probe,
            notifier,
            renderer: None,
            alerts: AlertComposer::default(),
            digests: DigestComposer::default(),
            metrics,
            dry_run: false,
            check_running: AtomicBool::new(false),
            digest_running: AtomicBool::new(false),
        }
    }

    /// Append `footer` to every alert and digest
    pub fn with_footer(mut self, footer: &str) -> Self {
        self.alerts = AlertComposer::new(footer);
        self.digests = DigestComposer::new(footer);
        self
    }

    /// Attach a rendering of the healthy-pool list to digests
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>, style: StyleOptions) -> Self {
        self.renderer = Some((renderer, style));
        self
    }

    /// Run cycles fully but never call the notifier
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    pub fn registry(&self) -> &Arc<PoolRegistry> {
        &self.registry
    }

    /// Probe every endpoint once and alert on reachability transitions
    pub async fn run_check_cycle(&self) -> CycleOutcome<CheckReport> {
        let Some(_guard) = InFlight::acquire(&self.check_running) else {
            warn!("Check cycle still running, skipping tick");
            self.metrics.record_cycle("check", "skipped");
            return CycleOutcome::Skipped;
        };

        let concurrency = self.registry.check_concurrency();
        debug!(
            "Check cycle started for {} endpoints (concurrency {})",
            self.registry.len(),
            concurrency
        );

        // Indexed so the cycle future stays spawnable.
        let outcomes: Vec<EndpointOutcome> = stream::iter(0..self.registry.len())
            .map(|index| self.isolated_check(index))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut report = CheckReport {
            checked: outcomes.len(),
            ..CheckReport::default()
        };
        for outcome in outcomes {
            match outcome {
                EndpointOutcome::Unchanged => {}
                EndpointOutcome::Suppressed => {
                    report.transitions += 1;
                    report.alerts_suppressed += 1;
                }
                EndpointOutcome::Alerted(delivery) => {
                    report.transitions += 1;
                    match delivery {
                        Delivery::Posted => report.alerts_posted += 1,
                        Delivery::DryRun => report.alerts_dry_run += 1,
                        Delivery::Failed => report.alerts_failed += 1,
                    }
                }
                EndpointOutcome::Failed => report.endpoint_failures += 1,
            }
        }

        info!(
            "Check cycle finished: {} checked, {} transitions, {} alerts posted, {} suppressed, {} endpoint failures",
            report.checked,
            report.transitions,
            report.alerts_posted,
            report.alerts_suppressed,
            report.endpoint_failures
        );
        self.metrics.record_cycle("check", "completed");
        CycleOutcome::Completed(report)
    }

    /// Compose and post a digest of the current snapshot
    pub async fn run_digest_cycle(&self) -> CycleOutcome<DigestReport> {
        let Some(_guard) = InFlight::acquire(&self.digest_running) else {
            warn!("Digest cycle still running, skipping tick");
            self.metrics.record_cycle("digest", "skipped");
            return CycleOutcome::Skipped;
        };

        let snapshot = self.state.snapshot().await;
        let digest = self.digests.compose(
            self.registry.endpoints(),
            &snapshot,
            self.registry.hash_power_warn_pct(),
            Utc::now(),
        );
        for (name, share) in &digest.concentrated {
            warn!("{} holds {:.1}% of total hash rate", name, share);
        }

        let image = self.render(&digest.image_text);
        let delivery = self.deliver(&digest.text, image.as_deref()).await;

        info!(
            "Digest cycle finished: {} healthy of {}, delivery {}",
            digest.healthy,
            digest.total,
            delivery.as_str()
        );
        self.metrics.record_cycle("digest", "completed");
        CycleOutcome::Completed(DigestReport {
            healthy: digest.healthy,
            total: digest.total,
            image_attached: image.is_some(),
            delivery,
        })
    }

    /// Check one endpoint, turning a panic into a failed outcome
    async fn isolated_check(&self, index: usize) -> EndpointOutcome {
        let endpoint = &self.registry.endpoints()[index];
        match AssertUnwindSafe(self.check_endpoint(endpoint))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                error!("Check of {} panicked, continuing with the rest", endpoint.id);
                EndpointOutcome::Failed
            }
        }
    }

    async fn check_endpoint(&self, endpoint: &EndpointConfig) -> EndpointOutcome {
        let api = self.probe.api(endpoint).await;
        let stratum = self.probe.stratum(endpoint).await;
        self.record_probe(endpoint, "api", &api);
        self.record_probe(endpoint, "stratum", &stratum);

        let hash_rate = if api.reachable {
            api.hash_rate.unwrap_or(0.0)
        } else {
            0.0
        };
        let current = EndpointStatus::new(api.reachable, stratum.reachable, hash_rate);

        let transition = match self.state.compare_and_set(&endpoint.id, current).await {
            Ok(transition) => transition,
            Err(e) => {
                error!("Failed to store status of {}: {}", endpoint.id, e);
                return EndpointOutcome::Failed;
            }
        };
        if !transition.changed {
            debug!("No reachability change for {}", endpoint.id);
            return EndpointOutcome::Unchanged;
        }

        match self
            .alerts
            .compose(endpoint, &transition.previous, &current, Utc::now())
        {
            AlertDecision::Unchanged => EndpointOutcome::Unchanged,
            AlertDecision::Suppressed(kind) => {
                info!("{:?} alert for {} suppressed (alerts disabled)", kind, endpoint.id);
                self.metrics.record_alert("suppressed");
                EndpointOutcome::Suppressed
            }
            AlertDecision::Deliver(alert) => {
                info!("{:?} detected for {}", alert.kind, endpoint.id);
                let delivery = self.deliver(&alert.text, None).await;
                self.metrics.record_alert(delivery.as_str());
                EndpointOutcome::Alerted(delivery)
            }
        }
    }

    fn record_probe(&self, endpoint: &EndpointConfig, channel: &str, result: &CheckResult) {
        if let Some(kind) = result.failure {
            debug!("{} {} check failed: {}", endpoint.id, channel, kind);
        }
        self.metrics.record_probe(
            &endpoint.id,
            channel,
            result.reachable,
            result.failure.map(|k| k.as_str()),
        );
    }

    fn render(&self, text: &str) -> Option<Vec<u8>> {
        let (renderer, style) = self.renderer.as_ref()?;
        match renderer.render_text(text, style) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Digest rendering failed, posting text only: {}", e);
                None
            }
        }
    }

    async fn deliver(&self, text: &str, image: Option<&[u8]>) -> Delivery {
        if self.dry_run {
            info!("[dry-run] would post:\n{}", text);
            return Delivery::DryRun;
        }

        match self.notifier.post(text, image).await {
            Ok(()) => {
                debug!("{} posted message", self.notifier.name());
                Delivery::Posted
            }
            Err(e) => {
                warn!("{} failed to post message: {}", self.notifier.name(), e);
                Delivery::Failed
            }
        }
    }
}
