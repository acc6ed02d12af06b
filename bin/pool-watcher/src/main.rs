use anyhow::{bail, Context, Result};
use pool_core::{PoolRegistry, WatchConfig};
use pool_engine::{Orchestrator, WatchMetrics};
use pool_notify::{Notifier, StyleOptions, SvgRenderer, WebhookCredentials, WebhookNotifier};
use pool_probe::HealthChecker;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

mod server;
mod settings;

use settings::{LogNotifier, Settings};

const NOTIFIER_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting pool-watcher...");

    if let Err(e) = run().await {
        error!("pool-watcher failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let settings = Settings::from_env();

    let config = WatchConfig::load(&settings.config_path)
        .with_context(|| format!("loading {}", settings.config_path))?;
    let registry = Arc::new(PoolRegistry::from_config(&config)?);
    info!(
        "Pool registry loaded with {} endpoints (concurrency {})",
        registry.len(),
        registry.check_concurrency()
    );

    let notifier = build_notifier(settings.dry_run)?;
    let probe = Arc::new(HealthChecker::new().context("building HTTP client")?);
    let metrics = WatchMetrics::new()?;

    let mut orchestrator = Orchestrator::new(registry.clone(), probe, notifier, metrics.clone())
        .with_footer(&config.message.footer)
        .with_dry_run(settings.dry_run);
    if settings.render {
        orchestrator = orchestrator.with_renderer(Arc::new(SvgRenderer), StyleOptions::default());
        info!("Digest rendering enabled");
    }
    let orchestrator = Arc::new(orchestrator);

    if let Some(addr) = &config.metrics_addr {
        server::spawn_listener(addr, metrics).await;
    }

    let check_every = Duration::from_secs(config.schedule.check_interval_secs);
    let digest_every = Duration::from_secs(config.schedule.digest_interval_secs);
    if check_every.is_zero() || digest_every.is_zero() {
        bail!("schedule intervals must be positive");
    }
    info!(
        "Checking every {:?}, digest every {:?}{}",
        check_every,
        digest_every,
        if settings.dry_run { " (dry-run)" } else { "" }
    );

    let mut check_ticks = interval(check_every);
    check_ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut digest_ticks = interval(digest_every);
    digest_ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first digest goes out one interval after startup.
    digest_ticks.tick().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = check_ticks.tick() => {
                let orchestrator = orchestrator.clone();
                tokio::spawn(async move { orchestrator.run_check_cycle().await });
            }
            _ = digest_ticks.tick() => {
                let orchestrator = orchestrator.clone();
                tokio::spawn(async move { orchestrator.run_digest_cycle().await });
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping");
                break;
            }
        }
    }

    Ok(())
}

/// Webhook notifier from the environment, or a logging stand-in in dry-run
fn build_notifier(dry_run: bool) -> Result<Arc<dyn Notifier>> {
    match WebhookCredentials::from_env() {
        Ok(credentials) => {
            info!("Webhook notifier configured");
            Ok(Arc::new(WebhookNotifier::new(credentials, NOTIFIER_TIMEOUT)?))
        }
        Err(e) if dry_run => {
            warn!("{}; continuing because dry-run is enabled", e);
            Ok(Arc::new(LogNotifier))
        }
        Err(e) => Err(e).context("notifier credentials are required unless dry-run is enabled"),
    }
}
