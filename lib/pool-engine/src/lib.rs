//! Scheduling-independent watch cycles
//!
//! This library provides:
//! - `Orchestrator`: the check cycle (probe, compare, alert) and the digest cycle
//! - `WatchMetrics`: Prometheus counters and gauges fed by both cycles

pub mod metrics;
pub mod orchestrator;

pub use metrics::WatchMetrics;
pub use orchestrator::{CheckReport, CycleOutcome, Delivery, DigestReport, Orchestrator};
