//! Periodic status digests

use crate::alert::format_timestamp;
use chrono::{DateTime, Utc};
use pool_core::{EndpointConfig, EndpointStatus};
use std::collections::HashMap;

/// A composed digest
#[derive(Clone, Debug, PartialEq)]
pub struct Digest {
    pub text: String,
    /// Healthy pool names, one per line, for rendering into an image
    pub image_text: String,
    pub healthy: usize,
    pub total: usize,
    /// Pools at or above the hash power warning threshold, with their share
    pub concentrated: Vec<(String, f64)>,
}

/// Builds digest text from a status snapshot
#[derive(Clone, Debug, Default)]
pub struct DigestComposer {
    footer: String,
}

impl DigestComposer {
    pub fn new(footer: impl Into<String>) -> Self {
        Self {
            footer: footer.into(),
        }
    }

    /// Compose a digest over `endpoints`, in their given order.
    ///
    /// An endpoint missing from `snapshot` is reported with the optimistic
    /// default status.
    pub fn compose(
        &self,
        endpoints: &[EndpointConfig],
        snapshot: &HashMap<String, EndpointStatus>,
        hash_power_warn_pct: f64,
        at: DateTime<Utc>,
    ) -> Digest {
        let statuses: Vec<(&EndpointConfig, EndpointStatus)> = endpoints
            .iter()
            .map(|e| (e, snapshot.get(&e.id).copied().unwrap_or_default()))
            .collect();

        let healthy: Vec<&str> = statuses
            .iter()
            .filter(|(_, s)| s.is_healthy())
            .map(|(e, _)| e.display_name())
            .collect();

        let degraded: Vec<String> = statuses
            .iter()
            .filter(|(_, s)| !s.is_healthy())
            .map(|(e, s)| format!("{} ({})", e.display_name(), failed_channels(s)))
            .collect();

        let concentrated = concentration(&statuses, hash_power_warn_pct);

        let mut lines = vec!["Pool status digest".to_string()];
        if !healthy.is_empty() {
            lines.push(format!("\u{2705} Healthy: {}", healthy.join(", ")));
        }
        for line in &degraded {
            lines.push(format!("\u{26a0} Degraded: {}", line));
        }
        for (name, share) in &concentrated {
            lines.push(format!(
                "\u{26a0} Hash power concentration: {} holds {:.1}% of the total",
                name, share
            ));
        }
        if healthy.len() == statuses.len() {
            lines.push("Verdict: all healthy".to_string());
        } else {
            lines.push(format!("Verdict: {} healthy of {}", healthy.len(), statuses.len()));
        }
        lines.push(format_timestamp(at));
        if !self.footer.is_empty() {
            lines.push(self.footer.clone());
        }

        Digest {
            text: lines.join("\n"),
            image_text: healthy.join("\n"),
            healthy: healthy.len(),
            total: statuses.len(),
            concentrated,
        }
    }
}

fn failed_channels(status: &EndpointStatus) -> &'static str {
    match (status.api_reachable, status.stratum_reachable) {
        (false, false) => "Web, Stratum",
        (false, true) => "Web",
        (true, false) => "Stratum",
        (true, true) => "",
    }
}

/// Share of total hash rate per pool, keeping those at or above the threshold.
///
/// The total only sums positive rates; every pool gets a share, 0 when the
/// total is 0.
fn concentration(
    statuses: &[(&EndpointConfig, EndpointStatus)],
    warn_pct: f64,
) -> Vec<(String, f64)> {
    let total: f64 = statuses
        .iter()
        .map(|(_, s)| s.hash_rate)
        .filter(|rate| *rate > 0.0)
        .sum();

    statuses
        .iter()
        .map(|(e, s)| {
            let share = if total > 0.0 {
                100.0 * s.hash_rate.max(0.0) / total
            } else {
                0.0
            };
            (e.display_name().to_string(), share)
        })
        .filter(|(_, share)| *share >= warn_pct)
        .collect()
}
