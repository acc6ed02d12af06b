//! Transition alerts

use chrono::{DateTime, Utc};
use pool_core::{EndpointConfig, EndpointStatus};

/// Direction of a reachability transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertKind {
    /// At least one channel is down
    Outage,
    /// Both channels are up again
    Recovered,
}

/// A deliverable alert
#[derive(Clone, Debug, PartialEq)]
pub struct Alert {
    pub kind: AlertKind,
    pub text: String,
}

/// What to do about one (previous, current) pair
#[derive(Clone, Debug, PartialEq)]
pub enum AlertDecision {
    /// Reachability did not change
    Unchanged,
    /// Reachability changed but alerts are disabled for the endpoint
    Suppressed(AlertKind),
    Deliver(Alert),
}

/// Builds alert text for reachability transitions
#[derive(Clone, Debug, Default)]
pub struct AlertComposer {
    footer: String,
}

impl AlertComposer {
    pub fn new(footer: impl Into<String>) -> Self {
        Self {
            footer: footer.into(),
        }
    }

    pub fn compose(
        &self,
        endpoint: &EndpointConfig,
        previous: &EndpointStatus,
        current: &EndpointStatus,
        at: DateTime<Utc>,
    ) -> AlertDecision {
        if !previous.reachability_differs(current) {
            return AlertDecision::Unchanged;
        }

        let kind = if current.is_healthy() {
            AlertKind::Recovered
        } else {
            AlertKind::Outage
        };

        if !endpoint.alert_enabled {
            return AlertDecision::Suppressed(kind);
        }

        let mut text = match kind {
            AlertKind::Outage => format!("[Outage] \"{}\": possible outage\n", endpoint.name),
            AlertKind::Recovered => format!("[Recovered] \"{}\" has recovered\n", endpoint.name),
        };
        text.push_str(&format!("Web dashboard: {}\n", channel_state(current.api_reachable)));
        text.push_str(&format!("Stratum port: {}\n", channel_state(current.stratum_reachable)));
        text.push_str(&endpoint.base_url);
        text.push('\n');
        text.push_str(&format_timestamp(at));
        if !self.footer.is_empty() {
            text.push('\n');
            text.push_str(&self.footer);
        }

        AlertDecision::Deliver(Alert { kind, text })
    }
}

fn channel_state(up: bool) -> &'static str {
    if up {
        "\u{2705} OK"
    } else {
        "\u{26a0} DOWN"
    }
}

pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pool_core::BackendType;
    use std::time::Duration;

    fn endpoint(alert_enabled: bool) -> EndpointConfig {
        EndpointConfig {
            id: "a".to_string(),
            name: "Pool A".to_string(),
            shortname: Some("A".to_string()),
            base_url: "https://a.example".to_string(),
            backend: BackendType::Mpos,
            api_path: "/api".to_string(),
            nomp_algo: "yescrypt".to_string(),
            stratum_host: "a.example".to_string(),
            stratum_port: 3333,
            api_timeout: Duration::from_secs(30),
            stratum_timeout: Duration::from_secs(10),
            alert_enabled,
            retry_limit: 3,
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 5, 0).unwrap()
    }

    fn text(decision: AlertDecision) -> String {
        match decision {
            AlertDecision::Deliver(alert) => alert.text,
            other => panic!("expected deliverable alert, got {:?}", other),
        }
    }

    #[test]
    fn test_unchanged_reachability_emits_nothing() {
        let composer = AlertComposer::default();
        let previous = EndpointStatus::new(false, true, 0.0);
        let current = EndpointStatus::new(false, true, 0.0);
        assert_eq!(
            composer.compose(&endpoint(true), &previous, &current, at()),
            AlertDecision::Unchanged
        );
    }

    #[test]
    fn test_hash_rate_change_emits_nothing() {
        let composer = AlertComposer::default();
        let previous = EndpointStatus::new(true, true, 10.0);
        let current = EndpointStatus::new(true, true, 99.0);
        assert_eq!(
            composer.compose(&endpoint(true), &previous, &current, at()),
            AlertDecision::Unchanged
        );
    }

    #[test]
    fn test_outage_lists_both_channels() {
        let composer = AlertComposer::new("#bitzeny #ZNY");
        let decision = composer.compose(
            &endpoint(true),
            &EndpointStatus::default(),
            &EndpointStatus::new(true, false, 0.0),
            at(),
        );

        let text = text(decision);
        assert!(text.starts_with("[Outage] \"Pool A\": possible outage\n"));
        assert!(text.contains("Web dashboard: \u{2705} OK\n"));
        assert!(text.contains("Stratum port: \u{26a0} DOWN\n"));
        assert!(text.contains("https://a.example\n"));
        assert!(text.contains("2024-03-01 12:05 UTC"));
        assert!(text.ends_with("#bitzeny #ZNY"));
    }

    #[test]
    fn test_recovery() {
        let composer = AlertComposer::default();
        let decision = composer.compose(
            &endpoint(true),
            &EndpointStatus::new(false, false, 0.0),
            &EndpointStatus::new(true, true, 5.0),
            at(),
        );

        match decision {
            AlertDecision::Deliver(alert) => {
                assert_eq!(alert.kind, AlertKind::Recovered);
                assert!(alert.text.starts_with("[Recovered] \"Pool A\" has recovered\n"));
                assert!(alert.text.contains("Web dashboard: \u{2705} OK"));
                assert!(alert.text.contains("Stratum port: \u{2705} OK"));
                assert!(alert.text.ends_with("2024-03-01 12:05 UTC"));
            }
            other => panic!("expected recovery alert, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_recovery_is_still_an_outage() {
        let composer = AlertComposer::default();
        let decision = composer.compose(
            &endpoint(true),
            &EndpointStatus::new(false, false, 0.0),
            &EndpointStatus::new(true, false, 0.0),
            at(),
        );
        assert!(matches!(
            decision,
            AlertDecision::Deliver(Alert { kind: AlertKind::Outage, .. })
        ));
    }

    #[test]
    fn test_disabled_alerts_are_suppressed() {
        let composer = AlertComposer::default();
        let decision = composer.compose(
            &endpoint(false),
            &EndpointStatus::default(),
            &EndpointStatus::new(false, true, 0.0),
            at(),
        );
        assert_eq!(decision, AlertDecision::Suppressed(AlertKind::Outage));
    }
}
