//! API and stratum reachability probes

use crate::retry::with_retry;
use pool_core::{BackendType, EndpointConfig};
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time;
use tracing::{debug, warn};

/// Why a probe attempt failed; only used for diagnostics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Timeout,
    ConnectionRefused,
    TlsError,
    DnsError,
    ParseError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::ConnectionRefused => "connection_refused",
            FailureKind::TlsError => "tls_error",
            FailureKind::DnsError => "dns_error",
            FailureKind::ParseError => "parse_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one probe attempt
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CheckResult {
    pub reachable: bool,
    /// kH/s, present only when the API answered with a usable figure
    pub hash_rate: Option<f64>,
    pub failure: Option<FailureKind>,
}

impl CheckResult {
    pub fn reachable(hash_rate: Option<f64>) -> Self {
        Self {
            reachable: true,
            hash_rate,
            failure: None,
        }
    }

    pub fn failed(kind: FailureKind) -> Self {
        Self {
            reachable: false,
            hash_rate: None,
            failure: Some(kind),
        }
    }
}

/// Health checker for pool status APIs and stratum ports
#[derive(Clone)]
pub struct HealthChecker {
    client: reqwest::Client,
}

impl HealthChecker {
    /// Create a new health checker with a shared HTTP client
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pool-watch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Probe the status API once
    pub async fn check_api(&self, endpoint: &EndpointConfig) -> CheckResult {
        let url = endpoint.api_url();
        debug!("Checking API of {} at {}", endpoint.id, url);

        let response = match self
            .client
            .get(&url)
            .timeout(endpoint.api_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let kind = classify_http_error(&e);
                warn!("API check of {} failed ({}): {}", endpoint.id, kind, e);
                return CheckResult::failed(kind);
            }
        };

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                let kind = classify_http_error(&e);
                warn!("Reading API body of {} failed ({}): {}", endpoint.id, kind, e);
                return CheckResult::failed(kind);
            }
        };

        let json: Value = match serde_json::from_str(&body) {
            Ok(json) => json,
            Err(e) => {
                warn!("API response of {} is not JSON: {}", endpoint.id, e);
                return CheckResult::failed(FailureKind::ParseError);
            }
        };

        let hash_rate = extract_hash_rate(&endpoint.backend, &endpoint.nomp_algo, &json);
        if hash_rate.is_none() && endpoint.backend.is_known() {
            debug!("No hash rate in API response of {}", endpoint.id);
        }
        CheckResult::reachable(hash_rate)
    }

    /// Probe the status API, retrying up to the endpoint's limit
    pub async fn check_api_with_retry(&self, endpoint: &EndpointConfig) -> CheckResult {
        let outcome = with_retry(
            endpoint.retry_limit,
            |_| self.check_api(endpoint),
            |result: &CheckResult| result.reachable,
        )
        .await;
        debug!(
            "API check of {} finished after {} attempt(s): reachable={}",
            endpoint.id, outcome.attempts, outcome.value.reachable
        );
        outcome.value
    }

    /// Probe the stratum port, retrying up to the endpoint's limit
    pub async fn check_stratum_with_retry(&self, endpoint: &EndpointConfig) -> CheckResult {
        let outcome = with_retry(
            endpoint.retry_limit,
            |_| probe_stratum(&endpoint.stratum_host, endpoint.stratum_port, endpoint.stratum_timeout),
            |result: &CheckResult| result.reachable,
        )
        .await;
        debug!(
            "Stratum check of {} finished after {} attempt(s): reachable={}",
            endpoint.id, outcome.attempts, outcome.value.reachable
        );
        outcome.value
    }
}

/// Both reachability channels of an endpoint, each with bounded retry
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    async fn api(&self, endpoint: &EndpointConfig) -> CheckResult;

    async fn stratum(&self, endpoint: &EndpointConfig) -> CheckResult;
}

#[async_trait::async_trait]
impl Probe for HealthChecker {
    async fn api(&self, endpoint: &EndpointConfig) -> CheckResult {
        self.check_api_with_retry(endpoint).await
    }

    async fn stratum(&self, endpoint: &EndpointConfig) -> CheckResult {
        self.check_stratum_with_retry(endpoint).await
    }
}

/// Check whether a TCP connection to the stratum port can be opened
pub async fn check_stratum(host: &str, port: u16, timeout: Duration) -> bool {
    probe_stratum(host, port, timeout).await.reachable
}

/// TCP connect probe keeping the failure reason
pub async fn probe_stratum(host: &str, port: u16, timeout: Duration) -> CheckResult {
    let addr = format!("{}:{}", host, port);

    match time::timeout(timeout, TcpStream::connect(&addr)).await {
        Ok(Ok(_)) => {
            debug!("TCP connection to {} succeeded", addr);
            CheckResult::reachable(None)
        }
        Ok(Err(e)) => {
            let kind = classify_io_error(&e);
            warn!("TCP connection to {} failed ({}): {}", addr, kind, e);
            CheckResult::failed(kind)
        }
        Err(_) => {
            warn!("TCP connection to {} timed out", addr);
            CheckResult::failed(FailureKind::Timeout)
        }
    }
}

/// Read the pool hash rate (kH/s) out of a status API response
pub fn extract_hash_rate(backend: &BackendType, nomp_algo: &str, json: &Value) -> Option<f64> {
    let rate = match backend {
        BackendType::Mpos => number(&json["hashrate"]),
        BackendType::Nomp => number(&json["algos"][nomp_algo]["hashrate"]).map(|h| h / 1000.0),
        BackendType::Unknown(_) => None,
    };
    rate.filter(|r| r.is_finite() && *r >= 0.0)
}

// Some pools report numbers as strings.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn classify_http_error(error: &reqwest::Error) -> FailureKind {
    if error.is_timeout() {
        return FailureKind::Timeout;
    }
    if error.is_decode() {
        return FailureKind::ParseError;
    }
    // The top-level message embeds the URL, so only its causes are inspected.
    classify_chain(error.source()).unwrap_or(FailureKind::ConnectionRefused)
}

fn classify_io_error(error: &io::Error) -> FailureKind {
    match error.kind() {
        io::ErrorKind::TimedOut => FailureKind::Timeout,
        io::ErrorKind::ConnectionRefused => FailureKind::ConnectionRefused,
        _ => {
            let error: &(dyn StdError + 'static) = error;
            classify_chain(Some(error)).unwrap_or(FailureKind::ConnectionRefused)
        }
    }
}

// The resolver and TLS backends only surface through error messages.
fn classify_chain(error: Option<&(dyn StdError + 'static)>) -> Option<FailureKind> {
    let mut current = error;
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionRefused => return Some(FailureKind::ConnectionRefused),
                io::ErrorKind::TimedOut => return Some(FailureKind::Timeout),
                _ => {}
            }
        }
        let message = err.to_string().to_ascii_lowercase();
        if message.contains("dns error")
            || message.contains("failed to lookup address")
            || message.contains("name or service not known")
            || message.contains("no such host")
        {
            return Some(FailureKind::DnsError);
        }
        if message.contains("certificate")
            || message.contains("tls")
            || message.contains("ssl")
            || message.contains("handshake")
        {
            return Some(FailureKind::TlsError);
        }
        current = err.source();
    }
    None
}
