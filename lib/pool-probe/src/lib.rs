//! Reachability probes for mining pools
//!
//! Two independent channels are checked per pool: the JSON status API over
//! HTTP(S) and a bare TCP connect to the stratum port. Both can be wrapped in
//! a bounded retry that stops at the first success.
pub mod probe;
pub mod retry;

pub use probe::{
    check_stratum, extract_hash_rate, probe_stratum, CheckResult, FailureKind, HealthChecker,
    Probe,
};
pub use retry::{with_retry, RetryOutcome};
