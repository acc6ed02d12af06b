//! Bounded retry for probe attempts

use std::future::Future;
use tracing::debug;

/// Value returned by the last attempt made, plus how many attempts ran
#[derive(Clone, Debug, PartialEq)]
pub struct RetryOutcome<T> {
    pub value: T,
    pub attempts: u32,
}

/// Run `attempt` up to `limit` times, stopping at the first value `succeeded` accepts.
///
/// There is no delay between attempts; each attempt is expected to bound
/// itself with its own timeout. A `limit` of 0 still runs one attempt.
/// The attempt closure receives the 1-based attempt number.
pub async fn with_retry<T, F, Fut, P>(limit: u32, mut attempt: F, succeeded: P) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = T>,
    P: Fn(&T) -> bool,
{
    let limit = limit.max(1);
    let mut number = 1;
    loop {
        let value = attempt(number).await;
        if succeeded(&value) || number >= limit {
            return RetryOutcome {
                value,
                attempts: number,
            };
        }
        debug!("Attempt {}/{} failed, retrying", number, limit);
        number += 1;
    }
}
