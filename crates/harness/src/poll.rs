//! Poll-with-deadline primitive shared by the executor and the assertions
//!
//! UI state changes asynchronously after every action, so conditions are
//! re-probed at a fixed interval until they hold or a deadline passes.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::Result;

/// Interval and deadline for a polled condition
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Outcome of a single probe
pub enum Probe<T> {
    /// The condition holds
    Ready(T),
    /// Not yet; carries the observed state for diagnostics
    Pending(String),
}

/// Final outcome of a polled condition
#[derive(Debug, PartialEq, Eq)]
pub enum PollResult<T> {
    Ready(T),
    TimedOut { last_observed: String },
}

impl<T> PollResult<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollResult::Ready(_))
    }
}

/// Re-run `probe` at `policy.interval` until it reports ready or the deadline
/// elapses. The probe always runs at least once. Transport errors from the
/// probe propagate immediately; only "condition not yet true" keeps polling.
pub async fn poll_until<T, F, Fut>(policy: &PollPolicy, mut probe: F) -> Result<PollResult<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Probe<T>>>,
{
    let start = Instant::now();
    let mut last_observed = String::from("(nothing observed)");

    loop {
        match probe().await? {
            Probe::Ready(value) => return Ok(PollResult::Ready(value)),
            Probe::Pending(observed) => last_observed = observed,
        }

        if start.elapsed() >= policy.timeout {
            return Ok(PollResult::TimedOut { last_observed });
        }

        tokio::time::sleep(policy.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_policy() -> PollPolicy {
        PollPolicy::new(Duration::from_millis(5), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_ready_immediately() {
        let result = poll_until(&quick_policy(), || async { Ok(Probe::Ready(42)) })
            .await
            .unwrap();
        assert_eq!(result, PollResult::Ready(42));
    }

    #[tokio::test]
    async fn test_ready_after_retries() {
        let mut attempts = 0;
        let result = poll_until(&quick_policy(), || {
            attempts += 1;
            let ready = attempts >= 3;
            async move {
                if ready {
                    Ok(Probe::Ready("done"))
                } else {
                    Ok(Probe::Pending(format!("attempt {}", attempts)))
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(result, PollResult::Ready("done"));
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_times_out_with_last_observation() {
        let result: PollResult<()> = poll_until(&quick_policy(), || async {
            Ok(Probe::Pending("still on /login".to_string()))
        })
        .await
        .unwrap();
        assert_eq!(
            result,
            PollResult::TimedOut {
                last_observed: "still on /login".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_probe_error_propagates() {
        let result: Result<PollResult<()>> = poll_until(&quick_policy(), || async {
            Err(crate::error::Error::Timeout("boom".to_string()))
        })
        .await;
        assert!(result.is_err());
    }
}
