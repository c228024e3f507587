use crate::backend::client::HttpError;
use crate::config::HarnessConfig;
use crate::verify::model::Verdict;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Convergence {
    pub attempts: u32,
    pub elapsed: Duration,
}

#[derive(Debug, Error)]
pub enum WaitError {
    /// The write itself was rejected. Writes are not safe to retry blindly,
    /// so this is terminal for the case.
    #[error("write failed: {0}")]
    WriteFailed(HttpError),

    #[error("not converged after {attempts} attempts")]
    TimedOut {
        attempts: u32,
        last: Option<Verdict>,
    },

    #[error("wait cancelled")]
    Cancelled,
}

/// Bridges "write accepted" and "write's effects observable". The backend
/// processes writes asynchronously with a bounded, empirically known latency,
/// so a fixed attempt count with a fixed sleep keeps run time predictable.
pub struct ConsistencyWaiter {
    max_attempts: u32,
    interval: Duration,
    cancel: CancellationToken,
}

impl ConsistencyWaiter {
    pub fn new(config: &HarnessConfig, cancel: CancellationToken) -> Self {
        Self {
            max_attempts: config.max_attempts,
            interval: config.poll_interval(),
            cancel,
        }
    }

    /// Performs `write_op` exactly once, then polls `verify_op` until the
    /// verdict is satisfied or attempts run out, sleeping between attempts.
    /// A read error counts as an unsatisfied attempt; cancellation is checked
    /// around every sleep so no wait outlives one interval.
    pub async fn submit_and_wait<W, WF, WFut, VF, VFut>(
        &self,
        write_op: WF,
        verify_op: VF,
    ) -> Result<(W, Convergence, Verdict), WaitError>
    where
        W: Clone,
        WF: FnOnce() -> WFut,
        WFut: Future<Output = Result<W, HttpError>>,
        VF: Fn(W) -> VFut,
        VFut: Future<Output = Result<Verdict, HttpError>>,
    {
        let started = Instant::now();
        let written = write_op().await.map_err(WaitError::WriteFailed)?;

        let mut last: Option<Verdict> = None;
        for attempt in 1..=self.max_attempts {
            if self.cancel.is_cancelled() {
                return Err(WaitError::Cancelled);
            }
            match verify_op(written.clone()).await {
                Ok(verdict) => {
                    if verdict.passed {
                        return Ok((
                            written,
                            Convergence {
                                attempts: attempt,
                                elapsed: started.elapsed(),
                            },
                            verdict,
                        ));
                    }
                    info!(
                        "attempt {}/{}: expected state not observed yet",
                        attempt, self.max_attempts
                    );
                    last = Some(verdict);
                }
                Err(err) => {
                    warn!(
                        "attempt {}/{}: read-back failed: {}",
                        attempt, self.max_attempts, err
                    );
                }
            }
            if attempt < self.max_attempts {
                tokio::select! {
                    _ = self.cancel.cancelled() => return Err(WaitError::Cancelled),
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
        }
        Err(WaitError::TimedOut {
            attempts: self.max_attempts,
            last,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::model::Verdict;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn waiter(max_attempts: u32) -> ConsistencyWaiter {
        let config = HarnessConfig::builder()
            .max_attempts(max_attempts)
            .poll_interval_ms(1)
            .build();
        ConsistencyWaiter::new(&config, CancellationToken::new())
    }

    #[tokio::test]
    async fn write_failure_short_circuits_without_verification() {
        let verify_calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&verify_calls);
        let result = waiter(3)
            .submit_and_wait(
                || async { Err::<(), _>(HttpError::Io("connection refused".to_string())) },
                move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Ok(Verdict::pass(None, None)) }
                },
            )
            .await;
        assert!(matches!(result, Err(WaitError::WriteFailed(_))));
        assert_eq!(verify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exhausts_exactly_max_attempts_before_timeout() {
        let verify_calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&verify_calls);
        let result = waiter(3)
            .submit_and_wait(
                || async { Ok::<_, HttpError>(()) },
                move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Ok(Verdict::fail(None, None, "not there".to_string())) }
                },
            )
            .await;
        match result {
            Err(WaitError::TimedOut { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(last.is_some());
            }
            other => panic!("expected timeout, got {:?}", other.map(|_| ())),
        }
        assert_eq!(verify_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn converges_with_attempt_count() {
        let verify_calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&verify_calls);
        let result = waiter(5)
            .submit_and_wait(
                || async { Ok::<_, HttpError>("uuid-1".to_string()) },
                move |_| {
                    let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    async move {
                        if call >= 2 {
                            Ok(Verdict::pass(None, None))
                        } else {
                            Ok(Verdict::fail(None, None, "pending".to_string()))
                        }
                    }
                },
            )
            .await;
        let (written, convergence, verdict) = result.expect("should converge");
        assert_eq!(written, "uuid-1");
        assert_eq!(convergence.attempts, 2);
        assert!(verdict.passed);
    }

    #[tokio::test]
    async fn read_errors_count_as_unsatisfied_attempts() {
        let verify_calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&verify_calls);
        let result = waiter(2)
            .submit_and_wait(
                || async { Ok::<_, HttpError>(()) },
                move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Err::<Verdict, _>(HttpError::Io("timeout".to_string())) }
                },
            )
            .await;
        match result {
            Err(WaitError::TimedOut { attempts, last }) => {
                assert_eq!(attempts, 2);
                assert!(last.is_none());
            }
            other => panic!("expected timeout, got {:?}", other.map(|_| ())),
        }
        assert_eq!(verify_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancelled_token_stops_the_wait() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let config = HarnessConfig::builder().poll_interval_ms(1).build();
        let waiter = ConsistencyWaiter::new(&config, cancel);
        let result = waiter
            .submit_and_wait(
                || async { Ok::<_, HttpError>(()) },
                |_| async { Ok(Verdict::pass(None, None)) },
            )
            .await;
        assert!(matches!(result, Err(WaitError::Cancelled)));
    }
}
