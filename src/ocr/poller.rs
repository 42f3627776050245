//! Async job polling.
//!
//! [`poll_until`] is a bounded retry-with-delay loop that knows nothing about
//! Docling; [`AsyncJobPoller`] drives it against the status endpoint and then
//! fetches the finished document exactly once.
//!
//! ```text
//! submitted ──▶ pending ──┬──▶ completed ──▶ GET result
//!                 ▲  │    ├──▶ failed       (service message)
//!                 └──┘    └──▶ timed out    (attempt budget spent)
//! ```

use crate::error::DoclingError;
use crate::ocr::client::DoclingClient;
use crate::ocr::request::{result_url, status_url};
use crate::ocr::types::{ConversionJob, ConversionResponse, JobStatus, TaskResult};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Attempt budget and spacing for a polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Delay source, injectable so polling can run without real time passing.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Result of one polling attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    Ready(T),
    Pending,
}

/// Call `attempt` until it is ready, fails for good, or the budget runs out.
///
/// Transient errors (see [`DoclingError::is_transient`]) are logged and
/// retried; on the final attempt they are returned as-is. Any other error
/// ends polling immediately. No delay follows the final attempt.
pub async fn poll_until<T, F, Fut>(
    policy: PollPolicy,
    sleeper: &dyn Sleeper,
    mut attempt: F,
) -> Result<T, DoclingError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PollOutcome<T>, DoclingError>>,
{
    for n in 1..=policy.max_attempts {
        match attempt(n).await {
            Ok(PollOutcome::Ready(value)) => return Ok(value),
            Ok(PollOutcome::Pending) => {}
            Err(e) if e.is_transient() && n < policy.max_attempts => {
                warn!(
                    "Polling attempt {}/{} failed, retrying: {}",
                    n, policy.max_attempts, e
                );
            }
            Err(e) => return Err(e),
        }
        if n < policy.max_attempts {
            sleeper.sleep(policy.interval).await;
        }
    }

    Err(DoclingError::PollingTimedOut {
        attempts: policy.max_attempts,
    })
}

/// Drives one async conversion job to its document.
pub struct AsyncJobPoller<'a> {
    client: &'a DoclingClient,
    base_url: &'a str,
    api_key: &'a str,
    policy: PollPolicy,
    sleeper: &'a dyn Sleeper,
}

impl<'a> AsyncJobPoller<'a> {
    pub fn new(
        client: &'a DoclingClient,
        base_url: &'a str,
        api_key: &'a str,
        policy: PollPolicy,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
            policy,
            sleeper,
        }
    }

    /// Poll `task_id` until completion, then fetch its result once.
    ///
    /// `Ok(None)` means the result endpoint answered without an envelope.
    pub async fn run(&self, task_id: &str) -> Result<Option<ConversionResponse>, DoclingError> {
        let status_url = status_url(self.base_url, task_id);
        info!("Polling Docling task {}", task_id);

        poll_until(self.policy, self.sleeper, |attempt| {
            self.check_status(&status_url, task_id, attempt)
        })
        .await?;

        info!("Task {} completed, fetching result", task_id);
        let result: Option<TaskResult> = self
            .client
            .get_json(&result_url(self.base_url, task_id), self.api_key)
            .await?;
        Ok(result.and_then(|r| r.result))
    }

    /// One status GET, mapped onto the polling loop.
    async fn check_status(
        &self,
        status_url: &str,
        task_id: &str,
        attempt: u32,
    ) -> Result<PollOutcome<()>, DoclingError> {
        let job: Option<ConversionJob> = self.client.get_json(status_url, self.api_key).await?;
        let Some(job) = job else {
            debug!("Task {}: empty status response (attempt {})", task_id, attempt);
            return Ok(PollOutcome::Pending);
        };
        debug!(
            "Task {}: status={:?} progress={:?} (attempt {})",
            job.task_id, job.status, job.progress, attempt
        );
        match job.status {
            JobStatus::Completed => Ok(PollOutcome::Ready(())),
            JobStatus::Failed => Err(DoclingError::ServiceJobFailed {
                message: job
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Unknown error".to_string()),
            }),
            _ => Ok(PollOutcome::Pending),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingSleeper;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            max_attempts,
            interval: Duration::from_millis(5000),
        }
    }

    fn transient() -> DoclingError {
        DoclingError::UpstreamHttp {
            status: 503,
            detail: None,
            message: None,
        }
    }

    #[test]
    fn default_policy_is_sixty_by_five_seconds() {
        let policy = PollPolicy::default();
        assert_eq!(policy.max_attempts, 60);
        assert_eq!(policy.interval, Duration::from_millis(5000));
    }

    #[tokio::test]
    async fn ready_after_pending_sleeps_between_attempts() {
        let sleeper = RecordingSleeper::default();
        let value = poll_until(fast_policy(10), &sleeper, |n| async move {
            Ok::<_, DoclingError>(if n == 3 {
                PollOutcome::Ready("done")
            } else {
                PollOutcome::Pending
            })
        })
        .await
        .unwrap();
        assert_eq!(value, "done");
        assert_eq!(sleeper.sleeps(), vec![Duration::from_millis(5000); 2]);
    }

    #[tokio::test]
    async fn budget_exhaustion_times_out() {
        let sleeper = RecordingSleeper::default();
        let calls = AtomicU32::new(0);
        let err = poll_until::<(), _, _>(fast_policy(4), &sleeper, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<PollOutcome<()>, DoclingError>(PollOutcome::Pending) }
        })
        .await
        .unwrap_err();
        assert!(matches!(err, DoclingError::PollingTimedOut { attempts: 4 }));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(sleeper.sleeps().len(), 3);
    }

    #[tokio::test]
    async fn transient_errors_are_retried() {
        let sleeper = RecordingSleeper::default();
        let value = poll_until(fast_policy(5), &sleeper, |n| async move {
            if n < 3 {
                Err(transient())
            } else {
                Ok::<_, DoclingError>(PollOutcome::Ready(n))
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test]
    async fn transient_error_on_final_attempt_is_returned() {
        let sleeper = RecordingSleeper::default();
        let err = poll_until::<(), _, _>(fast_policy(3), &sleeper, |_| async {
            Err::<PollOutcome<()>, _>(transient())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, DoclingError::UpstreamHttp { status: 503, .. }));
    }

    #[tokio::test]
    async fn job_failure_stops_immediately() {
        let sleeper = RecordingSleeper::default();
        let calls = AtomicU32::new(0);
        let err = poll_until::<(), _, _>(fast_policy(60), &sleeper, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<PollOutcome<()>, _>(DoclingError::ServiceJobFailed {
                    message: "bad file".into(),
                })
            }
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("bad file"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.sleeps().is_empty());
    }
}
