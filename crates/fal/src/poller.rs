//! Bounded polling fallback for when push delivery is not wired up.
//!
//! [`poll_until_terminal`] queries a job's status on a fixed interval until
//! it completes, fails, the attempt budget runs out, or the
//! [`CancellationToken`] fires. It never retries without bound.

use std::time::Duration;

use reelswap_core::error::CoreError;
use reelswap_core::job::JobEvent;
use tokio_util::sync::CancellationToken;

use crate::provider::GenerationProvider;

/// Poll cadence and budget.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between consecutive status queries.
    pub interval: Duration,
    /// Total number of status queries, failed ones included.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 120,
        }
    }
}

/// Poll `job_id` until it reaches a terminal state.
///
/// Every successfully observed event is handed to `on_event` before the
/// terminal check, so callers can relay intermediate states. A failed query
/// is logged and spends one attempt; a missing credential ends the loop at
/// once since no retry can fix it.
///
/// Returns the terminal event, [`CoreError::Timeout`] once `max_attempts`
/// queries have been made without one, or [`CoreError::Cancelled`].
pub async fn poll_until_terminal<F>(
    provider: &dyn GenerationProvider,
    job_id: &str,
    config: &PollConfig,
    cancel: &CancellationToken,
    mut on_event: F,
) -> Result<JobEvent, CoreError>
where
    F: FnMut(&JobEvent) + Send,
{
    for attempt in 1..=config.max_attempts {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(job_id, attempt, "Polling cancelled");
                return Err(CoreError::Cancelled(format!("polling for job {job_id}")));
            }
            result = provider.job_status(job_id) => result,
        };

        match result {
            Ok(event) => {
                tracing::debug!(job_id, attempt, state = %event.state, "Polled job status");
                on_event(&event);
                if event.is_terminal() {
                    return Ok(event);
                }
            }
            Err(err @ CoreError::Config(_)) => return Err(err),
            Err(e) => {
                tracing::warn!(job_id, attempt, error = %e, "Status query failed");
            }
        }

        if attempt < config.max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(job_id, attempt, "Polling cancelled");
                    return Err(CoreError::Cancelled(format!("polling for job {job_id}")));
                }
                _ = tokio::time::sleep(config.interval) => {}
            }
        }
    }

    tracing::warn!(job_id, attempts = config.max_attempts, "Polling budget exhausted");
    Err(CoreError::Timeout {
        attempts: config.max_attempts,
    })
}
