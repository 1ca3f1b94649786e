//! Server-side pollers that feed event streams when push delivery is off.
//!
//! Each subscribed job in poll mode gets one background task running
//! [`poll_until_terminal`]. Every observed state is dispatched through the
//! [`ClientRegistry`]; a timeout or credential failure is delivered as a
//! `FAILED` event so the stream always ends on a terminal frame. Closing the
//! stream cancels the task.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use reelswap_core::error::CoreError;
use reelswap_core::job::JobEvent;
use reelswap_core::types::JobId;
use reelswap_events::ClientRegistry;
use reelswap_fal::poller::{poll_until_terminal, PollConfig};
use reelswap_fal::GenerationProvider;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

struct PollerEntry {
    conn_id: String,
    cancel: CancellationToken,
}

/// Tracks the running poller for each job, keyed by job id.
///
/// At most one poller runs per job. Entries remember which connection
/// started them so a replaced connection cannot stop its successor's poller.
#[derive(Default)]
pub struct PollerSet {
    entries: Mutex<HashMap<JobId, PollerEntry>>,
}

impl PollerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start polling `job_id` on behalf of connection `conn_id`.
    ///
    /// A poller already running for the same job is cancelled and replaced.
    pub fn spawn(
        self: &Arc<Self>,
        job_id: JobId,
        conn_id: String,
        provider: Arc<dyn GenerationProvider>,
        registry: Arc<ClientRegistry>,
        config: PollConfig,
    ) {
        let cancel = CancellationToken::new();
        let previous = self.lock().insert(
            job_id.clone(),
            PollerEntry {
                conn_id: conn_id.clone(),
                cancel: cancel.clone(),
            },
        );
        if let Some(previous) = previous {
            previous.cancel.cancel();
            tracing::debug!(job_id = %job_id, "Replaced running poller");
        }

        let pollers = Arc::clone(self);
        tokio::spawn(async move {
            tracing::info!(job_id = %job_id, conn_id = %conn_id, "Server-side polling started");

            let (tx, mut rx) = mpsc::unbounded_channel::<JobEvent>();
            let forwarder = {
                let registry = Arc::clone(&registry);
                let job_id = job_id.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        if !registry.dispatch(&job_id, event).await.delivered() {
                            // Nobody is listening any more.
                            cancel.cancel();
                            break;
                        }
                    }
                })
            };

            let result = poll_until_terminal(provider.as_ref(), &job_id, &config, &cancel, |event| {
                let _ = tx.send(event.clone());
            })
            .await;

            drop(tx);
            if let Err(e) = forwarder.await {
                tracing::error!(job_id = %job_id, error = %e, "Event forwarder panicked");
            }

            match result {
                Ok(event) => {
                    tracing::info!(job_id = %job_id, state = %event.state, "Server-side polling finished");
                }
                Err(CoreError::Cancelled(_)) => {}
                Err(e) => {
                    tracing::warn!(job_id = %job_id, error = %e, "Server-side polling gave up");
                    registry.dispatch(&job_id, JobEvent::failed(e.to_string())).await;
                }
            }

            pollers.finish(&job_id, &conn_id);
        });
    }

    /// Cancel the poller for `job_id` if connection `conn_id` started it.
    pub fn stop(&self, job_id: &str, conn_id: &str) -> bool {
        let mut entries = self.lock();
        let owned = entries
            .get(job_id)
            .is_some_and(|entry| entry.conn_id == conn_id);
        if owned {
            if let Some(entry) = entries.remove(job_id) {
                entry.cancel.cancel();
                tracing::debug!(job_id, conn_id, "Stopped poller");
            }
        }
        owned
    }

    /// Cancel every running poller. Used during graceful shutdown.
    pub fn cancel_all(&self) {
        let mut entries = self.lock();
        let count = entries.len();
        for (_, entry) in entries.drain() {
            entry.cancel.cancel();
        }
        tracing::info!(count, "Cancelled all pollers");
    }

    /// Number of pollers currently registered.
    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    // Drop the entry once the task ends, unless a newer poller took the slot.
    fn finish(&self, job_id: &str, conn_id: &str) {
        let mut entries = self.lock();
        if entries
            .get(job_id)
            .is_some_and(|entry| entry.conn_id == conn_id)
        {
            entries.remove(job_id);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<JobId, PollerEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
