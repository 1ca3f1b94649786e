use std::sync::Arc;

use reelswap_core::types::JobId;
use reelswap_events::ClientRegistry;

use crate::polling::PollerSet;

/// Lives inside an event stream; dropping it means the client is gone.
///
/// On drop the job's poller (if this connection started one) is cancelled
/// and the subscription is released. Release is conn-id aware, so a guard
/// from a replaced connection leaves the newer subscription alone.
pub struct SubscriptionGuard {
    job_id: JobId,
    conn_id: String,
    registry: Arc<ClientRegistry>,
    pollers: Arc<PollerSet>,
}

impl SubscriptionGuard {
    pub fn new(
        job_id: JobId,
        conn_id: String,
        registry: Arc<ClientRegistry>,
        pollers: Arc<PollerSet>,
    ) -> Self {
        Self {
            job_id,
            conn_id,
            registry,
            pollers,
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.pollers.stop(&self.job_id, &self.conn_id);

        // The registry lock is async; release it from a task.
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(job_id = %self.job_id, "No runtime at stream drop, skipping release");
            return;
        };
        let registry = Arc::clone(&self.registry);
        let job_id = std::mem::take(&mut self.job_id);
        let conn_id = std::mem::take(&mut self.conn_id);
        runtime.spawn(async move {
            registry.release(&job_id, &conn_id).await;
        });
    }
}
