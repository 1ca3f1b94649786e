use std::collections::HashMap;

use reelswap_core::job::JobEvent;
use reelswap_core::types::{JobId, Timestamp};
use tokio::sync::{mpsc, RwLock};

use crate::frame::RelayFrame;

/// Channel sender half for pushing frames to one client connection.
pub type FrameSender = mpsc::UnboundedSender<RelayFrame>;

/// The live connection currently subscribed to a job.
pub struct Subscription {
    /// Identifies the connection, so a replaced connection closing late
    /// cannot tear down its replacement.
    pub conn_id: String,
    /// Channel sender for outbound frames to this connection.
    pub sender: FrameSender,
    /// When this subscription was registered.
    pub connected_at: Timestamp,
}

impl Subscription {
    /// How long this subscription has been registered, in milliseconds.
    pub fn age_ms(&self) -> i64 {
        (chrono::Utc::now() - self.connected_at).num_milliseconds()
    }
}

/// What a new subscriber gets back from [`ClientRegistry::subscribe`].
pub struct SubscriptionHandle {
    pub job_id: JobId,
    pub conn_id: String,
    /// Receiver half; the `CONNECTED` frame is already queued on it.
    pub receiver: mpsc::UnboundedReceiver<RelayFrame>,
}

/// Result of a [`ClientRegistry::dispatch`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Written to the subscriber; the subscription stays open.
    Delivered,
    /// Written to the subscriber and the subscription was torn down.
    DeliveredTerminal,
    /// Nobody is subscribed to this job. The event is dropped.
    NoSubscriber,
    /// The subscriber had gone away; its entry was removed.
    ConnectionClosed,
}

impl DispatchOutcome {
    pub fn delivered(self) -> bool {
        matches!(
            self,
            DispatchOutcome::Delivered | DispatchOutcome::DeliveredTerminal
        )
    }
}

/// Maps each job id to the single live connection waiting on it.
///
/// At most one subscription exists per job id; subscribing again replaces
/// the previous connection. Thread-safe via interior `RwLock`; designed to
/// be wrapped in `Arc` and handed to every component that needs it.
pub struct ClientRegistry {
    subscriptions: RwLock<HashMap<JobId, Subscription>>,
}

impl ClientRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection for `job_id`.
    ///
    /// The `CONNECTED` acknowledgement is queued before this returns. Any
    /// previous subscription for the same job is dropped, which closes its
    /// stream.
    pub async fn subscribe(&self, job_id: &str) -> SubscriptionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn_id = uuid::Uuid::new_v4().to_string();

        // The receiver is still in hand, so this send cannot fail.
        let _ = tx.send(RelayFrame::connected());

        let subscription = Subscription {
            conn_id: conn_id.clone(),
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        let previous = self
            .subscriptions
            .write()
            .await
            .insert(job_id.to_string(), subscription);

        if let Some(previous) = previous {
            tracing::info!(
                job_id,
                replaced_conn_id = %previous.conn_id,
                replaced_after_ms = previous.age_ms(),
                conn_id = %conn_id,
                "Replaced existing subscription",
            );
        } else {
            tracing::info!(job_id, conn_id = %conn_id, "Client subscribed");
        }

        SubscriptionHandle {
            job_id: job_id.to_string(),
            conn_id,
            receiver: rx,
        }
    }

    /// Deliver a normalized event to the job's subscriber.
    ///
    /// A terminal event tears the subscription down after it is written.
    /// With no subscriber the event is logged and dropped; no entry is
    /// created and nothing is buffered.
    pub async fn dispatch(&self, job_id: &str, event: JobEvent) -> DispatchOutcome {
        let terminal = event.is_terminal();
        let state = event.state.clone();
        let mut subs = self.subscriptions.write().await;

        let Some(subscription) = subs.get(job_id) else {
            tracing::info!(job_id, state = %state, "No subscriber for job, dropping event");
            return DispatchOutcome::NoSubscriber;
        };

        if subscription.sender.send(RelayFrame::job(event)).is_err() {
            let age_ms = subscription.age_ms();
            subs.remove(job_id);
            tracing::debug!(job_id, age_ms, "Subscriber connection closed, removed subscription");
            return DispatchOutcome::ConnectionClosed;
        }

        if terminal {
            let age_ms = subscription.age_ms();
            subs.remove(job_id);
            tracing::info!(job_id, state = %state, age_ms, "Delivered terminal event, subscription closed");
            DispatchOutcome::DeliveredTerminal
        } else {
            tracing::debug!(job_id, state = %state, "Delivered event");
            DispatchOutcome::Delivered
        }
    }

    /// Remove the subscription for `job_id`, whichever connection holds it.
    ///
    /// Returns whether an entry was removed.
    pub async fn unsubscribe(&self, job_id: &str) -> bool {
        self.subscriptions.write().await.remove(job_id).is_some()
    }

    /// Connection-close path: remove the subscription only if it still
    /// belongs to `conn_id`.
    pub async fn release(&self, job_id: &str, conn_id: &str) -> bool {
        let mut subs = self.subscriptions.write().await;
        let owned = subs
            .get(job_id)
            .is_some_and(|subscription| subscription.conn_id == conn_id);
        if owned {
            if let Some(subscription) = subs.remove(job_id) {
                tracing::info!(
                    job_id,
                    conn_id,
                    age_ms = subscription.age_ms(),
                    "Client disconnected, subscription removed",
                );
            }
        }
        owned
    }

    pub async fn is_subscribed(&self, job_id: &str) -> bool {
        self.subscriptions.read().await.contains_key(job_id)
    }

    /// Return the current number of live subscriptions.
    pub async fn subscription_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }

    /// Drop every subscription, closing all streams.
    ///
    /// Used during graceful shutdown.
    pub async fn shutdown_all(&self) {
        let mut subs = self.subscriptions.write().await;
        let count = subs.len();
        subs.clear();
        tracing::info!(count, "Closed all subscriptions");
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelswap_core::job::VideoOutput;

    async fn recv_json(handle: &mut SubscriptionHandle) -> serde_json::Value {
        let frame = handle.receiver.recv().await.expect("frame");
        serde_json::from_str(&frame.to_json()).unwrap()
    }

    #[tokio::test]
    async fn subscribe_queues_connected_frame() {
        let registry = ClientRegistry::new();
        let mut handle = registry.subscribe("abc").await;

        assert_eq!(recv_json(&mut handle).await, serde_json::json!({"status": "CONNECTED"}));
        assert!(registry.is_subscribed("abc").await);
    }

    #[tokio::test]
    async fn dispatch_to_unknown_job_creates_nothing() {
        let registry = ClientRegistry::new();

        let outcome = registry.dispatch("ghost", JobEvent::queued()).await;

        assert_eq!(outcome, DispatchOutcome::NoSubscriber);
        assert_eq!(registry.subscription_count().await, 0);
        assert!(!registry.is_subscribed("ghost").await);
    }

    #[tokio::test]
    async fn terminal_dispatch_tears_down_once() {
        let registry = ClientRegistry::new();
        let mut handle = registry.subscribe("abc").await;
        let done = JobEvent::completed(VideoOutput::from_url("u"));

        assert_eq!(registry.dispatch("abc", done.clone()).await, DispatchOutcome::DeliveredTerminal);
        assert_eq!(registry.dispatch("abc", done).await, DispatchOutcome::NoSubscriber);

        recv_json(&mut handle).await; // CONNECTED
        assert_eq!(recv_json(&mut handle).await["state"], "COMPLETED");
        // Sender dropped on teardown: the stream ends after the terminal frame.
        assert!(handle.receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn second_subscribe_replaces_first() {
        let registry = ClientRegistry::new();
        let mut first = registry.subscribe("abc").await;
        let mut second = registry.subscribe("abc").await;
        assert_eq!(registry.subscription_count().await, 1);

        registry.dispatch("abc", JobEvent::in_progress()).await;

        recv_json(&mut first).await; // CONNECTED
        assert!(first.receiver.recv().await.is_none());
        recv_json(&mut second).await; // CONNECTED
        assert_eq!(recv_json(&mut second).await["state"], "IN_PROGRESS");
    }

    #[tokio::test]
    async fn release_ignores_replaced_connection() {
        let registry = ClientRegistry::new();
        let first = registry.subscribe("abc").await;
        let second = registry.subscribe("abc").await;

        assert!(!registry.release("abc", &first.conn_id).await);
        assert!(registry.is_subscribed("abc").await);

        assert!(registry.release("abc", &second.conn_id).await);
        assert!(!registry.is_subscribed("abc").await);
    }

    #[tokio::test]
    async fn dispatch_to_dropped_receiver_removes_entry() {
        let registry = ClientRegistry::new();
        let handle = registry.subscribe("abc").await;
        drop(handle);

        let outcome = registry.dispatch("abc", JobEvent::in_progress()).await;

        assert_eq!(outcome, DispatchOutcome::ConnectionClosed);
        assert_eq!(registry.subscription_count().await, 0);
    }

    #[tokio::test]
    async fn unsubscribe_removes_mapping() {
        let registry = ClientRegistry::new();
        let _handle = registry.subscribe("abc").await;

        assert!(registry.unsubscribe("abc").await);
        assert!(!registry.unsubscribe("abc").await);
        assert_eq!(registry.subscription_count().await, 0);
    }

    #[tokio::test]
    async fn shutdown_all_closes_streams() {
        let registry = ClientRegistry::new();
        let mut a = registry.subscribe("a").await;
        let _b = registry.subscribe("b").await;

        registry.shutdown_all().await;

        assert_eq!(registry.subscription_count().await, 0);
        recv_json(&mut a).await; // CONNECTED
        assert!(a.receiver.recv().await.is_none());
    }

    #[test]
    fn subscription_age_counts_from_connection() {
        let (sender, _receiver) = mpsc::unbounded_channel();
        let subscription = Subscription {
            conn_id: "conn".into(),
            sender,
            connected_at: chrono::Utc::now() - chrono::Duration::seconds(2),
        };

        let age = subscription.age_ms();
        assert!((2000..10_000).contains(&age), "unexpected age {age}");
    }
}
