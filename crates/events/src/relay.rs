//! Routes provider push notifications to subscribed clients.
//!
//! The relay never reports failure to the provider: a notification that
//! cannot be parsed or has no subscriber is logged and reported as a
//! [`RelayOutcome`] value only.

use std::sync::Arc;

use reelswap_core::normalize::normalize_update;
use reelswap_core::types::JobId;
use serde_json::Value;

use crate::registry::{ClientRegistry, DispatchOutcome};

/// What happened to one provider notification.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    /// The notification named a job and was dispatched.
    Dispatched {
        job_id: JobId,
        outcome: DispatchOutcome,
    },
    /// No job id could be extracted; nothing was dispatched.
    Unroutable { reason: String },
}

impl RelayOutcome {
    /// Whether a subscriber received the event.
    pub fn delivered(&self) -> bool {
        matches!(self, RelayOutcome::Dispatched { outcome, .. } if outcome.delivered())
    }
}

/// Normalizes provider notifications and hands them to the registry.
#[derive(Clone)]
pub struct EventRelay {
    registry: Arc<ClientRegistry>,
}

impl EventRelay {
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Normalize a raw notification body and dispatch it to its job's subscriber.
    pub async fn relay_notification(&self, body: &Value) -> RelayOutcome {
        let update = match normalize_update(body) {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!(error = %e, "Unroutable provider notification");
                return RelayOutcome::Unroutable {
                    reason: e.to_string(),
                };
            }
        };

        tracing::info!(job_id = %update.job_id, state = %update.event.state, "Provider notification received");
        let outcome = self.registry.dispatch(&update.job_id, update.event).await;
        RelayOutcome::Dispatched {
            job_id: update.job_id,
            outcome,
        }
    }
}
