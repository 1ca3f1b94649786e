//! Server-sent event streams for job progress.
//!
//! Provides the `/api/events/{request_id}` handler and the guard that tears
//! a subscription down when its client goes away.

mod guard;
mod handler;

pub use guard::SubscriptionGuard;
pub use handler::events_handler;
