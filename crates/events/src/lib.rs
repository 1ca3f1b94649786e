//! Job event relay infrastructure.
//!
//! - [`ClientRegistry`]: maps each job id to the one live client
//!   connection waiting for it and delivers frames to it.
//! - [`RelayFrame`]: the frames written to a subscriber's stream.
//! - [`EventRelay`]: turns raw provider notifications into dispatches.

pub mod frame;
pub mod registry;
pub mod relay;

pub use frame::RelayFrame;
pub use registry::{ClientRegistry, DispatchOutcome, SubscriptionHandle};
pub use relay::{EventRelay, RelayOutcome};
