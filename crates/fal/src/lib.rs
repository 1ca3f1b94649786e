//! fal.ai generation provider integration.
//!
//! Provides the REST client for fal's storage and queue endpoints, the
//! [`provider::GenerationProvider`] seam the HTTP layer talks to, and the
//! three workflows built on top of it: uploading the source pair,
//! submitting a generation job, and polling a job to completion.

pub mod api;
pub mod messages;
pub mod poller;
pub mod provider;
pub mod submit;
pub mod upload;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use api::{FalApi, FalApiError, FalConfig};
pub use provider::GenerationProvider;
