//! Reelswap API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! event-stream infrastructure) so integration tests and the binary
//! entrypoint can both access them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod polling;
pub mod router;
pub mod routes;
pub mod sse;
pub mod state;
