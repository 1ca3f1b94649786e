//! Domain types shared across the relay crates.
//!
//! - [`error::CoreError`]: the error taxonomy every crate converts into.
//! - [`job`]: canonical job states and the event shape sent to browsers.
//! - [`normalize`]: collapses provider status payloads into [`job::JobEvent`]s.

pub mod error;
pub mod job;
pub mod normalize;
pub mod types;
