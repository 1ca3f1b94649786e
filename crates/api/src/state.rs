use std::sync::Arc;

use reelswap_events::{ClientRegistry, EventRelay};
use reelswap_fal::GenerationProvider;

use crate::config::ServerConfig;
use crate::polling::PollerSet;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Generation provider (fal in production, scripted in tests).
    pub provider: Arc<dyn GenerationProvider>,
    /// Job id -> live event-stream connection.
    pub registry: Arc<ClientRegistry>,
    /// Routes provider notifications into the registry.
    pub relay: EventRelay,
    /// Server-side pollers feeding event streams in poll mode.
    pub pollers: Arc<PollerSet>,
}

impl AppState {
    /// Wire up a fresh registry, relay and poller set around `provider`.
    pub fn new(config: ServerConfig, provider: Arc<dyn GenerationProvider>) -> Self {
        let registry = Arc::new(ClientRegistry::new());
        Self {
            config: Arc::new(config),
            provider,
            relay: EventRelay::new(Arc::clone(&registry)),
            registry,
            pollers: Arc::new(PollerSet::new()),
        }
    }
}
