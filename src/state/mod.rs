//! Shared application state and the per-scope domain types.

/// Blob encounter record and derived battlefield math.
pub mod game;
/// Countdown clock with pause/resume semantics.
pub mod timer;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::dao::GameStore;
use crate::platform::NotificationSink;
use crate::services::event_service::GroupEventService;
use crate::services::game_service::GameStateService;

/// Per-community partition under which one game and one event may
/// independently be active.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeId(String);

impl ScopeId {
    /// Wrap a platform guild/server identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScopeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Cheaply cloneable handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Central application state shared by every command handler.
///
/// Services are constructed once here and passed by reference; there are no
/// ambient singletons, and a handler cannot observe a "service not ready"
/// state.
pub struct AppState {
    config: AppConfig,
    store: Arc<dyn GameStore>,
    games: GameStateService,
    events: GroupEventService,
}

impl AppState {
    /// Wire the services over the given store and notification sink.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn GameStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> SharedState {
        let tick_period = Duration::from_secs(config.timer_tick_seconds);
        Arc::new(Self {
            games: GameStateService::new(store.clone()),
            events: GroupEventService::new(sink, tick_period),
            store,
            config,
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Durable record store (used directly by history lookups).
    pub fn store(&self) -> &Arc<dyn GameStore> {
        &self.store
    }

    /// Per-scope blob game lifecycle service.
    pub fn games(&self) -> &GameStateService {
        &self.games
    }

    /// Per-scope group event coordinator.
    pub fn events(&self) -> &GroupEventService {
        &self.events
    }
}
