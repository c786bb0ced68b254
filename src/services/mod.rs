//! Service layer owning per-scope game and event state.

/// Group event coordination, channel fan-out, and the event clock.
pub mod event_service;
/// Blob game lifecycle and counters.
pub mod game_service;
