//! Error taxonomy shared by the service and command layers.

use thiserror::Error;

use crate::dao::storage::StorageError;
use crate::state::game::InsufficientCounterMeasures;
use crate::state::timer::InvalidTimerTransition;

/// Fatal configuration problems, surfaced at startup rather than at dispatch
/// time. These are never swallowed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Two handlers claim the same text alias.
    #[error("alias `{alias}` is claimed by both `{first}` and `{second}`")]
    DuplicateAlias {
        /// The contested alias, lowercased.
        alias: String,
        /// Name of the handler registered first.
        first: String,
        /// Name of the handler that attempted to re-register the alias.
        second: String,
    },
    /// Two handlers claim the same structured command name.
    #[error("structured command `{0}` is registered twice")]
    DuplicateCommand(String),
    /// A text handler declared no aliases, so it could never be invoked.
    #[error("command `{command}` declares no aliases")]
    NoAliases {
        /// Name of the alias-less handler.
        command: String,
    },
    /// An admin-gated command was dispatched with no admin role configured.
    #[error("command `{command}` is admin-only but no admin role is configured")]
    MissingAdminRole {
        /// Name of the gated command.
        command: String,
    },
}

/// Errors produced by service-layer operations.
///
/// "No active game/event" is not an error: those operations return `Ok(None)`
/// so callers can branch on existence checks.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The record store failed; a preceding mutation may not be durable.
    #[error("storage failure")]
    Storage(#[from] StorageError),
    /// A spend exceeded the counter-measure pool; nothing was mutated.
    #[error(transparent)]
    CounterMeasures(#[from] InsufficientCounterMeasures),
    /// A timer action was not legal in the timer's current state.
    #[error(transparent)]
    Timer(#[from] InvalidTimerTransition),
    /// The caller supplied an unusable value.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The operation is not legal in the current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// An explicitly requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}
