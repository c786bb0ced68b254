//! Contracts implemented by the surrounding chat-platform integration.
//!
//! The bot core never talks to the platform directly; card lookups, outbound
//! messages, and role checks go through these traits so the core stays
//! platform-agnostic and testable.

use std::fmt;

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::info;

/// Handle to a platform channel that can receive outbound messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelId(pub String);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identity of the user behind an inbound command or message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    /// Platform user id.
    pub id: String,
    /// Display name used in replies and logs.
    pub name: String,
    /// Role names the platform reports for this user in the current scope.
    pub roles: Vec<String>,
}

/// A card returned by the external card database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Database code for the card.
    pub code: String,
    /// Card title.
    pub name: String,
    /// Type line (e.g. "Asset. Item.").
    pub type_line: String,
    /// Rules text.
    pub text: String,
}

/// How a card query should be matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Exact title match.
    Exact,
    /// Best-effort fuzzy match.
    Fuzzy,
}

/// Read-only card database used by lookup commands.
pub trait CardLookup: Send + Sync {
    /// Search for cards matching `query`.
    fn search(&self, query: &str, mode: SearchMode) -> BoxFuture<'static, anyhow::Result<Vec<Card>>>;
}

/// Failure to deliver one message to one channel.
#[derive(Debug, Error)]
#[error("delivery to channel `{channel}` failed: {reason}")]
pub struct DeliveryError {
    /// The channel that rejected the message.
    pub channel: ChannelId,
    /// Platform-reported reason.
    pub reason: String,
}

/// Outbound message sink. One failed channel must not abort a fan-out; the
/// caller logs and continues.
pub trait NotificationSink: Send + Sync {
    /// Send one message to one channel.
    fn send(
        &self,
        channel: &ChannelId,
        message: &str,
    ) -> BoxFuture<'static, Result<(), DeliveryError>>;
}

/// Role membership check used by the admin gate.
pub trait RoleCheck: Send + Sync {
    /// Whether `caller` holds `role` in the current scope.
    fn caller_has_role(&self, caller: &Caller, role: &str) -> bool;
}

/// [`RoleCheck`] over the role set the platform already attached to the
/// caller. Sufficient wherever the platform resolves roles upstream.
pub struct DeclaredRoles;

impl RoleCheck for DeclaredRoles {
    fn caller_has_role(&self, caller: &Caller, role: &str) -> bool {
        caller.roles.iter().any(|held| held == role)
    }
}

/// [`NotificationSink`] that writes messages to the log. Stands in for the
/// platform in the console binary and in demos.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn send(
        &self,
        channel: &ChannelId,
        message: &str,
    ) -> BoxFuture<'static, Result<(), DeliveryError>> {
        info!(%channel, message, "outbound message");
        Box::pin(async { Ok(()) })
    }
}

/// [`CardLookup`] used when no card database is configured; every search
/// comes back empty.
pub struct UnconfiguredCardLookup;

impl CardLookup for UnconfiguredCardLookup {
    fn search(
        &self,
        _query: &str,
        _mode: SearchMode,
    ) -> BoxFuture<'static, anyhow::Result<Vec<Card>>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}
