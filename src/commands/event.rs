//! Group event commands: membership, broadcasts, and the event clock.
//!
//! Everything here is admin-gated on both surfaces; the router enforces the
//! gate before the handlers run.

use futures::future::BoxFuture;

use crate::error::ServiceError;
use crate::platform::ChannelId;
use crate::state::{ScopeId, SharedState};

use super::{
    AccessLevel, CommandOutcome, Invocation, StructuredCommand, TextCommand, TextContext,
    missing_argument, no_active_event, split_first_token,
};

async fn start_event(
    state: SharedState,
    scope: ScopeId,
    channels: Vec<ChannelId>,
) -> Result<CommandOutcome, ServiceError> {
    let count = channels.len();
    state.events().start_event(&scope, channels)?;
    Ok(CommandOutcome::new(
        "start-event",
        format!("started event over {count} channels"),
        format!("Event started across {count} channel(s)."),
    ))
}

async fn end_event(state: SharedState, scope: ScopeId) -> Result<CommandOutcome, ServiceError> {
    match state.events().end_event(&scope) {
        Some(channels) => Ok(CommandOutcome::new(
            "end-event",
            format!("ended event over {} channels", channels.len()),
            "Event ended. The clock, if any, has been stopped.",
        )),
        None => Ok(no_active_event("end-event")),
    }
}

async fn timer_start(
    state: SharedState,
    scope: ScopeId,
    minutes: u64,
) -> Result<CommandOutcome, ServiceError> {
    match state.events().start_timer(&scope, minutes)? {
        Some(()) => Ok(CommandOutcome::new(
            "timer",
            format!("clock started at {minutes} minutes"),
            format!("The event clock is set: {minutes} minutes."),
        )),
        None => Ok(no_active_event("timer")),
    }
}

async fn timer_pause(state: SharedState, scope: ScopeId) -> Result<CommandOutcome, ServiceError> {
    match state.events().pause_timer(&scope)? {
        Some(()) => {
            let remaining = state.events().timer_remaining(&scope).unwrap_or(0);
            Ok(CommandOutcome::new(
                "timer",
                "clock paused",
                format!("The event clock is paused at {remaining} minutes."),
            ))
        }
        None => Ok(no_active_event("timer")),
    }
}

async fn timer_resume(state: SharedState, scope: ScopeId) -> Result<CommandOutcome, ServiceError> {
    match state.events().resume_timer(&scope)? {
        Some(()) => {
            let remaining = state.events().timer_remaining(&scope).unwrap_or(0);
            Ok(CommandOutcome::new(
                "timer",
                "clock resumed",
                format!("The event clock resumes with {remaining} minutes left."),
            ))
        }
        None => Ok(no_active_event("timer")),
    }
}

async fn broadcast(
    state: SharedState,
    scope: ScopeId,
    message: &str,
    exclude: &[ChannelId],
) -> Result<CommandOutcome, ServiceError> {
    match state.events().broadcast(&scope, message, exclude).await {
        Some(delivered) => Ok(CommandOutcome::new(
            "broadcast",
            format!("delivered to {delivered} channels"),
            format!("Broadcast delivered to {delivered} channel(s)."),
        )),
        None => Ok(no_active_event("broadcast")),
    }
}

/// `!startevent [channels...]` — open an event over the current channel plus
/// any listed by name.
pub struct StartEventCommand {
    state: SharedState,
}

impl StartEventCommand {
    /// Build the handler.
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl TextCommand for StartEventCommand {
    fn name(&self) -> &str {
        "start-event"
    }
    fn help(&self) -> &str {
        "startevent [channels...] — start a group event here"
    }
    fn aliases(&self) -> &[&str] {
        &["startevent"]
    }
    fn admin_only(&self) -> bool {
        true
    }
    fn execute(
        &self,
        ctx: TextContext,
    ) -> BoxFuture<'static, Result<CommandOutcome, ServiceError>> {
        let state = self.state.clone();
        Box::pin(async move {
            let mut channels = vec![ctx.channel.clone()];
            for name in ctx.args.split_whitespace() {
                let channel = ChannelId::from(name);
                if !channels.contains(&channel) {
                    channels.push(channel);
                }
            }
            start_event(state, ctx.scope, channels).await
        })
    }
}

/// `!endevent` — close the running event.
pub struct EndEventCommand {
    state: SharedState,
}

impl EndEventCommand {
    /// Build the handler.
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl TextCommand for EndEventCommand {
    fn name(&self) -> &str {
        "end-event"
    }
    fn help(&self) -> &str {
        "endevent — end the running group event"
    }
    fn aliases(&self) -> &[&str] {
        &["endevent"]
    }
    fn admin_only(&self) -> bool {
        true
    }
    fn execute(
        &self,
        ctx: TextContext,
    ) -> BoxFuture<'static, Result<CommandOutcome, ServiceError>> {
        let state = self.state.clone();
        Box::pin(async move { end_event(state, ctx.scope).await })
    }
}

/// `!timer start <minutes>|pause|resume` — drive the event clock.
pub struct TimerCommand {
    state: SharedState,
}

impl TimerCommand {
    /// Build the handler.
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl TextCommand for TimerCommand {
    fn name(&self) -> &str {
        "timer"
    }
    fn help(&self) -> &str {
        "timer start <minutes>|pause|resume — drive the event clock"
    }
    fn aliases(&self) -> &[&str] {
        &["timer"]
    }
    fn admin_only(&self) -> bool {
        true
    }
    fn execute(
        &self,
        ctx: TextContext,
    ) -> BoxFuture<'static, Result<CommandOutcome, ServiceError>> {
        let state = self.state.clone();
        Box::pin(async move {
            let (action, rest) = split_first_token(&ctx.args);
            match action {
                "start" => {
                    let (token, _) = split_first_token(rest);
                    let Ok(minutes) = token.parse::<u64>() else {
                        return Ok(missing_argument("timer", "minutes"));
                    };
                    timer_start(state, ctx.scope, minutes).await
                }
                "pause" => timer_pause(state, ctx.scope).await,
                "resume" => timer_resume(state, ctx.scope).await,
                _ => Ok(missing_argument("timer", "start|pause|resume")),
            }
        })
    }
}

/// `!broadcast <message>` — fan a message out to every event channel.
pub struct BroadcastCommand {
    state: SharedState,
}

impl BroadcastCommand {
    /// Build the handler.
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl TextCommand for BroadcastCommand {
    fn name(&self) -> &str {
        "broadcast"
    }
    fn help(&self) -> &str {
        "broadcast <message> — send a message to every event channel"
    }
    fn aliases(&self) -> &[&str] {
        &["broadcast"]
    }
    fn admin_only(&self) -> bool {
        true
    }
    fn execute(
        &self,
        ctx: TextContext,
    ) -> BoxFuture<'static, Result<CommandOutcome, ServiceError>> {
        let state = self.state.clone();
        Box::pin(async move {
            let message = ctx.args.trim();
            if message.is_empty() {
                return Ok(missing_argument("broadcast", "message"));
            }
            broadcast(state, ctx.scope, message, &[]).await
        })
    }
}

/// `/event <subcommand>` — the structured rendition of the event commands,
/// with the clock under a `timer` sub-command group.
pub struct EventCommand {
    state: SharedState,
}

impl EventCommand {
    /// Build the handler.
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl StructuredCommand for EventCommand {
    fn name(&self) -> &str {
        "event"
    }
    fn help(&self) -> &str {
        "event start|end|broadcast|timer ... — run a group event"
    }
    fn access(&self) -> AccessLevel {
        AccessLevel::Admin
    }
    fn execute(
        &self,
        invocation: Invocation,
    ) -> BoxFuture<'static, Result<CommandOutcome, ServiceError>> {
        let state = self.state.clone();
        Box::pin(async move {
            let scope = invocation.scope.clone();
            if invocation.group.as_deref() == Some("timer") {
                return match invocation.subcommand.as_deref() {
                    Some("start") => {
                        let Some(minutes) = invocation.integer("minutes") else {
                            return Ok(missing_argument("timer", "minutes"));
                        };
                        let Ok(minutes) = u64::try_from(minutes) else {
                            return Ok(missing_argument("timer", "minutes"));
                        };
                        timer_start(state, scope, minutes).await
                    }
                    Some("pause") => timer_pause(state, scope).await,
                    Some("resume") => timer_resume(state, scope).await,
                    _ => Ok(missing_argument("timer", "start|pause|resume")),
                };
            }
            match invocation.subcommand.as_deref() {
                Some("start") => {
                    let mut channels = vec![invocation.channel.clone()];
                    if let Some(extra) = invocation.channel("channel")
                        && !channels.contains(extra)
                    {
                        channels.push(extra.clone());
                    }
                    start_event(state, scope, channels).await
                }
                Some("end") => end_event(state, scope).await,
                Some("broadcast") => {
                    let Some(message) = invocation.string("message") else {
                        return Ok(missing_argument("broadcast", "message"));
                    };
                    // `skip_here` keeps the announcement out of the channel
                    // the command was issued from.
                    let exclude = if invocation.boolean("skip_here").unwrap_or(false) {
                        vec![invocation.channel.clone()]
                    } else {
                        Vec::new()
                    };
                    broadcast(state, scope, message, &exclude).await
                }
                _ => Ok(missing_argument(
                    "event",
                    "start|end|broadcast|timer",
                )),
            }
        })
    }
}
