//! Command registration and dispatch for both bot surfaces.
//!
//! The router keeps two registries: case-insensitive text aliases for the
//! legacy prefixed surface, and exact names for the structured surface.
//! Registration happens once at startup and fails fast on configuration
//! problems; dispatch never fails except on fatal misconfiguration, and every
//! dispatch yields exactly one [`CommandOutcome`] carrying the single
//! user-visible reply plus logging metadata.

/// Card database lookup command.
pub mod cards;
/// Group event and event clock commands.
pub mod event;
/// Blob game commands.
pub mod game;

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::warn;

use crate::error::{ConfigError, ServiceError};
use crate::platform::{Caller, CardLookup, ChannelId, RoleCheck};
use crate::state::{ScopeId, SharedState};

/// Outcome of one dispatch: the reply shown to the user plus a summary kept
/// for logging. Every dispatch produces exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Canonical name of the command that ran (or `"unknown"`).
    pub command: String,
    /// One-line result summary for the dispatch log.
    pub summary: String,
    /// The single user-visible reply.
    pub reply: String,
}

impl CommandOutcome {
    /// Assemble an outcome.
    pub fn new(
        command: impl Into<String>,
        summary: impl Into<String>,
        reply: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            summary: summary.into(),
            reply: reply.into(),
        }
    }
}

/// Context handed to a text command handler.
#[derive(Debug, Clone)]
pub struct TextContext {
    /// Scope the message arrived in.
    pub scope: ScopeId,
    /// Channel the message arrived in.
    pub channel: ChannelId,
    /// The invoking user.
    pub caller: Caller,
    /// The alias that matched, lowercased.
    pub alias: String,
    /// Everything after the alias, untokenized.
    pub args: String,
}

/// Handler on the legacy text surface.
pub trait TextCommand: Send + Sync {
    /// Canonical name, used in outcomes and logs.
    fn name(&self) -> &str;
    /// One-line help string.
    fn help(&self) -> &str;
    /// Non-empty set of aliases this handler answers to (matched
    /// case-insensitively).
    fn aliases(&self) -> &[&str];
    /// Whether dispatch must pass the admin-role gate first.
    fn admin_only(&self) -> bool {
        false
    }
    /// Run the command.
    fn execute(&self, ctx: TextContext)
    -> BoxFuture<'static, Result<CommandOutcome, ServiceError>>;
}

/// Registration visibility and access metadata for structured commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    /// Registered globally, usable by anyone.
    Global,
    /// Registered per scope, usable by anyone in the scope.
    Guild,
    /// Requires the configured admin role at execution time.
    Admin,
}

/// Typed option value on the structured surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// Integer option.
    Integer(i64),
    /// Free-text option.
    Str(String),
    /// Boolean option.
    Boolean(bool),
    /// Channel reference option.
    Channel(ChannelId),
}

/// Named option attached to a structured invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOption {
    /// Option name.
    pub name: String,
    /// Typed value.
    pub value: OptionValue,
}

/// One inbound structured (slash-style) invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Scope the interaction arrived in.
    pub scope: ScopeId,
    /// Channel the interaction arrived in.
    pub channel: ChannelId,
    /// The invoking user.
    pub caller: Caller,
    /// Top-level command name.
    pub name: String,
    /// Optional sub-command group.
    pub group: Option<String>,
    /// Optional sub-command.
    pub subcommand: Option<String>,
    /// Typed options.
    pub options: Vec<CommandOption>,
}

impl Invocation {
    /// Integer option by name.
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.options.iter().find_map(|option| match &option.value {
            OptionValue::Integer(value) if option.name == name => Some(*value),
            _ => None,
        })
    }

    /// String option by name.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.options.iter().find_map(|option| match &option.value {
            OptionValue::Str(value) if option.name == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// Boolean option by name.
    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.options.iter().find_map(|option| match &option.value {
            OptionValue::Boolean(value) if option.name == name => Some(*value),
            _ => None,
        })
    }

    /// Channel option by name.
    pub fn channel(&self, name: &str) -> Option<&ChannelId> {
        self.options.iter().find_map(|option| match &option.value {
            OptionValue::Channel(value) if option.name == name => Some(value),
            _ => None,
        })
    }

    /// The `group/subcommand` path as a displayable string.
    pub fn path(&self) -> String {
        match (&self.group, &self.subcommand) {
            (Some(group), Some(sub)) => format!("{} {group} {sub}", self.name),
            (None, Some(sub)) => format!("{} {sub}", self.name),
            _ => self.name.clone(),
        }
    }
}

/// Handler on the structured surface. Sub-command resolution below the
/// top-level name is the handler's business.
pub trait StructuredCommand: Send + Sync {
    /// Exact structured command name.
    fn name(&self) -> &str;
    /// One-line help string.
    fn help(&self) -> &str;
    /// Access metadata; `Admin` is enforced at dispatch time on this surface
    /// too, matching the text surface.
    fn access(&self) -> AccessLevel {
        AccessLevel::Guild
    }
    /// Run the command.
    fn execute(
        &self,
        invocation: Invocation,
    ) -> BoxFuture<'static, Result<CommandOutcome, ServiceError>>;
}

/// Observer invoked for every plain (non-command) message.
pub trait MessageListener: Send + Sync {
    /// Handle one message.
    fn on_message(
        &self,
        scope: &ScopeId,
        channel: &ChannelId,
        caller: &Caller,
        content: &str,
    ) -> BoxFuture<'static, anyhow::Result<()>>;
}

/// Direction of a reaction change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionChange {
    /// A reaction was added.
    Added,
    /// A reaction was removed.
    Removed,
}

/// Observer invoked for every reaction change.
pub trait ReactionListener: Send + Sync {
    /// Handle one reaction change.
    fn on_reaction(
        &self,
        scope: &ScopeId,
        channel: &ChannelId,
        caller: &Caller,
        emoji: &str,
        change: ReactionChange,
    ) -> BoxFuture<'static, anyhow::Result<()>>;
}

/// Registry and dispatcher for both command surfaces.
pub struct CommandRouter {
    text: HashMap<String, Arc<dyn TextCommand>>,
    structured: HashMap<String, Arc<dyn StructuredCommand>>,
    message_listeners: Vec<Arc<dyn MessageListener>>,
    reaction_listeners: Vec<Arc<dyn ReactionListener>>,
    roles: Arc<dyn RoleCheck>,
    admin_role: Option<String>,
}

impl CommandRouter {
    /// Create an empty router with the given role checker and (optionally)
    /// configured admin role name.
    pub fn new(roles: Arc<dyn RoleCheck>, admin_role: Option<String>) -> Self {
        Self {
            text: HashMap::new(),
            structured: HashMap::new(),
            message_listeners: Vec::new(),
            reaction_listeners: Vec::new(),
            roles,
            admin_role,
        }
    }

    /// Register a text handler under all of its aliases. Duplicate aliases
    /// across handlers are a fatal configuration error.
    pub fn register_text(&mut self, command: Arc<dyn TextCommand>) -> Result<(), ConfigError> {
        let aliases = command.aliases();
        if aliases.is_empty() {
            return Err(ConfigError::NoAliases {
                command: command.name().to_string(),
            });
        }
        for alias in aliases {
            let key = alias.to_lowercase();
            if let Some(existing) = self.text.get(&key) {
                return Err(ConfigError::DuplicateAlias {
                    alias: key,
                    first: existing.name().to_string(),
                    second: command.name().to_string(),
                });
            }
        }
        for alias in aliases {
            self.text.insert(alias.to_lowercase(), command.clone());
        }
        Ok(())
    }

    /// Register a structured handler under its exact name.
    pub fn register_structured(
        &mut self,
        command: Arc<dyn StructuredCommand>,
    ) -> Result<(), ConfigError> {
        let name = command.name().to_string();
        if self.structured.contains_key(&name) {
            return Err(ConfigError::DuplicateCommand(name));
        }
        self.structured.insert(name, command);
        Ok(())
    }

    /// Add an observer for plain messages.
    pub fn add_message_listener(&mut self, listener: Arc<dyn MessageListener>) {
        self.message_listeners.push(listener);
    }

    /// Add an observer for reaction changes.
    pub fn add_reaction_listener(&mut self, listener: Arc<dyn ReactionListener>) {
        self.reaction_listeners.push(listener);
    }

    /// Dispatch one text command. The first whitespace-delimited token is the
    /// alias; the remainder is handed to the handler untokenized. Unknown
    /// aliases and handler failures come back as normal outcomes; the only
    /// error is fatal misconfiguration of the admin gate.
    pub async fn dispatch_text(
        &self,
        scope: ScopeId,
        channel: ChannelId,
        caller: Caller,
        content: &str,
    ) -> Result<CommandOutcome, ConfigError> {
        let (token, args) = split_first_token(content);
        let alias = token.to_lowercase();

        let Some(command) = self.text.get(&alias) else {
            return Ok(unknown_command(&alias));
        };

        if command.admin_only()
            && let Some(refusal) = self.check_admin(command.name(), &caller)?
        {
            return Ok(refusal);
        }

        let ctx = TextContext {
            scope,
            channel,
            caller,
            alias,
            args: args.to_string(),
        };
        let name = command.name().to_string();
        Ok(match command.execute(ctx).await {
            Ok(outcome) => outcome,
            Err(err) => failure_outcome(&name, &err),
        })
    }

    /// Dispatch one structured invocation by exact name. The admin gate is
    /// enforced here exactly as on the text surface.
    pub async fn dispatch_structured(
        &self,
        invocation: Invocation,
    ) -> Result<CommandOutcome, ConfigError> {
        let Some(command) = self.structured.get(&invocation.name) else {
            return Ok(unknown_command(&invocation.name));
        };

        if command.access() == AccessLevel::Admin
            && let Some(refusal) = self.check_admin(command.name(), &invocation.caller)?
        {
            return Ok(refusal);
        }

        let name = command.name().to_string();
        Ok(match command.execute(invocation).await {
            Ok(outcome) => outcome,
            Err(err) => failure_outcome(&name, &err),
        })
    }

    /// Fan a plain message out to every message listener, isolating failures.
    pub async fn notify_message(
        &self,
        scope: &ScopeId,
        channel: &ChannelId,
        caller: &Caller,
        content: &str,
    ) {
        for listener in &self.message_listeners {
            if let Err(err) = listener.on_message(scope, channel, caller, content).await {
                warn!(scope = %scope, error = %err, "message listener failed");
            }
        }
    }

    /// Fan a reaction change out to every reaction listener, isolating
    /// failures.
    pub async fn notify_reaction(
        &self,
        scope: &ScopeId,
        channel: &ChannelId,
        caller: &Caller,
        emoji: &str,
        change: ReactionChange,
    ) {
        for listener in &self.reaction_listeners {
            if let Err(err) = listener
                .on_reaction(scope, channel, caller, emoji, change)
                .await
            {
                warn!(scope = %scope, error = %err, "reaction listener failed");
            }
        }
    }

    /// One help line per registered command: text commands by canonical name,
    /// structured commands prefixed with `/`.
    fn help_lines(&self) -> Vec<String> {
        let mut seen: Vec<&str> = Vec::new();
        let mut lines: Vec<String> = Vec::new();
        for command in self.text.values() {
            if seen.contains(&command.name()) {
                continue;
            }
            seen.push(command.name());
            lines.push(command.help().to_string());
        }
        for command in self.structured.values() {
            lines.push(format!("/{}", command.help()));
        }
        lines
    }

    /// Evaluate the admin gate for `caller`. `Ok(None)` means the gate passed;
    /// `Ok(Some(..))` is the refusal outcome; a missing role configuration is
    /// fatal.
    fn check_admin(
        &self,
        command: &str,
        caller: &Caller,
    ) -> Result<Option<CommandOutcome>, ConfigError> {
        let Some(role) = self.admin_role.as_deref() else {
            return Err(ConfigError::MissingAdminRole {
                command: command.to_string(),
            });
        };
        if self.roles.caller_has_role(caller, role) {
            Ok(None)
        } else {
            Ok(Some(CommandOutcome::new(
                command,
                "not authorized",
                format!("You need the `{role}` role to use this command."),
            )))
        }
    }
}

/// Build the router over the shared state and register every built-in
/// handler. Any configuration error aborts startup.
pub fn build_router(
    state: &SharedState,
    lookup: Arc<dyn CardLookup>,
    roles: Arc<dyn RoleCheck>,
) -> Result<CommandRouter, ConfigError> {
    let admin_role = state.config().admin_role.clone();
    let mut router = CommandRouter::new(roles, admin_role);

    router.register_text(Arc::new(game::StartGameCommand::new(state.clone())))?;
    router.register_text(Arc::new(game::EndGameCommand::new(state.clone())))?;
    router.register_text(Arc::new(game::DamageCommand::new(state.clone())))?;
    router.register_text(Arc::new(game::ClueCommand::new(state.clone())))?;
    router.register_text(Arc::new(game::CounterMeasuresCommand::new(state.clone())))?;
    router.register_text(Arc::new(game::StatusCommand::new(state.clone())))?;
    router.register_text(Arc::new(game::RecordCommand::new(state.clone())))?;
    router.register_text(Arc::new(event::StartEventCommand::new(state.clone())))?;
    router.register_text(Arc::new(event::EndEventCommand::new(state.clone())))?;
    router.register_text(Arc::new(event::TimerCommand::new(state.clone())))?;
    router.register_text(Arc::new(event::BroadcastCommand::new(state.clone())))?;
    router.register_text(Arc::new(cards::CardCommand::new(lookup)))?;

    router.register_structured(Arc::new(game::BlobCommand::new(state.clone())))?;
    router.register_structured(Arc::new(event::EventCommand::new(state.clone())))?;

    // Registered last so the listing covers every command above.
    let help = HelpCommand::new(router.help_lines());
    router.register_text(Arc::new(help))?;

    Ok(router)
}

/// `!help` — list every registered command with its usage line.
struct HelpCommand {
    lines: Vec<String>,
}

const HELP_LINE: &str = "help — list every command";

impl HelpCommand {
    fn new(mut lines: Vec<String>) -> Self {
        lines.push(HELP_LINE.to_string());
        lines.sort();
        Self { lines }
    }
}

impl TextCommand for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }
    fn help(&self) -> &str {
        HELP_LINE
    }
    fn aliases(&self) -> &[&str] {
        &["help", "h"]
    }
    fn execute(
        &self,
        _ctx: TextContext,
    ) -> BoxFuture<'static, Result<CommandOutcome, ServiceError>> {
        let reply = self.lines.join("\n");
        Box::pin(async move { Ok(CommandOutcome::new("help", "listed commands", reply)) })
    }
}

/// Split the leading whitespace-delimited token off `input`.
fn split_first_token(input: &str) -> (&str, &str) {
    let trimmed = input.trim_start();
    match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim_start()),
        None => (trimmed, ""),
    }
}

/// Non-fatal outcome for an unrecognized command name or alias.
fn unknown_command(name: &str) -> CommandOutcome {
    CommandOutcome::new(
        "unknown",
        format!("unknown command `{name}`"),
        format!("Unknown command `{name}`."),
    )
}

/// Outcome reporting a handler failure to the user without crashing the
/// dispatch loop.
fn failure_outcome(command: &str, err: &ServiceError) -> CommandOutcome {
    CommandOutcome::new(command, format!("failed: {err}"), format!("Impossible: {err}."))
}

/// Outcome for a missing or unparsable required argument.
pub(crate) fn missing_argument(command: &str, what: &str) -> CommandOutcome {
    CommandOutcome::new(
        command,
        format!("missing parameter `{what}`"),
        format!("Missing parameter: `{what}`."),
    )
}

/// Outcome for operations that need an active game.
pub(crate) fn no_active_game(command: &str) -> CommandOutcome {
    CommandOutcome::new(
        command,
        "no active game",
        "There is no game running here. Start one first.",
    )
}

/// Outcome for operations that need a running event.
pub(crate) fn no_active_event(command: &str) -> CommandOutcome {
    CommandOutcome::new(
        command,
        "no active event",
        "There is no event running here. Start one first.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::platform::DeclaredRoles;

    struct Echo {
        name: &'static str,
        aliases: &'static [&'static str],
        admin: bool,
        calls: Arc<Mutex<u32>>,
    }

    impl Echo {
        fn new(name: &'static str, aliases: &'static [&'static str], admin: bool) -> Self {
            Self {
                name,
                aliases,
                admin,
                calls: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl TextCommand for Echo {
        fn name(&self) -> &str {
            self.name
        }
        fn help(&self) -> &str {
            "echo"
        }
        fn aliases(&self) -> &[&str] {
            self.aliases
        }
        fn admin_only(&self) -> bool {
            self.admin
        }
        fn execute(
            &self,
            ctx: TextContext,
        ) -> BoxFuture<'static, Result<CommandOutcome, ServiceError>> {
            *self.calls.lock().unwrap() += 1;
            let name = self.name.to_string();
            Box::pin(async move { Ok(CommandOutcome::new(name, "ok", ctx.args)) })
        }
    }

    struct EchoStructured {
        access: AccessLevel,
        calls: Arc<Mutex<u32>>,
    }

    impl StructuredCommand for EchoStructured {
        fn name(&self) -> &str {
            "echo"
        }
        fn help(&self) -> &str {
            "echo"
        }
        fn access(&self) -> AccessLevel {
            self.access
        }
        fn execute(
            &self,
            invocation: Invocation,
        ) -> BoxFuture<'static, Result<CommandOutcome, ServiceError>> {
            *self.calls.lock().unwrap() += 1;
            Box::pin(async move { Ok(CommandOutcome::new("echo", "ok", invocation.path())) })
        }
    }

    fn router(admin_role: Option<&str>) -> CommandRouter {
        CommandRouter::new(Arc::new(DeclaredRoles), admin_role.map(String::from))
    }

    fn caller_with(roles: &[&str]) -> Caller {
        Caller {
            id: "u1".into(),
            name: "tester".into(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    async fn dispatch(router: &CommandRouter, caller: Caller, content: &str) -> CommandOutcome {
        router
            .dispatch_text(
                ScopeId::new("guild-1"),
                ChannelId::from("general"),
                caller,
                content,
            )
            .await
            .unwrap()
    }

    #[test]
    fn duplicate_alias_fails_fast() {
        let mut router = router(None);
        router
            .register_text(Arc::new(Echo::new("first", &["x", "y"], false)))
            .unwrap();
        let err = router
            .register_text(Arc::new(Echo::new("second", &["z", "X"], false)))
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateAlias { alias, .. } if alias == "x"));
        // The losing handler must not be reachable under its other alias.
        assert!(!router.text.contains_key("z"));
    }

    #[test]
    fn aliasless_handler_is_rejected() {
        let mut router = router(None);
        let err = router
            .register_text(Arc::new(Echo::new("mute", &[], false)))
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoAliases { .. }));
    }

    #[tokio::test]
    async fn unknown_alias_is_non_fatal_and_router_stays_usable() {
        let mut r = router(None);
        r.register_text(Arc::new(Echo::new("echo", &["echo"], false)))
            .unwrap();

        let outcome = dispatch(&r, caller_with(&[]), "zzz whatever").await;
        assert_eq!(outcome.command, "unknown");
        assert!(outcome.reply.contains("zzz"));

        let outcome = dispatch(&r, caller_with(&[]), "ECHO hello world").await;
        assert_eq!(outcome.command, "echo");
        assert_eq!(outcome.reply, "hello world");
    }

    #[tokio::test]
    async fn admin_gate_requires_configuration() {
        let mut r = router(None);
        r.register_text(Arc::new(Echo::new("purge", &["purge"], true)))
            .unwrap();
        let err = r
            .dispatch_text(
                ScopeId::new("guild-1"),
                ChannelId::from("general"),
                caller_with(&["Keeper"]),
                "purge",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingAdminRole { .. }));
    }

    #[tokio::test]
    async fn admin_gate_blocks_and_admits() {
        let mut r = router(Some("Keeper"));
        let command = Arc::new(Echo::new("purge", &["purge"], true));
        let calls = command.calls.clone();
        r.register_text(command).unwrap();

        let refused = dispatch(&r, caller_with(&["Bystander"]), "purge now").await;
        assert_eq!(refused.summary, "not authorized");
        assert_eq!(*calls.lock().unwrap(), 0);

        let admitted = dispatch(&r, caller_with(&["Keeper"]), "purge now").await;
        assert_eq!(admitted.reply, "now");
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn structured_surface_enforces_the_admin_gate_too() {
        let mut r = router(Some("Keeper"));
        let command = Arc::new(EchoStructured {
            access: AccessLevel::Admin,
            calls: Arc::new(Mutex::new(0)),
        });
        let calls = command.calls.clone();
        r.register_structured(command).unwrap();

        let invocation = Invocation {
            scope: ScopeId::new("guild-1"),
            channel: ChannelId::from("general"),
            caller: caller_with(&[]),
            name: "echo".into(),
            group: None,
            subcommand: Some("run".into()),
            options: Vec::new(),
        };
        let refused = r.dispatch_structured(invocation.clone()).await.unwrap();
        assert_eq!(refused.summary, "not authorized");
        assert_eq!(*calls.lock().unwrap(), 0);

        let mut admitted = invocation;
        admitted.caller = caller_with(&["Keeper"]);
        let outcome = r.dispatch_structured(admitted).await.unwrap();
        assert_eq!(outcome.reply, "echo run");
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_structured_name_is_non_fatal() {
        let r = router(None);
        let outcome = r
            .dispatch_structured(Invocation {
                scope: ScopeId::new("guild-1"),
                channel: ChannelId::from("general"),
                caller: caller_with(&[]),
                name: "nonesuch".into(),
                group: None,
                subcommand: None,
                options: Vec::new(),
            })
            .await
            .unwrap();
        assert_eq!(outcome.command, "unknown");
    }

    #[tokio::test]
    async fn failing_message_listener_does_not_block_the_rest() {
        struct Counting {
            fail: bool,
            seen: Arc<Mutex<u32>>,
        }
        impl MessageListener for Counting {
            fn on_message(
                &self,
                _scope: &ScopeId,
                _channel: &ChannelId,
                _caller: &Caller,
                _content: &str,
            ) -> BoxFuture<'static, anyhow::Result<()>> {
                let fail = self.fail;
                let seen = self.seen.clone();
                Box::pin(async move {
                    *seen.lock().unwrap() += 1;
                    if fail {
                        anyhow::bail!("listener exploded");
                    }
                    Ok(())
                })
            }
        }

        let mut r = router(None);
        let seen = Arc::new(Mutex::new(0));
        r.add_message_listener(Arc::new(Counting {
            fail: true,
            seen: seen.clone(),
        }));
        r.add_message_listener(Arc::new(Counting {
            fail: false,
            seen: seen.clone(),
        }));

        r.notify_message(
            &ScopeId::new("guild-1"),
            &ChannelId::from("general"),
            &caller_with(&[]),
            "hello",
        )
        .await;
        assert_eq!(*seen.lock().unwrap(), 2);
    }

    #[test]
    fn first_token_splitting() {
        assert_eq!(split_first_token("damage 5"), ("damage", "5"));
        assert_eq!(split_first_token("  cm  gain 2 "), ("cm", "gain 2 "));
        assert_eq!(split_first_token("status"), ("status", ""));
        assert_eq!(split_first_token(""), ("", ""));
    }

    #[test]
    fn invocation_option_accessors() {
        let invocation = Invocation {
            scope: ScopeId::new("guild-1"),
            channel: ChannelId::from("general"),
            caller: caller_with(&[]),
            name: "blob".into(),
            group: None,
            subcommand: Some("damage".into()),
            options: vec![
                CommandOption {
                    name: "amount".into(),
                    value: OptionValue::Integer(7),
                },
                CommandOption {
                    name: "target".into(),
                    value: OptionValue::Channel(ChannelId::from("war-room")),
                },
            ],
        };
        assert_eq!(invocation.integer("amount"), Some(7));
        assert_eq!(invocation.integer("missing"), None);
        assert_eq!(invocation.string("amount"), None);
        assert_eq!(
            invocation.channel("target"),
            Some(&ChannelId::from("war-room"))
        );
        assert_eq!(invocation.path(), "blob damage");
    }
}
