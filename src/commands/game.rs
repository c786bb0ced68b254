//! Blob game commands: lifecycle, counters, status, and history lookup.
//!
//! Both surfaces route into the shared helpers below so the text and
//! structured renditions of an operation cannot drift apart.

use futures::future::BoxFuture;
use tracing::info;

use crate::error::ServiceError;
use crate::state::game::GameRecord;
use crate::state::{ScopeId, SharedState};

use super::{
    CommandOutcome, Invocation, StructuredCommand, TextCommand, TextContext, missing_argument,
    no_active_game, split_first_token,
};

async fn start_game(
    state: SharedState,
    scope: ScopeId,
    players: u32,
) -> Result<CommandOutcome, ServiceError> {
    let game = state.games().start_new_game(&scope, players).await?;
    let story = game
        .story()
        .map(|story| story.to_string())
        .unwrap_or_else(|| "unknown".into());
    Ok(CommandOutcome::new(
        "start-game",
        format!("started game {}", game.id()),
        format!(
            "Game #{} begins! {} investigators face the blob: {} health, {} clues to finish act 1. Story: {story}.",
            game.id(),
            game.number_of_players(),
            game.total_health(),
            game.clue_threshold(),
        ),
    ))
}

async fn end_game(state: SharedState, scope: ScopeId) -> Result<CommandOutcome, ServiceError> {
    match state.games().end_game(&scope).await? {
        Some(game) => Ok(CommandOutcome::new(
            "end-game",
            format!("ended game {}", game.id()),
            format!(
                "Game #{} is over. Final tally: {}/{} damage, {} clues, {} counter-measures left.",
                game.id(),
                game.damage_dealt(),
                game.total_health(),
                game.clues_placed(),
                game.counter_measures(),
            ),
        )),
        None => Ok(no_active_game("end-game")),
    }
}

async fn deal_damage(
    state: SharedState,
    scope: ScopeId,
    amount: i64,
) -> Result<CommandOutcome, ServiceError> {
    let Some(remaining) = state.games().deal_damage_to_blob(&scope, amount).await? else {
        return Ok(no_active_game("damage"));
    };
    if remaining == 0 {
        // Defeat is announced to the whole event, when one is running.
        if let Some(delivered) = state
            .events()
            .broadcast(&scope, "The blob has been defeated!", &[])
            .await
        {
            info!(scope = %scope, delivered, "defeat announced to event channels");
        }
        return Ok(CommandOutcome::new(
            "damage",
            "blob defeated",
            "The blob collapses! It has been defeated.",
        ));
    }
    Ok(CommandOutcome::new(
        "damage",
        format!("applied {amount} damage"),
        format!("Hit registered. The blob has {remaining} health left."),
    ))
}

async fn place_clues(
    state: SharedState,
    scope: ScopeId,
    amount: u32,
) -> Result<CommandOutcome, ServiceError> {
    let Some(total) = state.games().place_clues_on_act1(&scope, amount).await? else {
        return Ok(no_active_game("clue"));
    };
    let threshold = state.games().clue_threshold(&scope).unwrap_or(total);
    Ok(CommandOutcome::new(
        "clue",
        format!("placed {amount} clues"),
        format!("Clues on act 1: {total}/{threshold}."),
    ))
}

async fn gain_counter_measures(
    state: SharedState,
    scope: ScopeId,
    amount: u32,
) -> Result<CommandOutcome, ServiceError> {
    let Some(total) = state.games().gain_counter_measures(&scope, amount).await? else {
        return Ok(no_active_game("counter-measures"));
    };
    Ok(CommandOutcome::new(
        "counter-measures",
        format!("gained {amount} counter-measures"),
        format!("Counter-measures in the pool: {total}."),
    ))
}

async fn spend_counter_measures(
    state: SharedState,
    scope: ScopeId,
    amount: u32,
) -> Result<CommandOutcome, ServiceError> {
    let Some(total) = state.games().spend_counter_measures(&scope, amount).await? else {
        return Ok(no_active_game("counter-measures"));
    };
    Ok(CommandOutcome::new(
        "counter-measures",
        format!("spent {amount} counter-measures"),
        format!("Counter-measures spent. {total} remain in the pool."),
    ))
}

fn status_reply(game: &GameRecord) -> String {
    let story = game
        .story()
        .map(|story| story.to_string())
        .unwrap_or_else(|| "unknown".into());
    format!(
        "Game #{} — {} players, story {story}. Blob: {}/{} health. Clues: {}/{}. Counter-measures: {}.",
        game.id(),
        game.number_of_players(),
        game.remaining_health(),
        game.total_health(),
        game.clues_placed(),
        game.clue_threshold(),
        game.counter_measures(),
    )
}

async fn status(state: SharedState, scope: ScopeId) -> Result<CommandOutcome, ServiceError> {
    match state.games().current_game(&scope) {
        Some(game) => Ok(CommandOutcome::new(
            "status",
            format!("status of game {}", game.id()),
            status_reply(&game),
        )),
        None => Ok(no_active_game("status")),
    }
}

async fn record(state: SharedState, id: u32) -> Result<CommandOutcome, ServiceError> {
    let Some(game) = state.store().find(id).await? else {
        return Err(ServiceError::NotFound(format!("no game found with id {id}")));
    };
    let ended = match game.date_ended() {
        Some(_) => "finished",
        None => "in progress",
    };
    Ok(CommandOutcome::new(
        "record",
        format!("looked up game {id}"),
        format!("{} ({ended})", status_reply(&game)),
    ))
}

/// `!startgame <players>` — open a fresh encounter.
pub struct StartGameCommand {
    state: SharedState,
}

impl StartGameCommand {
    /// Build the handler.
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl TextCommand for StartGameCommand {
    fn name(&self) -> &str {
        "start-game"
    }
    fn help(&self) -> &str {
        "startgame <players> — start a new blob encounter"
    }
    fn aliases(&self) -> &[&str] {
        &["startgame", "sg"]
    }
    fn execute(
        &self,
        ctx: TextContext,
    ) -> BoxFuture<'static, Result<CommandOutcome, ServiceError>> {
        let state = self.state.clone();
        Box::pin(async move {
            let (token, _) = split_first_token(&ctx.args);
            let Ok(players) = token.parse::<u32>() else {
                return Ok(missing_argument("start-game", "number of players"));
            };
            start_game(state, ctx.scope, players).await
        })
    }
}

/// `!endgame` — close the running encounter.
pub struct EndGameCommand {
    state: SharedState,
}

impl EndGameCommand {
    /// Build the handler.
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl TextCommand for EndGameCommand {
    fn name(&self) -> &str {
        "end-game"
    }
    fn help(&self) -> &str {
        "endgame — end the running blob encounter"
    }
    fn aliases(&self) -> &[&str] {
        &["endgame", "eg"]
    }
    fn execute(
        &self,
        ctx: TextContext,
    ) -> BoxFuture<'static, Result<CommandOutcome, ServiceError>> {
        let state = self.state.clone();
        Box::pin(async move { end_game(state, ctx.scope).await })
    }
}

/// `!damage <amount>` — deal (or, negative, heal) blob damage.
pub struct DamageCommand {
    state: SharedState,
}

impl DamageCommand {
    /// Build the handler.
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl TextCommand for DamageCommand {
    fn name(&self) -> &str {
        "damage"
    }
    fn help(&self) -> &str {
        "damage <amount> — deal damage to the blob"
    }
    fn aliases(&self) -> &[&str] {
        &["damage", "hit"]
    }
    fn execute(
        &self,
        ctx: TextContext,
    ) -> BoxFuture<'static, Result<CommandOutcome, ServiceError>> {
        let state = self.state.clone();
        Box::pin(async move {
            let (token, _) = split_first_token(&ctx.args);
            let Ok(amount) = token.parse::<i64>() else {
                return Ok(missing_argument("damage", "amount"));
            };
            deal_damage(state, ctx.scope, amount).await
        })
    }
}

/// `!clue <amount>` — place clues on act 1.
pub struct ClueCommand {
    state: SharedState,
}

impl ClueCommand {
    /// Build the handler.
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl TextCommand for ClueCommand {
    fn name(&self) -> &str {
        "clue"
    }
    fn help(&self) -> &str {
        "clue <amount> — place clues on act 1"
    }
    fn aliases(&self) -> &[&str] {
        &["clue", "clues"]
    }
    fn execute(
        &self,
        ctx: TextContext,
    ) -> BoxFuture<'static, Result<CommandOutcome, ServiceError>> {
        let state = self.state.clone();
        Box::pin(async move {
            let (token, _) = split_first_token(&ctx.args);
            let Ok(amount) = token.parse::<u32>() else {
                return Ok(missing_argument("clue", "amount"));
            };
            place_clues(state, ctx.scope, amount).await
        })
    }
}

/// `!cm gain|spend <amount>` — move counter-measures in or out of the pool.
pub struct CounterMeasuresCommand {
    state: SharedState,
}

impl CounterMeasuresCommand {
    /// Build the handler.
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl TextCommand for CounterMeasuresCommand {
    fn name(&self) -> &str {
        "counter-measures"
    }
    fn help(&self) -> &str {
        "cm gain|spend <amount> — adjust the counter-measure pool"
    }
    fn aliases(&self) -> &[&str] {
        &["cm", "countermeasures"]
    }
    fn execute(
        &self,
        ctx: TextContext,
    ) -> BoxFuture<'static, Result<CommandOutcome, ServiceError>> {
        let state = self.state.clone();
        Box::pin(async move {
            let (action, rest) = split_first_token(&ctx.args);
            let (token, _) = split_first_token(rest);
            let Ok(amount) = token.parse::<u32>() else {
                return Ok(missing_argument("counter-measures", "amount"));
            };
            match action {
                "gain" => gain_counter_measures(state, ctx.scope, amount).await,
                "spend" => spend_counter_measures(state, ctx.scope, amount).await,
                _ => Ok(missing_argument("counter-measures", "gain|spend")),
            }
        })
    }
}

/// `!status` — snapshot of the running encounter.
pub struct StatusCommand {
    state: SharedState,
}

impl StatusCommand {
    /// Build the handler.
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl TextCommand for StatusCommand {
    fn name(&self) -> &str {
        "status"
    }
    fn help(&self) -> &str {
        "status — show the running encounter"
    }
    fn aliases(&self) -> &[&str] {
        &["status", "blobstatus"]
    }
    fn execute(
        &self,
        ctx: TextContext,
    ) -> BoxFuture<'static, Result<CommandOutcome, ServiceError>> {
        let state = self.state.clone();
        Box::pin(async move { status(state, ctx.scope).await })
    }
}

/// `!game <id>` — look a past game up by id.
pub struct RecordCommand {
    state: SharedState,
}

impl RecordCommand {
    /// Build the handler.
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl TextCommand for RecordCommand {
    fn name(&self) -> &str {
        "record"
    }
    fn help(&self) -> &str {
        "game <id> — look up a stored game record"
    }
    fn aliases(&self) -> &[&str] {
        &["game", "record"]
    }
    fn execute(
        &self,
        ctx: TextContext,
    ) -> BoxFuture<'static, Result<CommandOutcome, ServiceError>> {
        let state = self.state.clone();
        Box::pin(async move {
            let (token, _) = split_first_token(&ctx.args);
            let Ok(id) = token.parse::<u32>() else {
                return Ok(missing_argument("record", "game id"));
            };
            record(state, id).await
        })
    }
}

/// `/blob <subcommand>` — the structured rendition of the game commands.
pub struct BlobCommand {
    state: SharedState,
}

impl BlobCommand {
    /// Build the handler.
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl StructuredCommand for BlobCommand {
    fn name(&self) -> &str {
        "blob"
    }
    fn help(&self) -> &str {
        "blob start|end|damage|clue|cm|status — run the encounter"
    }
    fn execute(
        &self,
        invocation: Invocation,
    ) -> BoxFuture<'static, Result<CommandOutcome, ServiceError>> {
        let state = self.state.clone();
        Box::pin(async move {
            let scope = invocation.scope.clone();
            match invocation.subcommand.as_deref() {
                Some("start") => {
                    let Some(players) = invocation.integer("players") else {
                        return Ok(missing_argument("start-game", "players"));
                    };
                    let Ok(players) = u32::try_from(players) else {
                        return Ok(missing_argument("start-game", "players"));
                    };
                    start_game(state, scope, players).await
                }
                Some("end") => end_game(state, scope).await,
                Some("damage") => {
                    let Some(amount) = invocation.integer("amount") else {
                        return Ok(missing_argument("damage", "amount"));
                    };
                    deal_damage(state, scope, amount).await
                }
                Some("clue") => {
                    let Some(amount) = invocation.integer("amount") else {
                        return Ok(missing_argument("clue", "amount"));
                    };
                    let Ok(amount) = u32::try_from(amount) else {
                        return Ok(missing_argument("clue", "amount"));
                    };
                    place_clues(state, scope, amount).await
                }
                Some("cm") => {
                    let Some(amount) = invocation.integer("amount") else {
                        return Ok(missing_argument("counter-measures", "amount"));
                    };
                    let Ok(amount) = u32::try_from(amount) else {
                        return Ok(missing_argument("counter-measures", "amount"));
                    };
                    match invocation.string("action") {
                        Some("gain") => gain_counter_measures(state, scope, amount).await,
                        Some("spend") => spend_counter_measures(state, scope, amount).await,
                        _ => Ok(missing_argument("counter-measures", "action")),
                    }
                }
                Some("status") | None => status(state, scope).await,
                Some(other) => Ok(missing_argument("blob", &format!("subcommand `{other}`"))),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::commands::{CommandOption, OptionValue, build_router};
    use crate::config::AppConfig;
    use crate::dao::json_store::JsonFileStore;
    use crate::platform::{
        Caller, ChannelId, DeclaredRoles, LogSink, UnconfiguredCardLookup,
    };
    use crate::state::AppState;

    fn test_state() -> (SharedState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path().join("games.json")));
        let state = AppState::new(
            AppConfig {
                command_prefix: "!".into(),
                admin_role: Some("Keeper".into()),
                data_path: dir.path().join("games.json"),
                timer_tick_seconds: 3600,
            },
            store,
            Arc::new(LogSink),
        );
        (state, dir)
    }

    fn caller() -> Caller {
        Caller {
            id: "u1".into(),
            name: "tester".into(),
            roles: vec!["Keeper".into()],
        }
    }

    async fn run(state: &SharedState, content: &str) -> CommandOutcome {
        let router = build_router(
            state,
            Arc::new(UnconfiguredCardLookup),
            Arc::new(DeclaredRoles),
        )
        .unwrap();
        router
            .dispatch_text(
                ScopeId::new("guild-1"),
                ChannelId::from("general"),
                caller(),
                content,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn full_game_through_the_text_surface() {
        let (state, _dir) = test_state();

        let started = run(&state, "startgame 2").await;
        assert_eq!(started.command, "start-game");
        assert!(started.reply.contains("30 health"));

        let hit = run(&state, "damage 12").await;
        assert!(hit.reply.contains("18 health left"));

        let clue = run(&state, "clue 3").await;
        assert!(clue.reply.contains("3/4"));

        run(&state, "cm gain 2").await;
        let spent = run(&state, "cm spend 1").await;
        assert!(spent.reply.contains("1 remain"));

        let status = run(&state, "status").await;
        assert!(status.reply.contains("18/30 health"));

        let ended = run(&state, "endgame").await;
        assert!(ended.reply.contains("is over"));
    }

    #[tokio::test]
    async fn defeat_is_reported_on_the_killing_blow() {
        let (state, _dir) = test_state();
        run(&state, "startgame 1").await;
        let defeat = run(&state, "damage 15").await;
        assert_eq!(defeat.summary, "blob defeated");
    }

    #[tokio::test]
    async fn overspending_counter_measures_reports_the_failure() {
        let (state, _dir) = test_state();
        run(&state, "startgame 1").await;
        let outcome = run(&state, "cm spend 5").await;
        assert!(outcome.summary.starts_with("failed"));
        assert!(outcome.reply.contains("only 0 available"));
    }

    #[tokio::test]
    async fn missing_arguments_are_reported_not_fatal() {
        let (state, _dir) = test_state();
        let outcome = run(&state, "startgame").await;
        assert!(outcome.summary.contains("missing parameter"));
        let outcome = run(&state, "damage lots").await;
        assert!(outcome.summary.contains("missing parameter"));
        let outcome = run(&state, "cm sideways 3").await;
        assert!(outcome.summary.contains("missing parameter"));
    }

    #[tokio::test]
    async fn game_commands_without_a_game_point_at_start() {
        let (state, _dir) = test_state();
        for content in ["damage 5", "clue 1", "cm gain 1", "status", "endgame"] {
            let outcome = run(&state, content).await;
            assert_eq!(outcome.summary, "no active game", "for `{content}`");
        }
    }

    #[tokio::test]
    async fn record_lookup_round_trips_through_the_store() {
        let (state, _dir) = test_state();
        run(&state, "startgame 3").await;
        run(&state, "damage 7").await;

        let outcome = run(&state, "game 1").await;
        assert!(outcome.reply.contains("Game #1"));
        assert!(outcome.reply.contains("in progress"));

        let missing = run(&state, "game 99").await;
        assert!(missing.summary.starts_with("failed"));
    }

    #[tokio::test]
    async fn help_lists_every_command_from_both_surfaces() {
        let (state, _dir) = test_state();
        let outcome = run(&state, "help").await;
        assert_eq!(outcome.command, "help");
        assert!(outcome.reply.contains("startgame"));
        assert!(outcome.reply.contains("timer"));
        assert!(outcome.reply.contains("/blob"));
        assert!(outcome.reply.contains("/event"));
        assert!(outcome.reply.contains("help"));
    }

    #[tokio::test]
    async fn structured_blob_command_mirrors_the_text_surface() {
        let (state, _dir) = test_state();
        let router = build_router(
            &state,
            Arc::new(UnconfiguredCardLookup),
            Arc::new(DeclaredRoles),
        )
        .unwrap();

        let invocation = |subcommand: &str, options: Vec<CommandOption>| Invocation {
            scope: ScopeId::new("guild-1"),
            channel: ChannelId::from("general"),
            caller: caller(),
            name: "blob".into(),
            group: None,
            subcommand: Some(subcommand.into()),
            options,
        };

        let started = router
            .dispatch_structured(invocation(
                "start",
                vec![CommandOption {
                    name: "players".into(),
                    value: OptionValue::Integer(4),
                }],
            ))
            .await
            .unwrap();
        assert!(started.reply.contains("60 health"));

        let hit = router
            .dispatch_structured(invocation(
                "damage",
                vec![CommandOption {
                    name: "amount".into(),
                    value: OptionValue::Integer(10),
                }],
            ))
            .await
            .unwrap();
        assert!(hit.reply.contains("50 health left"));

        let missing = router
            .dispatch_structured(invocation("damage", Vec::new()))
            .await
            .unwrap();
        assert!(missing.summary.contains("missing parameter"));
    }
}
