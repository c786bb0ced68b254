//! Single source of truth for the active blob game in each scope.

use std::sync::Arc;

use dashmap::DashMap;
use time::OffsetDateTime;

use crate::dao::GameStore;
use crate::error::ServiceError;
use crate::state::ScopeId;
use crate::state::game::{GameRecord, MAX_PLAYERS, Story};

/// Owns the current game per scope and enforces game-lifecycle rules.
///
/// Mutations return `Ok(None)` when no game is active in the scope — callers
/// branch on existence, they do not catch errors. Every applied mutation is
/// persisted immediately; if the save fails the storage error propagates so
/// the caller knows the change may not be durable.
pub struct GameStateService {
    store: Arc<dyn GameStore>,
    current: DashMap<ScopeId, GameRecord>,
}

impl GameStateService {
    /// Build the service over a record store.
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self {
            store,
            current: DashMap::new(),
        }
    }

    /// True iff a current game exists for `scope` and has not ended.
    pub fn is_game_running(&self, scope: &ScopeId) -> bool {
        self.current
            .get(scope)
            .map(|game| game.is_running())
            .unwrap_or(false)
    }

    /// Start a fresh encounter: stamps the creation time, draws a story at
    /// random, persists under a store-assigned id, and installs it as
    /// current. Fails when a game is already running in the scope.
    pub async fn start_new_game(
        &self,
        scope: &ScopeId,
        number_of_players: u32,
    ) -> Result<GameRecord, ServiceError> {
        if number_of_players == 0 {
            return Err(ServiceError::InvalidInput(
                "a game needs at least one player".into(),
            ));
        }
        if number_of_players > MAX_PLAYERS {
            return Err(ServiceError::InvalidInput(format!(
                "a game supports at most {MAX_PLAYERS} players"
            )));
        }
        if self.is_game_running(scope) {
            return Err(ServiceError::InvalidState(format!(
                "a game is already running in scope `{scope}`"
            )));
        }

        let game = GameRecord::new(
            0,
            number_of_players,
            Story::random(),
            OffsetDateTime::now_utc(),
        );
        let game = self.store.create(game).await?;
        self.current.insert(scope.clone(), game.clone());
        Ok(game)
    }

    /// End the current game, stamping the end time and persisting. Returns
    /// the finished record, or `None` when nothing was running.
    pub async fn end_game(&self, scope: &ScopeId) -> Result<Option<GameRecord>, ServiceError> {
        let finished = {
            let Some(mut entry) = self.current.get_mut(scope) else {
                return Ok(None);
            };
            if !entry.is_running() {
                return Ok(None);
            }
            entry.finish(OffsetDateTime::now_utc());
            entry.clone()
        };
        self.store.save(finished.clone()).await?;
        Ok(Some(finished))
    }

    /// Deal damage to the blob, clamped so health never goes negative.
    /// Returns the remaining health; the caller detects defeat via `Some(0)`
    /// and owns any broadcast side effect.
    pub async fn deal_damage_to_blob(
        &self,
        scope: &ScopeId,
        amount: i64,
    ) -> Result<Option<u32>, ServiceError> {
        self.mutate(scope, |game| Ok(game.deal_damage(amount))).await
    }

    /// Place clues on act 1 (unbounded accumulation). Returns the new total.
    pub async fn place_clues_on_act1(
        &self,
        scope: &ScopeId,
        amount: u32,
    ) -> Result<Option<u32>, ServiceError> {
        self.mutate(scope, |game| Ok(game.place_clues(amount))).await
    }

    /// Add counter-measures to the pool. Returns the new total.
    pub async fn gain_counter_measures(
        &self,
        scope: &ScopeId,
        amount: u32,
    ) -> Result<Option<u32>, ServiceError> {
        self.mutate(scope, |game| Ok(game.gain_counter_measures(amount)))
            .await
    }

    /// Spend counter-measures. Fails with a validation error, mutating
    /// nothing, when the pool is too small. Returns the new total.
    pub async fn spend_counter_measures(
        &self,
        scope: &ScopeId,
        amount: u32,
    ) -> Result<Option<u32>, ServiceError> {
        self.mutate(scope, |game| Ok(game.spend_counter_measures(amount)?))
            .await
    }

    /// Snapshot of the current game for `scope`, if one is active.
    pub fn current_game(&self, scope: &ScopeId) -> Option<GameRecord> {
        let entry = self.current.get(scope)?;
        entry.is_running().then(|| entry.clone())
    }

    /// Remaining blob health for the active game.
    pub fn remaining_health(&self, scope: &ScopeId) -> Option<u32> {
        self.current_game(scope).map(|game| game.remaining_health())
    }

    /// Act 1 clue threshold for the active game.
    pub fn clue_threshold(&self, scope: &ScopeId) -> Option<u32> {
        self.current_game(scope).map(|game| game.clue_threshold())
    }

    /// Apply `op` to the active game and persist the result. The map guard is
    /// released before the save awaits, so one scope's in-flight save cannot
    /// block another scope's dispatch.
    async fn mutate<T, F>(&self, scope: &ScopeId, op: F) -> Result<Option<T>, ServiceError>
    where
        F: FnOnce(&mut GameRecord) -> Result<T, ServiceError>,
    {
        let (snapshot, value) = {
            let Some(mut entry) = self.current.get_mut(scope) else {
                return Ok(None);
            };
            if !entry.is_running() {
                return Ok(None);
            }
            let value = op(entry.value_mut())?;
            (entry.clone(), value)
        };
        self.store.save(snapshot).await?;
        Ok(Some(value))
    }
}
