//! Blob encounter record and its derived battlefield math.

use rand::seq::IndexedRandom;
use thiserror::Error;
use time::OffsetDateTime;

/// Health points the blob gains for each registered player.
pub const HEALTH_PER_PLAYER: u32 = 15;
/// Clues each player must contribute to complete act 1.
pub const CLUES_PER_PLAYER: u32 = 2;
/// Upper bound on the player count, far above any real table. Keeps every
/// derived value well inside `u32`.
pub const MAX_PLAYERS: u32 = 1_000;

/// Closed set of stories an encounter can resolve into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Story {
    /// Investigate the crash site.
    CrashSite,
    /// Negotiate with the military camp.
    MilitaryCamp,
    /// Question the strange villagers.
    StrangeVillagers,
    /// Confront the cosmic incursion directly.
    CosmicIncursion,
}

impl Story {
    /// Every story in the fixed set, in rulebook order.
    pub const ALL: [Story; 4] = [
        Story::CrashSite,
        Story::MilitaryCamp,
        Story::StrangeVillagers,
        Story::CosmicIncursion,
    ];

    /// Stable identifier used in persistence and replies.
    pub fn as_str(self) -> &'static str {
        match self {
            Story::CrashSite => "crash-site",
            Story::MilitaryCamp => "military-camp",
            Story::StrangeVillagers => "strange-villagers",
            Story::CosmicIncursion => "cosmic-incursion",
        }
    }

    /// Resolve a persisted identifier back into the fixed set.
    pub fn parse(value: &str) -> Option<Story> {
        Story::ALL.iter().copied().find(|s| s.as_str() == value)
    }

    /// Pick a story uniformly at random.
    pub fn random() -> Story {
        Story::ALL
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(Story::CrashSite)
    }
}

impl std::fmt::Display for Story {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a spend would drive the counter-measure pool negative.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot spend {requested} counter-measures, only {available} available")]
pub struct InsufficientCounterMeasures {
    /// Amount the caller tried to spend.
    pub requested: u32,
    /// Amount actually in the pool.
    pub available: u32,
}

/// One run of the cooperative blob encounter.
///
/// Identity fields are fixed at creation; the counters move through the
/// operations below, which uphold `damage_dealt <= total_health` and keep the
/// counter-measure pool non-negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    id: u32,
    date_created: OffsetDateTime,
    date_ended: Option<OffsetDateTime>,
    number_of_players: u32,
    damage_dealt: u32,
    clues_placed: u32,
    counter_measures: u32,
    story: Option<Story>,
}

impl GameRecord {
    /// Create a fresh encounter with zeroed counters.
    pub fn new(id: u32, number_of_players: u32, story: Story, date_created: OffsetDateTime) -> Self {
        Self {
            id,
            date_created,
            date_ended: None,
            number_of_players,
            damage_dealt: 0,
            clues_placed: 0,
            counter_measures: 0,
            story: Some(story),
        }
    }

    /// Rebuild a record from persisted counters. Callers are expected to have
    /// validated the fields first (see `dao::models`).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: u32,
        date_created: OffsetDateTime,
        date_ended: Option<OffsetDateTime>,
        number_of_players: u32,
        damage_dealt: u32,
        clues_placed: u32,
        counter_measures: u32,
        story: Option<Story>,
    ) -> Self {
        Self {
            id,
            date_created,
            date_ended,
            number_of_players,
            damage_dealt,
            clues_placed,
            counter_measures,
            story,
        }
    }

    /// Repository-assigned identifier.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Creation timestamp.
    pub fn date_created(&self) -> OffsetDateTime {
        self.date_created
    }

    /// End timestamp, once the encounter is over.
    pub fn date_ended(&self) -> Option<OffsetDateTime> {
        self.date_ended
    }

    /// Player count fixed at creation.
    pub fn number_of_players(&self) -> u32 {
        self.number_of_players
    }

    /// Damage dealt so far, clamped to [`total_health`](Self::total_health).
    pub fn damage_dealt(&self) -> u32 {
        self.damage_dealt
    }

    /// Clues placed on act 1 so far (unbounded).
    pub fn clues_placed(&self) -> u32 {
        self.clues_placed
    }

    /// Counter-measures currently in the pool.
    pub fn counter_measures(&self) -> u32 {
        self.counter_measures
    }

    /// Story this encounter resolves into, if one was drawn.
    pub fn story(&self) -> Option<Story> {
        self.story
    }

    /// Assign the repository id. Used by stores when inserting a fresh record.
    pub(crate) fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    /// Total blob health derived from the player count. Saturates rather than
    /// wraps; counts past [`MAX_PLAYERS`] are rejected at the validation
    /// boundaries before they reach here.
    pub fn total_health(&self) -> u32 {
        self.number_of_players.saturating_mul(HEALTH_PER_PLAYER)
    }

    /// Health the blob has left.
    pub fn remaining_health(&self) -> u32 {
        self.total_health() - self.damage_dealt
    }

    /// Clues required on act 1, derived from the player count.
    pub fn clue_threshold(&self) -> u32 {
        self.number_of_players.saturating_mul(CLUES_PER_PLAYER)
    }

    /// Whether the encounter is still in progress.
    pub fn is_running(&self) -> bool {
        self.date_ended.is_none()
    }

    /// Apply a (signed) amount of damage. The resulting total is clamped to
    /// `[0, total_health]`, so overkill caps at full defeat instead of
    /// erroring. Returns the remaining health.
    pub fn deal_damage(&mut self, amount: i64) -> u32 {
        let total = i64::from(self.total_health());
        let next = (i64::from(self.damage_dealt) + amount).clamp(0, total);
        self.damage_dealt = next as u32;
        self.remaining_health()
    }

    /// Add clues to act 1. There is no cap; accumulation past the threshold is
    /// allowed. Returns the new total.
    pub fn place_clues(&mut self, amount: u32) -> u32 {
        self.clues_placed = self.clues_placed.saturating_add(amount);
        self.clues_placed
    }

    /// Add counter-measures to the pool (unbounded). Returns the new total.
    pub fn gain_counter_measures(&mut self, amount: u32) -> u32 {
        self.counter_measures = self.counter_measures.saturating_add(amount);
        self.counter_measures
    }

    /// Spend counter-measures from the pool. Fails without mutating when the
    /// requested amount exceeds the pool; a negative balance is unreachable.
    pub fn spend_counter_measures(
        &mut self,
        amount: u32,
    ) -> Result<u32, InsufficientCounterMeasures> {
        if amount > self.counter_measures {
            return Err(InsufficientCounterMeasures {
                requested: amount,
                available: self.counter_measures,
            });
        }
        self.counter_measures -= amount;
        Ok(self.counter_measures)
    }

    /// Mark the encounter as over. The end timestamp is set exactly once;
    /// later calls are ignored.
    pub fn finish(&mut self, date_ended: OffsetDateTime) {
        if self.date_ended.is_none() {
            self.date_ended = Some(date_ended);
        }
    }
}
