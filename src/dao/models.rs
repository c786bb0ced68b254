//! Persisted record forms and their validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::state::game::{GameRecord, HEALTH_PER_PLAYER, MAX_PLAYERS, Story};

/// Raw persisted form of a [`GameRecord`], one element of the collection file.
///
/// Only raw counters are stored; derived values (total health, clue threshold)
/// are recomputed after loading. Timestamps travel as ISO-8601 strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameRecordEntity {
    /// Repository-assigned identifier.
    pub id: u32,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub date_created: OffsetDateTime,
    /// End timestamp, present once the encounter is over.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_ended: Option<OffsetDateTime>,
    /// Player count fixed at creation.
    pub number_of_players: u32,
    /// Damage dealt so far.
    pub damage_dealt: u32,
    /// Clues placed on act 1 so far.
    pub clues_placed: u32,
    /// Counter-measures currently in the pool.
    pub counter_measures: u32,
    /// Story identifier, if one was drawn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
}

/// Validation failure while rebuilding a domain record from its raw form.
#[derive(Debug, Error)]
pub enum EntityError {
    /// The record declares no players, so every derived value is zero.
    #[error("record {id} has zero players")]
    ZeroPlayers {
        /// Offending record id.
        id: u32,
    },
    /// The player count exceeds [`MAX_PLAYERS`], so the derived values would
    /// not fit their counters.
    #[error("record {id} claims {players} players (limit {MAX_PLAYERS})")]
    TooManyPlayers {
        /// Offending record id.
        id: u32,
        /// Persisted player count.
        players: u32,
    },
    /// The story string is not part of the fixed set.
    #[error("record {id} names unknown story `{story}`")]
    UnknownStory {
        /// Offending record id.
        id: u32,
        /// The unrecognized story identifier.
        story: String,
    },
    /// Damage exceeds the total health derivable from the player count.
    #[error("record {id} reports {damage} damage against {total} total health")]
    DamageOverflow {
        /// Offending record id.
        id: u32,
        /// Persisted damage counter.
        damage: u32,
        /// Total health derived from the player count.
        total: u32,
    },
    /// The end timestamp precedes the creation timestamp.
    #[error("record {id} ended before it was created")]
    EndedBeforeCreated {
        /// Offending record id.
        id: u32,
    },
}

impl From<&GameRecord> for GameRecordEntity {
    fn from(record: &GameRecord) -> Self {
        Self {
            id: record.id(),
            date_created: record.date_created(),
            date_ended: record.date_ended(),
            number_of_players: record.number_of_players(),
            damage_dealt: record.damage_dealt(),
            clues_placed: record.clues_placed(),
            counter_measures: record.counter_measures(),
            story: record.story().map(|story| story.as_str().to_string()),
        }
    }
}

impl TryFrom<GameRecordEntity> for GameRecord {
    type Error = EntityError;

    fn try_from(entity: GameRecordEntity) -> Result<Self, Self::Error> {
        if entity.number_of_players == 0 {
            return Err(EntityError::ZeroPlayers { id: entity.id });
        }
        if entity.number_of_players > MAX_PLAYERS {
            return Err(EntityError::TooManyPlayers {
                id: entity.id,
                players: entity.number_of_players,
            });
        }

        let story = entity
            .story
            .as_deref()
            .map(|value| {
                Story::parse(value).ok_or_else(|| EntityError::UnknownStory {
                    id: entity.id,
                    story: value.to_string(),
                })
            })
            .transpose()?;

        let total = entity.number_of_players * HEALTH_PER_PLAYER;
        if entity.damage_dealt > total {
            return Err(EntityError::DamageOverflow {
                id: entity.id,
                damage: entity.damage_dealt,
                total,
            });
        }

        if let Some(ended) = entity.date_ended
            && ended < entity.date_created
        {
            return Err(EntityError::EndedBeforeCreated { id: entity.id });
        }

        Ok(GameRecord::restore(
            entity.id,
            entity.date_created,
            entity.date_ended,
            entity.number_of_players,
            entity.damage_dealt,
            entity.clues_placed,
            entity.counter_measures,
            story,
        ))
    }
}
