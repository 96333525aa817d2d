use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{GameId, ParseError, Player};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayerStatus {
    Alive,
    Dead,
    Mod,
    Spectator,
    UnvotePlaceholder,
    NolynchPlaceholder,
    Other,
}

impl PlayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerStatus::Alive => "alive",
            PlayerStatus::Dead => "dead",
            PlayerStatus::Mod => "mod",
            PlayerStatus::Spectator => "spectator",
            PlayerStatus::UnvotePlaceholder => "unvote-placeholder",
            PlayerStatus::NolynchPlaceholder => "nolynch-placeholder",
            PlayerStatus::Other => "other",
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(
            self,
            PlayerStatus::UnvotePlaceholder | PlayerStatus::NolynchPlaceholder
        )
    }
}

impl Display for PlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlayerStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alive" => Ok(PlayerStatus::Alive),
            "dead" => Ok(PlayerStatus::Dead),
            "mod" => Ok(PlayerStatus::Mod),
            "spectator" => Ok(PlayerStatus::Spectator),
            "unvote-placeholder" => Ok(PlayerStatus::UnvotePlaceholder),
            "nolynch-placeholder" => Ok(PlayerStatus::NolynchPlaceholder),
            "other" => Ok(PlayerStatus::Other),
            _ => Err(ParseError::unrecognized("player status", s)),
        }
    }
}

/// Shifts the votes needed to lynch a player when they are the target.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LynchModifier {
    Hated,
    #[default]
    Vanilla,
    Loved,
}

impl LynchModifier {
    pub fn value(&self) -> i64 {
        match self {
            LynchModifier::Hated => -1,
            LynchModifier::Vanilla => 0,
            LynchModifier::Loved => 1,
        }
    }

    pub fn from_value(value: i64) -> Result<Self, ParseError> {
        match value {
            -1 => Ok(LynchModifier::Hated),
            0 => Ok(LynchModifier::Vanilla),
            1 => Ok(LynchModifier::Loved),
            _ => Err(ParseError::OutOfRange {
                kind: "lynch modifier",
                value,
            }),
        }
    }
}

/// Properties a moderator can assign with `set`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayerProperty {
    Loved,
    Hated,
    DoubleVoter,
    Vanilla,
}

impl Display for PlayerProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerProperty::Loved => write!(f, "loved"),
            PlayerProperty::Hated => write!(f, "hated"),
            PlayerProperty::DoubleVoter => write!(f, "a double voter"),
            PlayerProperty::Vanilla => write!(f, "vanilla"),
        }
    }
}

impl FromStr for PlayerProperty {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "loved" => Ok(PlayerProperty::Loved),
            "hated" => Ok(PlayerProperty::Hated),
            "doublevoter" | "double-voter" | "double_voter" | "doublevote" => {
                Ok(PlayerProperty::DoubleVoter)
            }
            "vanilla" => Ok(PlayerProperty::Vanilla),
            _ => Err(ParseError::unrecognized("player property", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub game_id: GameId,
    pub player_id: Uuid,
    pub status: PlayerStatus,
    pub vote_weight: u32,
    pub lynch_modifier: LynchModifier,
}

impl RosterEntry {
    pub fn new(game_id: GameId, player_id: Uuid, status: PlayerStatus) -> Self {
        Self {
            game_id,
            player_id,
            status,
            vote_weight: 1,
            lynch_modifier: LynchModifier::Vanilla,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status == PlayerStatus::Alive
    }

    pub fn is_mod(&self) -> bool {
        self.status == PlayerStatus::Mod
    }

    pub fn apply(&mut self, property: PlayerProperty) {
        match property {
            PlayerProperty::Loved => self.lynch_modifier = LynchModifier::Loved,
            PlayerProperty::Hated => self.lynch_modifier = LynchModifier::Hated,
            PlayerProperty::DoubleVoter => self.vote_weight = 2,
            PlayerProperty::Vanilla => {
                self.vote_weight = 1;
                self.lynch_modifier = LynchModifier::Vanilla;
            }
        }
    }
}

/// A roster entry joined with the player it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterMember {
    pub entry: RosterEntry,
    pub player: Player,
}

impl RosterMember {
    pub fn name(&self) -> &str {
        &self.player.name
    }

    pub fn is_alive(&self) -> bool {
        self.entry.is_alive()
    }
}
