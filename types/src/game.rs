use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Post numbers come from the forum thread and only ever increase.
pub type PostNumber = i64;

/// A game is keyed by the forum thread it is played in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub i64);

impl GameId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Preparing,
    Running,
    Paused,
    Abandoned,
    Finished,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Preparing => "preparing",
            GameStatus::Running => "running",
            GameStatus::Paused => "paused",
            GameStatus::Abandoned => "abandoned",
            GameStatus::Finished => "finished",
        }
    }

    /// Finished and abandoned games never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameStatus::Abandoned | GameStatus::Finished)
    }
}

impl Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GameStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preparing" => Ok(GameStatus::Preparing),
            "running" => Ok(GameStatus::Running),
            "paused" => Ok(GameStatus::Paused),
            "abandoned" => Ok(GameStatus::Abandoned),
            "finished" => Ok(GameStatus::Finished),
            _ => Err(ParseError::unrecognized("game status", s)),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Day,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Day => "day",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeOfDay {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "morning" => Ok(TimeOfDay::Morning),
            "day" => Ok(TimeOfDay::Day),
            "evening" => Ok(TimeOfDay::Evening),
            "night" => Ok(TimeOfDay::Night),
            _ => Err(ParseError::unrecognized("time of day", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub name: Option<String>,
    pub status: GameStatus,
    pub day: u32,
    pub time_of_day: TimeOfDay,
}

impl Game {
    /// A freshly prepared game sits on day 0 at night until the mod starts it.
    pub fn new(id: GameId, name: Option<String>) -> Self {
        Self {
            id,
            name,
            status: GameStatus::Preparing,
            day: 0,
            time_of_day: TimeOfDay::Night,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == GameStatus::Running
    }

    pub fn is_day(&self) -> bool {
        self.time_of_day == TimeOfDay::Day
    }

    pub fn is_night(&self) -> bool {
        self.time_of_day == TimeOfDay::Night
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("game {}", self.id))
    }
}

impl Display for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, day {}, {})",
            self.display_name(),
            self.status,
            self.day,
            self.time_of_day
        )
    }
}
