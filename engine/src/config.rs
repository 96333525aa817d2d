use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::{canonical_name, GameId};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A game registered at startup instead of through `prepare`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSeed {
    pub id: GameId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mods: Vec<String>,
    #[serde(default)]
    pub players: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub database_url: Option<String>,
    /// Vote targets that mean "take my vote back".
    pub unvote_aliases: Vec<String>,
    /// Vote targets that mean "lynch nobody today".
    pub no_lynch_aliases: Vec<String>,
    pub games: Vec<GameSeed>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            unvote_aliases: vec!["unvote".to_string()],
            no_lynch_aliases: vec!["no-lynch".to_string(), "nolynch".to_string()],
            games: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteChoice {
    Player(String),
    NoLynch,
    Unvote,
}

impl EngineConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Name given to the unvote placeholder player.
    pub fn unvote_name(&self) -> &str {
        self.unvote_aliases
            .first()
            .map(String::as_str)
            .unwrap_or("unvote")
    }

    /// Name given to the no-lynch placeholder player.
    pub fn no_lynch_name(&self) -> &str {
        self.no_lynch_aliases
            .first()
            .map(String::as_str)
            .unwrap_or("nolynch")
    }

    /// Classifies a raw vote target against the configured aliases.
    pub fn choice(&self, target: &str) -> VoteChoice {
        let name = canonical_name(target);
        let matches = |aliases: &[String]| aliases.iter().any(|a| canonical_name(a) == name);
        if matches(&self.unvote_aliases) {
            VoteChoice::Unvote
        } else if matches(&self.no_lynch_aliases) {
            VoteChoice::NoLynch
        } else {
            VoteChoice::Player(name)
        }
    }
}
