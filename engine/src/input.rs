//! Turns lines of text into engine commands.

use regex::Regex;
use thiserror::Error;
use types::{Command, CommandKind, GameId, ParseError};

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Expected `GAME POST ACTOR COMMAND [ARGS...]`, got {0:?}")]
    Malformed(String),
    #[error("{0}")]
    Command(#[from] ParseError),
    #[error("Invalid JSON command: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct CommandParser {
    line: Regex,
}

impl CommandParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            line: Regex::new(
                r"^\s*(?<game>\d+)\s+(?<post>\d+)\s+(?<actor>\S+)\s+!?(?<command>\S+)(?:\s+(?<args>.*?))?\s*$",
            )?,
        })
    }

    /// Parses `GAME POST ACTOR COMMAND [ARGS...]`. A leading `!` on the command is ignored.
    pub fn parse_line(&self, input: &str) -> Result<Command, InputError> {
        let caps = self
            .line
            .captures(input)
            .ok_or_else(|| InputError::Malformed(input.to_string()))?;
        log::debug!("Captured: {caps:?}");

        let number = |name: &str| -> Result<i64, InputError> {
            caps[name]
                .parse::<i64>()
                .map_err(|_| InputError::Malformed(input.to_string()))
        };
        let game_id = GameId::new(number("game")?);
        let post = number("post")?;
        let command = caps["command"].parse::<CommandKind>()?;
        let args = caps
            .name("args")
            .map(|m| m.as_str().split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Ok(Command {
            game_id,
            post,
            actor: caps["actor"].to_string(),
            command,
            args,
        })
    }

    pub fn parse_json(&self, input: &str) -> Result<Command, InputError> {
        Ok(serde_json::from_str(input)?)
    }
}
