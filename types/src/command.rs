use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{GameId, ParseError, PostNumber};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    Prepare,
    Start,
    Join,
    Add,
    #[serde(alias = "for")]
    Vote,
    Unvote,
    #[serde(alias = "nolynch")]
    NoLynch,
    Kill,
    NewDay,
    End,
    Set,
    Pause,
    Resume,
    Abandon,
    Guard,
    Visit,
    ListPlayers,
    ListAllPlayers,
    ListVotes,
    ListAllVotes,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Prepare => "prepare",
            CommandKind::Start => "start",
            CommandKind::Join => "join",
            CommandKind::Add => "add",
            CommandKind::Vote => "vote",
            CommandKind::Unvote => "unvote",
            CommandKind::NoLynch => "no-lynch",
            CommandKind::Kill => "kill",
            CommandKind::NewDay => "new-day",
            CommandKind::End => "end",
            CommandKind::Set => "set",
            CommandKind::Pause => "pause",
            CommandKind::Resume => "resume",
            CommandKind::Abandon => "abandon",
            CommandKind::Guard => "guard",
            CommandKind::Visit => "visit",
            CommandKind::ListPlayers => "list-players",
            CommandKind::ListAllPlayers => "list-all-players",
            CommandKind::ListVotes => "list-votes",
            CommandKind::ListAllVotes => "list-all-votes",
        }
    }

    /// Commands that only read state.
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            CommandKind::ListPlayers
                | CommandKind::ListAllPlayers
                | CommandKind::ListVotes
                | CommandKind::ListAllVotes
        )
    }
}

impl Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prepare" => Ok(CommandKind::Prepare),
            "start" => Ok(CommandKind::Start),
            "join" => Ok(CommandKind::Join),
            "add" => Ok(CommandKind::Add),
            "vote" | "for" => Ok(CommandKind::Vote),
            "unvote" => Ok(CommandKind::Unvote),
            "no-lynch" | "nolynch" => Ok(CommandKind::NoLynch),
            "kill" => Ok(CommandKind::Kill),
            "new-day" => Ok(CommandKind::NewDay),
            "end" => Ok(CommandKind::End),
            "set" => Ok(CommandKind::Set),
            "pause" => Ok(CommandKind::Pause),
            "resume" => Ok(CommandKind::Resume),
            "abandon" => Ok(CommandKind::Abandon),
            "guard" => Ok(CommandKind::Guard),
            "visit" => Ok(CommandKind::Visit),
            "list-players" => Ok(CommandKind::ListPlayers),
            "list-all-players" => Ok(CommandKind::ListAllPlayers),
            "list-votes" => Ok(CommandKind::ListVotes),
            "list-all-votes" => Ok(CommandKind::ListAllVotes),
            _ => Err(ParseError::unrecognized("command", s)),
        }
    }
}

/// One forum post's worth of instruction, as handed over by the bot transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub game_id: GameId,
    pub post: PostNumber,
    pub actor: String,
    pub command: CommandKind,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Command {
    pub fn new(
        game_id: GameId,
        post: PostNumber,
        actor: &str,
        command: CommandKind,
        args: &[&str],
    ) -> Self {
        Self {
            game_id,
            post,
            actor: actor.to_string(),
            command,
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    pub fn arg(&self, idx: usize) -> Option<&str> {
        self.args.get(idx).map(|arg| arg.as_str())
    }
}
