pub mod action;
pub mod command;
pub mod error;
pub mod game;
pub mod player;
pub mod roster;

pub use action::{Action, ActionKind, NewAction};
pub use command::{Command, CommandKind};
pub use error::ParseError;
pub use game::{Game, GameId, GameStatus, PostNumber, TimeOfDay};
pub use player::{canonical_name, Player};
pub use roster::{LynchModifier, PlayerProperty, PlayerStatus, RosterEntry, RosterMember};
