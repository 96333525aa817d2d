use database::DatabaseError;
use thiserror::Error;
use types::{GameId, GameStatus, PostNumber};

/// Why a command was refused. Checks run before any write, so a rejection
/// never leaves partial state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("It is not day")]
    NotDay,
    #[error("It is not night")]
    NotNight,
    #[error("Cannot move to a new day until night")]
    NotNightYet,
    #[error("Poster is not mod")]
    NotMod,
    #[error("Game not in prep phase")]
    NotInPrepPhase,
    #[error("Game not started")]
    NotRunning,
    #[error("Game not paused")]
    NotPaused,
    #[error("Game already {0}")]
    GameAlreadyExists(GameStatus),
    #[error("Game is over ({0})")]
    GameOver(GameStatus),
    #[error("A game named {0} already exists")]
    NameTaken(String),
    #[error("Voter not in game")]
    VoterNotInGame,
    #[error("Voter not alive")]
    VoterNotAlive,
    #[error("Target not in game")]
    TargetNotInGame,
    #[error("Target not alive")]
    TargetNotAlive,
    #[error("Player already in game")]
    AlreadyJoined,
    #[error("Game is not accepting new players")]
    NotAcceptingPlayers,
    #[error("Unknown property: {0}")]
    UnknownProperty(String),
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("Action recorded for day {recorded} but the game is on day {current}")]
    WrongDay { recorded: u32, current: u32 },
    #[error("Post {retracting} cannot retract post {post}")]
    RetractionBeforeAction {
        post: PostNumber,
        retracting: PostNumber,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    Game(GameId),
    Player(String),
    Action { game: GameId, post: PostNumber },
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Missing::Game(id) => write!(f, "game {id}"),
            Missing::Player(name) => write!(f, "player {name}"),
            Missing::Action { game, post } => write!(f, "action in post {post} of game {game}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    Validation(#[from] Rejection),

    #[error("Not found: {0}")]
    NotFound(Missing),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Persistence error: {0}")]
    Persistence(DatabaseError),
}

impl EngineError {
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            EngineError::Validation(rejection) => Some(rejection),
            _ => None,
        }
    }
}

impl From<DatabaseError> for EngineError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Duplicate(what) => EngineError::Conflict(what),
            DatabaseError::GameNotFound(id) => EngineError::NotFound(Missing::Game(id)),
            DatabaseError::PlayerNotFound(name) => EngineError::NotFound(Missing::Player(name)),
            other => EngineError::Persistence(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
