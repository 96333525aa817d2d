pub mod action_log;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod locks;
pub mod notify;
pub mod phase;
pub mod report;
pub mod resolver;
pub mod roster;
pub mod threshold;

pub use config::{ConfigError, EngineConfig, GameSeed, VoteChoice};
pub use engine::Engine;
pub use error::{EngineError, EngineResult, Missing, Rejection};
pub use input::{CommandParser, InputError};
pub use locks::GameLocks;
pub use notify::{ConsoleNotifier, LogNotifier, Notification, Notifier, RecordingNotifier};
pub use phase::{DayStart, PhaseController, PropertyChange, VoteOutcome};
pub use report::{PlayerList, VoteLine, VoteReport, VoterEntry};
pub use resolver::{Tally, VoteResolver, VoteTarget};
pub use roster::Roster;
pub use threshold::{base_threshold, threshold};
