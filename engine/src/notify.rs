use std::fmt::Display;
use std::sync::Mutex;

use itertools::Itertools;
use serde::Serialize;
use types::{GameId, PlayerProperty, PostNumber};

use crate::report::{PlayerList, VoteReport};

/// Something observable that happened while handling a command. Wording is
/// the transport's business; `Display` gives a plain default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Notification {
    GameCreated { name: String },
    GameStarted { day: u32 },
    DayStarted { day: u32, living: usize, to_lynch: i64 },
    Joined { player: String },
    Voted { voter: String, target: String },
    VoteRescinded { voter: String },
    NoLynchVoted { voter: String },
    Lynched { target: String, day: u32 },
    Killed { target: String },
    NightActionRecorded { actor: String, action: String, target: String },
    PropertySet { target: String, property: PlayerProperty },
    Paused,
    Resumed,
    Abandoned,
    Finished { day: u32 },
    Players(PlayerList),
    Votes { reports: Vec<VoteReport> },
    Rejected { command: String, reason: String },
}

impl Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notification::GameCreated { name } => write!(f, "Game {name} prepared"),
            Notification::GameStarted { day } => write!(f, "Game started on day {day}"),
            Notification::DayStarted {
                day,
                living,
                to_lynch,
            } => write!(
                f,
                "Day {day} begins: {living} players alive, {to_lynch} votes to lynch"
            ),
            Notification::Joined { player } => write!(f, "{player} joined the game"),
            Notification::Voted { voter, target } => write!(f, "{voter} voted for {target}"),
            Notification::VoteRescinded { voter } => write!(f, "{voter} rescinded their vote"),
            Notification::NoLynchVoted { voter } => write!(f, "{voter} voted for no lynch"),
            Notification::Lynched { target, day } => {
                write!(f, "{target} has been lynched on day {day}! It is now night")
            }
            Notification::Killed { target } => write!(f, "{target} has been killed"),
            Notification::NightActionRecorded {
                actor,
                action,
                target,
            } => write!(f, "{actor} will {action} {target} tonight"),
            Notification::PropertySet { target, property } => {
                write!(f, "{target} is now {property}")
            }
            Notification::Paused => write!(f, "Game paused"),
            Notification::Resumed => write!(f, "Game resumed"),
            Notification::Abandoned => write!(f, "Game abandoned"),
            Notification::Finished { day } => write!(f, "Game over after day {day}"),
            Notification::Players(list) => {
                writeln!(f, "Living players: {}", list.living.iter().join(", "))?;
                if let Some(dead) = &list.dead {
                    writeln!(f, "Dead players: {}", dead.iter().join(", "))?;
                }
                write!(f, "Mod(s): {}", list.mods.iter().join(", "))
            }
            Notification::Votes { reports } => {
                for report in reports {
                    writeln!(
                        f,
                        "Day {} ({} alive, {} to lynch)",
                        report.day, report.living, report.to_lynch
                    )?;
                    for line in &report.lines {
                        let voters = line
                            .voters
                            .iter()
                            .map(|v| match v.retracted_in {
                                Some(post) => format!("~~{}~~ (#{}, unvoted #{post})", v.voter, v.post),
                                None => format!("{} (#{})", v.voter, v.post),
                            })
                            .join(", ");
                        let hammer = if line.hammer { " L-1" } else { "" };
                        writeln!(
                            f,
                            "  {} {}/{}{hammer}: {voters}",
                            line.target, line.votes, line.to_lynch
                        )?;
                    }
                    writeln!(f, "  Not voting: {}", report.not_voting.iter().join(", "))?;
                }
                Ok(())
            }
            Notification::Rejected { command, reason } => {
                write!(f, "{command} rejected: {reason}")
            }
        }
    }
}

/// Outbound side of the engine. Delivery and formatting belong to the implementor.
pub trait Notifier: Send + Sync {
    fn emit(&self, game: GameId, post: PostNumber, notification: &Notification);
}

#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn emit(&self, game: GameId, post: PostNumber, notification: &Notification) {
        log::info!("[game {game}, post {post}] {notification}");
    }
}

/// Prints to stdout, one block per notification; `json` switches to one JSON object per line.
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    pub json: bool,
}

impl Notifier for ConsoleNotifier {
    fn emit(&self, game: GameId, post: PostNumber, notification: &Notification) {
        if self.json {
            match serde_json::to_string(&serde_json::json!({
                "game": game,
                "post": post,
                "notification": notification,
            })) {
                Ok(line) => println!("{line}"),
                Err(err) => log::error!("Failed to serialize notification: {err}"),
            }
        } else {
            println!("[{game} #{post}] {notification}");
        }
    }
}

/// Keeps everything it is handed, for inspection in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    emitted: Mutex<Vec<(GameId, PostNumber, Notification)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> Vec<(GameId, PostNumber, Notification)> {
        self.emitted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn for_game(&self, game: GameId) -> Vec<Notification> {
        self.emitted()
            .into_iter()
            .filter(|(g, _, _)| *g == game)
            .map(|(_, _, n)| n)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn emit(&self, game: GameId, post: PostNumber, notification: &Notification) {
        self.emitted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((game, post, notification.clone()));
    }
}
