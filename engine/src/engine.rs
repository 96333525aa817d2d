use std::sync::Arc;

use database::{GameStore, StoreTransaction};
use types::{ActionKind, Command, CommandKind, Game, GameId, PlayerStatus};

use crate::config::EngineConfig;
use crate::error::{EngineResult, Rejection};
use crate::locks::GameLocks;
use crate::notify::{Notification, Notifier};
use crate::phase::{DayStart, PhaseController, VoteOutcome};
use crate::roster::add_player;

/// Runs commands against a store, one transaction per command, and reports
/// what happened through the notifier.
pub struct Engine {
    store: Arc<dyn GameStore>,
    notifier: Arc<dyn Notifier>,
    config: Arc<EngineConfig>,
    locks: GameLocks,
}

impl Engine {
    pub fn new(
        store: Arc<dyn GameStore>,
        notifier: Arc<dyn Notifier>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
            locks: GameLocks::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Applies `command` atomically. On success every resulting notification is
    /// emitted and returned; on failure nothing is written and a `Rejected`
    /// notification is emitted before the error is returned.
    pub async fn handle(&self, command: Command) -> EngineResult<Vec<Notification>> {
        let guard = self.locks.acquire(command.game_id).await;
        let result = self.apply(&command).await;
        match &result {
            Ok(notifications) => {
                for notification in notifications {
                    self.notifier
                        .emit(command.game_id, command.post, notification);
                }
            }
            Err(err) => {
                log::warn!(
                    "Rejected {} from {} in post {}: {err}",
                    command.command,
                    command.actor,
                    command.post
                );
                self.notifier.emit(
                    command.game_id,
                    command.post,
                    &Notification::Rejected {
                        command: command.command.to_string(),
                        reason: err.to_string(),
                    },
                );
            }
        }
        drop(guard);

        if result.is_ok() && matches!(command.command, CommandKind::End | CommandKind::Abandon) {
            self.locks.release(command.game_id).await;
        }
        result
    }

    async fn apply(&self, command: &Command) -> EngineResult<Vec<Notification>> {
        let mut tx = if command.command.is_query() {
            self.store.begin_read().await?
        } else {
            self.store.begin().await?
        };
        let notifications = dispatch(&mut *tx, &self.config, command).await?;
        tx.commit().await?;
        Ok(notifications)
    }

    /// Registers the games listed in the config. Games that already exist are left alone.
    pub async fn seed_games(&self) -> EngineResult<usize> {
        let mut seeded = 0;
        for seed in &self.config.games {
            let _guard = self.locks.acquire(seed.id).await;
            let mut tx = self.store.begin().await?;
            if tx.game(seed.id).await?.is_some() {
                continue;
            }

            tx.insert_game(&Game::new(seed.id, seed.name.clone())).await?;
            for name in &seed.mods {
                add_player(&mut *tx, seed.id, name, PlayerStatus::Mod).await?;
            }
            for name in &seed.players {
                add_player(&mut *tx, seed.id, name, PlayerStatus::Alive).await?;
            }
            PhaseController::new(&mut *tx, &self.config)
                .ensure_placeholders(seed.id)
                .await?;
            tx.commit().await?;

            log::info!(
                "Seeded game {} with {} player(s)",
                seed.id,
                seed.players.len()
            );
            seeded += 1;
        }
        Ok(seeded)
    }
}

fn required<'c>(command: &'c Command, idx: usize, name: &'static str) -> Result<&'c str, Rejection> {
    command.arg(idx).ok_or(Rejection::MissingArgument(name))
}

fn day_started(start: DayStart) -> Notification {
    Notification::DayStarted {
        day: start.day,
        living: start.living,
        to_lynch: start.to_lynch,
    }
}

fn vote_outcome(outcome: VoteOutcome) -> Vec<Notification> {
    match outcome {
        VoteOutcome::Voted { voter, target } => vec![Notification::Voted { voter, target }],
        VoteOutcome::Lynched { voter, target, day } => vec![
            Notification::Voted {
                voter,
                target: target.clone(),
            },
            Notification::Lynched { target, day },
        ],
        VoteOutcome::NoLynch { voter } => vec![Notification::NoLynchVoted { voter }],
        VoteOutcome::Rescinded { voter, .. } => vec![Notification::VoteRescinded { voter }],
    }
}

async fn dispatch(
    tx: &mut dyn StoreTransaction,
    config: &EngineConfig,
    command: &Command,
) -> EngineResult<Vec<Notification>> {
    let mut phase = PhaseController::new(tx, config);
    let id: GameId = command.game_id;
    let post = command.post;
    let actor = command.actor.as_str();

    let notifications = match command.command {
        CommandKind::Prepare => {
            let name = command.args.join(" ");
            let name = (!name.is_empty()).then_some(name.as_str());
            let game = phase.prepare(id, name, actor).await?;
            vec![Notification::GameCreated {
                name: game.display_name(),
            }]
        }
        CommandKind::Start => {
            let start = phase.start(id, actor).await?;
            vec![
                Notification::GameStarted { day: start.day },
                day_started(start),
            ]
        }
        CommandKind::NewDay => vec![day_started(phase.new_day(id, actor).await?)],
        CommandKind::Join => {
            let member = phase.join(id, actor).await?;
            vec![Notification::Joined {
                player: member.player.display_name,
            }]
        }
        CommandKind::Add => {
            let target = required(command, 0, "player")?;
            let member = phase.add(id, actor, target).await?;
            vec![Notification::Joined {
                player: member.player.display_name,
            }]
        }
        CommandKind::Vote => {
            let target = required(command, 0, "target")?;
            vote_outcome(phase.cast_vote(id, post, actor, target).await?)
        }
        CommandKind::Unvote => vote_outcome(phase.unvote(id, post, actor).await?),
        CommandKind::NoLynch => vote_outcome(phase.cast_no_lynch(id, post, actor).await?),
        CommandKind::Kill => {
            let target = required(command, 0, "target")?;
            let victim = phase.kill(id, post, actor, target).await?;
            vec![Notification::Killed {
                target: victim.player.display_name,
            }]
        }
        CommandKind::End => {
            let (game, players) = phase.end(id, actor).await?;
            vec![
                Notification::Finished { day: game.day },
                Notification::Players(players),
            ]
        }
        CommandKind::Set => {
            let target = required(command, 0, "player")?;
            let property = required(command, 1, "property")?;
            let change = phase
                .set_player_property(id, post, actor, target, property)
                .await?;
            let target = change.member.player.display_name;
            let mut notifications = vec![Notification::PropertySet {
                target: target.clone(),
                property: change.property,
            }];
            if let Some(day) = change.lynched {
                notifications.push(Notification::Lynched { target, day });
            }
            notifications
        }
        CommandKind::Pause => {
            phase.pause(id, actor).await?;
            vec![Notification::Paused]
        }
        CommandKind::Resume => {
            phase.resume(id, actor).await?;
            vec![Notification::Resumed]
        }
        CommandKind::Abandon => {
            phase.abandon(id, actor).await?;
            vec![Notification::Abandoned]
        }
        CommandKind::Guard | CommandKind::Visit => {
            let kind = if command.command == CommandKind::Guard {
                ActionKind::Guard
            } else {
                ActionKind::Visit
            };
            let target = required(command, 0, "target")?;
            let (action, target) = phase.night_action(id, post, actor, kind, target).await?;
            vec![Notification::NightActionRecorded {
                actor: actor.to_string(),
                action: action.kind.to_string(),
                target,
            }]
        }
        CommandKind::ListPlayers => vec![Notification::Players(phase.list_players(id, false).await?)],
        CommandKind::ListAllPlayers => {
            vec![Notification::Players(phase.list_players(id, true).await?)]
        }
        CommandKind::ListVotes => vec![Notification::Votes {
            reports: phase.list_votes(id, false).await?,
        }],
        CommandKind::ListAllVotes => vec![Notification::Votes {
            reports: phase.list_votes(id, true).await?,
        }],
    };
    Ok(notifications)
}
