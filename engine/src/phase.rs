//! The game state machine. Every operation validates against the state read
//! inside the current transaction before writing anything.

use std::collections::HashMap;

use database::StoreTransaction;
use types::{
    Action, ActionKind, Game, GameId, GameStatus, NewAction, PlayerProperty, PlayerStatus,
    PostNumber, RosterMember, TimeOfDay,
};

use crate::action_log::{death_days, record_action, revoke_current};
use crate::config::{EngineConfig, VoteChoice};
use crate::error::{EngineError, EngineResult, Missing, Rejection};
use crate::report::{PlayerList, VoteReport};
use crate::resolver::{VoteResolver, VoteTarget};
use crate::roster::{add_player, set_status, Roster};
use crate::threshold::{base_threshold, threshold};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayStart {
    pub day: u32,
    pub living: usize,
    pub to_lynch: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    Voted { voter: String, target: String },
    /// The vote reached the target's threshold; the game has moved to night.
    Lynched {
        voter: String,
        target: String,
        day: u32,
    },
    NoLynch { voter: String },
    Rescinded { voter: String, revoked: usize },
}

#[derive(Debug, Clone)]
pub struct PropertyChange {
    pub member: RosterMember,
    pub property: PlayerProperty,
    /// The day `member` was lynched on, when the change completed a lynch.
    pub lynched: Option<u32>,
}

pub struct PhaseController<'a> {
    tx: &'a mut dyn StoreTransaction,
    config: &'a EngineConfig,
}

fn require_member<'r>(
    roster: &'r Roster,
    name: &str,
    missing: Rejection,
) -> Result<&'r RosterMember, Rejection> {
    roster.find(name).ok_or(missing)
}

fn require_mod(roster: &Roster, actor: &str) -> Result<(), Rejection> {
    if roster.is_mod(actor) {
        Ok(())
    } else {
        Err(Rejection::NotMod)
    }
}

fn require_running(game: &Game) -> Result<(), Rejection> {
    match game.status {
        GameStatus::Running => Ok(()),
        status if status.is_terminal() => Err(Rejection::GameOver(status)),
        _ => Err(Rejection::NotRunning),
    }
}

fn require_live(game: &Game) -> Result<(), Rejection> {
    if game.status.is_terminal() {
        Err(Rejection::GameOver(game.status))
    } else {
        Ok(())
    }
}

impl<'a> PhaseController<'a> {
    pub fn new(tx: &'a mut dyn StoreTransaction, config: &'a EngineConfig) -> Self {
        Self { tx, config }
    }

    async fn load_game(&mut self, id: GameId) -> EngineResult<Game> {
        self.tx
            .game(id)
            .await?
            .ok_or(EngineError::NotFound(Missing::Game(id)))
    }

    async fn load_roster(&mut self, id: GameId) -> EngineResult<Roster> {
        Roster::load(&mut *self.tx, id).await
    }

    /// Creates the unvote and no-lynch placeholders if the game lacks them.
    pub async fn ensure_placeholders(&mut self, id: GameId) -> EngineResult<()> {
        let unvote = self.config.unvote_name().to_string();
        let no_lynch = self.config.no_lynch_name().to_string();
        add_player(&mut *self.tx, id, &unvote, PlayerStatus::UnvotePlaceholder).await?;
        add_player(&mut *self.tx, id, &no_lynch, PlayerStatus::NolynchPlaceholder).await?;
        Ok(())
    }

    pub async fn prepare(
        &mut self,
        id: GameId,
        name: Option<&str>,
        actor: &str,
    ) -> EngineResult<Game> {
        if let Some(existing) = self.tx.game(id).await? {
            return Err(Rejection::GameAlreadyExists(existing.status).into());
        }
        if let Some(name) = name {
            if self.tx.game_by_name(name).await?.is_some() {
                return Err(Rejection::NameTaken(name.to_string()).into());
            }
        }

        let game = Game::new(id, name.map(str::to_string));
        self.tx.insert_game(&game).await?;
        add_player(&mut *self.tx, id, actor, PlayerStatus::Mod).await?;
        self.ensure_placeholders(id).await?;
        log::info!("Prepared {game} with mod {actor}");
        Ok(game)
    }

    pub async fn start(&mut self, id: GameId, actor: &str) -> EngineResult<DayStart> {
        let mut game = self.load_game(id).await?;
        if game.status != GameStatus::Preparing {
            return Err(Rejection::NotInPrepPhase.into());
        }
        let roster = self.load_roster(id).await?;
        require_mod(&roster, actor)?;

        game.status = GameStatus::Running;
        game.day = 1;
        game.time_of_day = TimeOfDay::Day;
        self.tx.update_game(&game).await?;
        log::info!("Started {game}");
        Ok(day_start(&game, &roster))
    }

    pub async fn new_day(&mut self, id: GameId, actor: &str) -> EngineResult<DayStart> {
        let mut game = self.load_game(id).await?;
        require_running(&game)?;
        let roster = self.load_roster(id).await?;
        require_mod(&roster, actor)?;
        if !game.is_night() {
            return Err(Rejection::NotNightYet.into());
        }

        game.day += 1;
        game.time_of_day = TimeOfDay::Day;
        self.tx.update_game(&game).await?;
        log::info!("New day in {game}");
        Ok(day_start(&game, &roster))
    }

    pub async fn join(&mut self, id: GameId, actor: &str) -> EngineResult<RosterMember> {
        let game = self.load_game(id).await?;
        if game.status != GameStatus::Preparing {
            return Err(Rejection::NotAcceptingPlayers.into());
        }
        let roster = self.load_roster(id).await?;
        if roster.find(actor).is_some() {
            return Err(Rejection::AlreadyJoined.into());
        }

        let member = add_player(&mut *self.tx, id, actor, PlayerStatus::Alive).await?;
        log::info!("{} joined {game}", member.player);
        Ok(member)
    }

    pub async fn add(&mut self, id: GameId, actor: &str, target: &str) -> EngineResult<RosterMember> {
        let game = self.load_game(id).await?;
        require_live(&game)?;
        let roster = self.load_roster(id).await?;
        require_mod(&roster, actor)?;
        if roster.find(target).is_some() {
            return Err(Rejection::AlreadyJoined.into());
        }

        let member = add_player(&mut *self.tx, id, target, PlayerStatus::Alive).await?;
        log::info!("{actor} added {} to {game}", member.player);
        Ok(member)
    }

    /// Shared checks for every day-time vote: running, daytime, voter alive on the roster.
    async fn voting_context(
        &mut self,
        id: GameId,
        actor: &str,
    ) -> EngineResult<(Game, Roster, RosterMember)> {
        let game = self.load_game(id).await?;
        require_running(&game)?;
        if !game.is_day() {
            return Err(Rejection::NotDay.into());
        }
        let roster = self.load_roster(id).await?;
        let voter = require_member(&roster, actor, Rejection::VoterNotInGame)?.clone();
        if !voter.is_alive() {
            return Err(Rejection::VoterNotAlive.into());
        }
        Ok((game, roster, voter))
    }

    pub async fn cast_vote(
        &mut self,
        id: GameId,
        post: PostNumber,
        actor: &str,
        target: &str,
    ) -> EngineResult<VoteOutcome> {
        let name = match self.config.choice(target) {
            VoteChoice::Unvote => return self.unvote(id, post, actor).await,
            VoteChoice::NoLynch => return self.cast_no_lynch(id, post, actor).await,
            VoteChoice::Player(name) => name,
        };

        let (mut game, mut roster, voter) = self.voting_context(id, actor).await?;
        let target = require_member(&roster, &name, Rejection::TargetNotInGame)?.clone();
        if !target.is_alive() {
            return Err(Rejection::TargetNotAlive.into());
        }

        revoke_current(&mut *self.tx, &game, voter.player.id, post, |k| k.is_vote_type()).await?;
        let kind = if voter.entry.vote_weight >= 2 {
            ActionKind::DoubleVote
        } else {
            ActionKind::Vote
        };
        record_action(
            &mut *self.tx,
            &game,
            NewAction {
                game_id: id,
                day: game.day,
                post,
                player_id: voter.player.id,
                kind,
                target_id: Some(target.player.id),
            },
        )
        .await?;

        let voter_name = voter.player.display_name.clone();
        let target_name = target.player.display_name.clone();
        if !self
            .lynch_if_reached(&mut game, &mut roster, &target, voter.player.id, post)
            .await?
        {
            return Ok(VoteOutcome::Voted {
                voter: voter_name,
                target: target_name,
            });
        }
        Ok(VoteOutcome::Lynched {
            voter: voter_name,
            target: target_name,
            day: game.day,
        })
    }

    /// Lynches `target` once today's tally reaches its threshold: marks it dead,
    /// logs a lynch action for `actor` in `post` and moves the game to night.
    async fn lynch_if_reached(
        &mut self,
        game: &mut Game,
        roster: &mut Roster,
        target: &RosterMember,
        actor: Uuid,
        post: PostNumber,
    ) -> EngineResult<bool> {
        let votes = VoteResolver::load(&mut *self.tx, game, game.day, roster)
            .await?
            .tally()
            .get(VoteTarget::Player(target.player.id));
        let needed = threshold(roster.living_count(), target.entry.lynch_modifier);
        log::debug!("{} has {votes} of {needed} votes needed", target.player);
        if i64::from(votes) < needed {
            return Ok(false);
        }

        record_action(
            &mut *self.tx,
            game,
            NewAction {
                game_id: game.id,
                day: game.day,
                post,
                player_id: actor,
                kind: ActionKind::Lynch,
                target_id: Some(target.player.id),
            },
        )
        .await?;
        set_status(&mut *self.tx, roster, target.player.id, PlayerStatus::Dead).await?;
        game.time_of_day = TimeOfDay::Night;
        self.tx.update_game(game).await?;
        log::info!("{} lynched on day {} of {game}", target.player, game.day);
        Ok(true)
    }

    pub async fn cast_no_lynch(
        &mut self,
        id: GameId,
        post: PostNumber,
        actor: &str,
    ) -> EngineResult<VoteOutcome> {
        let (game, roster, voter) = self.voting_context(id, actor).await?;
        let placeholder = roster
            .placeholder(PlayerStatus::NolynchPlaceholder)
            .map(|m| m.player.id);

        revoke_current(&mut *self.tx, &game, voter.player.id, post, |k| k.is_vote_type()).await?;
        record_action(
            &mut *self.tx,
            &game,
            NewAction {
                game_id: id,
                day: game.day,
                post,
                player_id: voter.player.id,
                kind: ActionKind::NoLynch,
                target_id: placeholder,
            },
        )
        .await?;
        Ok(VoteOutcome::NoLynch {
            voter: voter.player.display_name,
        })
    }

    /// Withdraws the actor's current vote. With nothing to withdraw, nothing is recorded.
    pub async fn unvote(
        &mut self,
        id: GameId,
        post: PostNumber,
        actor: &str,
    ) -> EngineResult<VoteOutcome> {
        let (game, roster, voter) = self.voting_context(id, actor).await?;
        let revoked =
            revoke_current(&mut *self.tx, &game, voter.player.id, post, |k| k.is_vote_type())
                .await?;

        if revoked > 0 {
            if let Some(placeholder) = roster.placeholder(PlayerStatus::UnvotePlaceholder) {
                record_action(
                    &mut *self.tx,
                    &game,
                    NewAction {
                        game_id: id,
                        day: game.day,
                        post,
                        player_id: voter.player.id,
                        kind: ActionKind::Vote,
                        target_id: Some(placeholder.player.id),
                    },
                )
                .await?;
            }
        }
        Ok(VoteOutcome::Rescinded {
            voter: voter.player.display_name,
            revoked,
        })
    }

    pub async fn kill(
        &mut self,
        id: GameId,
        post: PostNumber,
        actor: &str,
        target: &str,
    ) -> EngineResult<RosterMember> {
        let game = self.load_game(id).await?;
        require_running(&game)?;
        let mut roster = self.load_roster(id).await?;
        require_mod(&roster, actor)?;
        let moderator = require_member(&roster, actor, Rejection::NotMod)?.player.id;
        let victim = require_member(&roster, target, Rejection::TargetNotInGame)?.clone();
        if !victim.is_alive() {
            return Err(Rejection::TargetNotAlive.into());
        }

        record_action(
            &mut *self.tx,
            &game,
            NewAction {
                game_id: id,
                day: game.day,
                post,
                player_id: moderator,
                kind: ActionKind::Kill,
                target_id: Some(victim.player.id),
            },
        )
        .await?;
        set_status(&mut *self.tx, &mut roster, victim.player.id, PlayerStatus::Dead).await?;
        log::info!("{actor} killed {} in {game}", victim.player);
        Ok(victim)
    }

    pub async fn end(&mut self, id: GameId, actor: &str) -> EngineResult<(Game, PlayerList)> {
        let mut game = self.load_game(id).await?;
        require_running(&game)?;
        let roster = self.load_roster(id).await?;
        require_mod(&roster, actor)?;

        game.day += 1;
        game.status = GameStatus::Finished;
        self.tx.update_game(&game).await?;
        log::info!("Finished {game}");
        Ok((game, PlayerList::build(&roster, true)))
    }

    /// Applies `property` to `target`. Votes already cast keep their weight; a
    /// new lynch modifier applies at once, so a daytime change can lynch.
    pub async fn set_player_property(
        &mut self,
        id: GameId,
        post: PostNumber,
        actor: &str,
        target: &str,
        property: &str,
    ) -> EngineResult<PropertyChange> {
        let mut game = self.load_game(id).await?;
        require_live(&game)?;
        let mut roster = self.load_roster(id).await?;
        require_mod(&roster, actor)?;
        let moderator = require_member(&roster, actor, Rejection::NotMod)?.player.id;
        let mut member = require_member(&roster, target, Rejection::TargetNotInGame)?.clone();
        let property = property
            .parse::<PlayerProperty>()
            .map_err(|_| Rejection::UnknownProperty(property.to_string()))?;

        member.entry.apply(property);
        self.tx.update_roster_entry(&member.entry).await?;
        roster.replace(member.entry.clone());
        log::info!("{} is now {property} in {game}", member.player);

        let lynched = game.is_running()
            && game.is_day()
            && member.is_alive()
            && self
                .lynch_if_reached(&mut game, &mut roster, &member, moderator, post)
                .await?;
        Ok(PropertyChange {
            lynched: lynched.then_some(game.day),
            member,
            property,
        })
    }

    pub async fn pause(&mut self, id: GameId, actor: &str) -> EngineResult<Game> {
        let mut game = self.load_game(id).await?;
        require_running(&game)?;
        self.require_mod_of(id, actor).await?;
        game.status = GameStatus::Paused;
        self.tx.update_game(&game).await?;
        log::info!("Paused {game}");
        Ok(game)
    }

    pub async fn resume(&mut self, id: GameId, actor: &str) -> EngineResult<Game> {
        let mut game = self.load_game(id).await?;
        if game.status != GameStatus::Paused {
            return Err(Rejection::NotPaused.into());
        }
        self.require_mod_of(id, actor).await?;
        game.status = GameStatus::Running;
        self.tx.update_game(&game).await?;
        log::info!("Resumed {game}");
        Ok(game)
    }

    pub async fn abandon(&mut self, id: GameId, actor: &str) -> EngineResult<Game> {
        let mut game = self.load_game(id).await?;
        require_live(&game)?;
        self.require_mod_of(id, actor).await?;
        game.status = GameStatus::Abandoned;
        self.tx.update_game(&game).await?;
        log::info!("Abandoned {game}");
        Ok(game)
    }

    async fn require_mod_of(&mut self, id: GameId, actor: &str) -> EngineResult<()> {
        let roster = self.load_roster(id).await?;
        Ok(require_mod(&roster, actor)?)
    }

    /// Records a night-time guard or visit. A new action replaces the actor's
    /// current one of the same kind; nothing is resolved automatically.
    pub async fn night_action(
        &mut self,
        id: GameId,
        post: PostNumber,
        actor: &str,
        kind: ActionKind,
        target: &str,
    ) -> EngineResult<(Action, String)> {
        let game = self.load_game(id).await?;
        require_running(&game)?;
        if !game.is_night() {
            return Err(Rejection::NotNight.into());
        }
        let roster = self.load_roster(id).await?;
        let player = require_member(&roster, actor, Rejection::VoterNotInGame)?;
        if !player.is_alive() {
            return Err(Rejection::VoterNotAlive.into());
        }
        let target = require_member(&roster, target, Rejection::TargetNotInGame)?;
        if !target.is_alive() {
            return Err(Rejection::TargetNotAlive.into());
        }

        revoke_current(&mut *self.tx, &game, player.player.id, post, move |k| k == kind).await?;
        let action = record_action(
            &mut *self.tx,
            &game,
            NewAction {
                game_id: id,
                day: game.day,
                post,
                player_id: player.player.id,
                kind,
                target_id: Some(target.player.id),
            },
        )
        .await?;
        Ok((action, target.player.display_name.clone()))
    }

    pub async fn list_players(&mut self, id: GameId, include_dead: bool) -> EngineResult<PlayerList> {
        self.load_game(id).await?;
        let roster = self.load_roster(id).await?;
        Ok(PlayerList::build(&roster, include_dead))
    }

    /// Today's vote report, or one per day so far when `all_days` is set.
    pub async fn list_votes(&mut self, id: GameId, all_days: bool) -> EngineResult<Vec<VoteReport>> {
        let game = self.load_game(id).await?;
        let roster = self.load_roster(id).await?;
        if game.day == 0 {
            return Ok(Vec::new());
        }

        let first = if all_days { 1 } else { game.day };
        let deaths = if first < game.day {
            death_days(&mut *self.tx, &game).await?
        } else {
            HashMap::new()
        };
        let mut reports = Vec::new();
        for day in first..=game.day {
            // Past days are reported against the roster as it stood then.
            let then = if day < game.day {
                roster.as_of(day, &deaths)
            } else {
                roster.clone()
            };
            let resolver = VoteResolver::load(&mut *self.tx, &game, day, &then).await?;
            reports.push(VoteReport::build(day, &resolver, &then));
        }
        Ok(reports)
    }
}

fn day_start(game: &Game, roster: &Roster) -> DayStart {
    let living = roster.living_count();
    DayStart {
        day: game.day,
        living,
        to_lynch: base_threshold(living),
    }
}
