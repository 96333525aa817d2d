use std::collections::BTreeMap;

use database::StoreTransaction;
use serde::Serialize;
use types::{Action, ActionKind, Game, RosterMember};
use uuid::Uuid;

use crate::action_log::all_actions_for_day;
use crate::error::EngineResult;
use crate::roster::Roster;

/// Where a counted vote lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum VoteTarget {
    Player(Uuid),
    NoLynch,
}

/// Weighted vote counts per target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    counts: BTreeMap<VoteTarget, u32>,
}

impl Tally {
    pub fn get(&self, target: VoteTarget) -> u32 {
        self.counts.get(&target).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VoteTarget, u32)> + '_ {
        self.counts.iter().map(|(target, count)| (*target, *count))
    }

    /// Adds `action` to the tally as if it had just been recorded.
    pub fn record(&mut self, action: &Action, roster: &Roster) {
        if let Some(target) = counted_target(action, roster) {
            *self.counts.entry(target).or_default() += weight(action.kind);
        }
    }

    /// Takes `action` back out, as when it is retracted.
    pub fn withdraw(&mut self, action: &Action, roster: &Roster) {
        if let Some(target) = counted_target(action, roster) {
            if let Some(count) = self.counts.get_mut(&target) {
                *count = count.saturating_sub(weight(action.kind));
                if *count == 0 {
                    self.counts.remove(&target);
                }
            }
        }
    }
}

/// The weight a vote was cast with. Later changes to the voter's roster entry
/// do not reach votes already in the log.
fn weight(kind: ActionKind) -> u32 {
    match kind {
        ActionKind::DoubleVote => 2,
        _ => 1,
    }
}

/// The bucket `action` counts toward, if any. Votes for placeholders only
/// cancel an earlier vote and count for nobody.
fn counted_target(action: &Action, roster: &Roster) -> Option<VoteTarget> {
    match action.kind {
        ActionKind::Vote | ActionKind::DoubleVote => action
            .target_id
            .filter(|target| !roster.is_placeholder(*target))
            .map(VoteTarget::Player),
        ActionKind::NoLynch => Some(VoteTarget::NoLynch),
        ActionKind::Kill | ActionKind::Lynch | ActionKind::Visit | ActionKind::Guard => None,
    }
}

/// Reads one game-day of the action log against a roster snapshot.
#[derive(Debug, Clone)]
pub struct VoteResolver<'a> {
    actions: Vec<Action>,
    roster: &'a Roster,
}

impl<'a> VoteResolver<'a> {
    pub fn new(actions: Vec<Action>, roster: &'a Roster) -> Self {
        Self { actions, roster }
    }

    pub async fn load(
        tx: &mut dyn StoreTransaction,
        game: &Game,
        day: u32,
        roster: &'a Roster,
    ) -> EngineResult<VoteResolver<'a>> {
        let actions = all_actions_for_day(tx, game, day).await?;
        Ok(Self::new(actions, roster))
    }

    /// Every action of the day, oldest first, retracted ones included.
    pub fn history(&self) -> &[Action] {
        &self.actions
    }

    pub fn current_actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter().filter(|a| a.is_current())
    }

    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for action in self.current_actions() {
            tally.record(action, self.roster);
        }
        log::debug!("Tally: {:?}", tally.counts);
        tally
    }

    /// Living players whose current actions put no weight on any target.
    pub fn players_without_current_vote(&self) -> Vec<&'a RosterMember> {
        self.roster
            .living()
            .filter(|member| {
                !self.current_actions().any(|a| {
                    a.player_id == member.player.id && counted_target(a, self.roster).is_some()
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use types::{GameId, Player, PlayerStatus, RosterEntry};

    struct Fixture {
        roster: Roster,
        ids: Vec<Uuid>,
        unvote: Uuid,
    }

    fn fixture() -> Fixture {
        let mut members = Vec::new();
        let mut ids = Vec::new();
        for name in ["Alice", "Bob", "Carol", "Dave"] {
            let player = Player::new(name);
            ids.push(player.id);
            members.push(RosterMember {
                entry: RosterEntry::new(GameId::new(1), player.id, PlayerStatus::Alive),
                player,
            });
        }
        members[2].entry.vote_weight = 2;
        let placeholder = Player::new("unvote");
        let unvote = placeholder.id;
        members.push(RosterMember {
            entry: RosterEntry::new(GameId::new(1), unvote, PlayerStatus::UnvotePlaceholder),
            player: placeholder,
        });
        Fixture {
            roster: Roster::new(members),
            ids,
            unvote,
        }
    }

    fn action(id: i64, post: i64, player: Uuid, kind: ActionKind, target: Option<Uuid>) -> Action {
        Action {
            id,
            game_id: GameId::new(1),
            day: 1,
            post,
            player_id: player,
            kind,
            target_id: target,
            retracted_in_post: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_weighted_tally_skips_placeholders() {
        let f = fixture();
        let (alice, bob, carol, dave) = (f.ids[0], f.ids[1], f.ids[2], f.ids[3]);
        let actions = vec![
            action(1, 10, alice, ActionKind::Vote, Some(bob)),
            action(2, 11, carol, ActionKind::DoubleVote, Some(bob)),
            action(3, 12, dave, ActionKind::Vote, Some(f.unvote)),
            action(4, 13, bob, ActionKind::NoLynch, None),
        ];
        let resolver = VoteResolver::new(actions, &f.roster);
        let tally = resolver.tally();

        assert_eq!(tally.get(VoteTarget::Player(bob)), 3);
        assert_eq!(tally.get(VoteTarget::Player(f.unvote)), 0);
        assert_eq!(tally.get(VoteTarget::NoLynch), 1);

        let idle: Vec<&str> = resolver
            .players_without_current_vote()
            .iter()
            .map(|m| m.name())
            .collect();
        assert_eq!(idle, vec!["dave"]);
    }

    #[test]
    fn test_retracted_actions_do_not_count() {
        let f = fixture();
        let (alice, bob) = (f.ids[0], f.ids[1]);
        let mut old = action(1, 10, alice, ActionKind::Vote, Some(bob));
        old.retracted_in_post = Some(14);
        let resolver = VoteResolver::new(vec![old], &f.roster);

        assert_eq!(resolver.tally().get(VoteTarget::Player(bob)), 0);
        assert_eq!(resolver.current_actions().count(), 0);
        assert_eq!(resolver.history().len(), 1);
    }

    #[test]
    fn test_incremental_tally_matches_replay() {
        let f = fixture();
        let (alice, bob, carol, dave) = (f.ids[0], f.ids[1], f.ids[2], f.ids[3]);
        let script = [
            (alice, ActionKind::Vote, Some(bob)),
            (carol, ActionKind::DoubleVote, Some(dave)),
            (alice, ActionKind::Vote, Some(dave)),
            (dave, ActionKind::NoLynch, None),
            (carol, ActionKind::DoubleVote, Some(bob)),
            (alice, ActionKind::Vote, Some(f.unvote)),
        ];

        let mut log: Vec<Action> = Vec::new();
        let mut incremental = Tally::default();
        for (idx, (player, kind, target)) in script.into_iter().enumerate() {
            let post = 10 + idx as i64;
            for prior in log
                .iter_mut()
                .filter(|a| a.player_id == player && a.is_current())
            {
                prior.retracted_in_post = Some(post);
                incremental.withdraw(prior, &f.roster);
            }
            let next = action(idx as i64 + 1, post, player, kind, target);
            incremental.record(&next, &f.roster);
            log.push(next);
        }

        let replayed = VoteResolver::new(log, &f.roster).tally();
        assert_eq!(incremental, replayed);
        assert_eq!(replayed.get(VoteTarget::Player(bob)), 2);
        assert_eq!(replayed.get(VoteTarget::NoLynch), 1);
    }

    #[test]
    fn test_weight_comes_from_recorded_kind() {
        let f = fixture();
        let (alice, carol, dave) = (f.ids[0], f.ids[2], f.ids[3]);
        // Carol is a double voter now but cast a plain vote.
        let actions = vec![
            action(1, 10, carol, ActionKind::Vote, Some(dave)),
            action(2, 11, alice, ActionKind::Vote, Some(dave)),
        ];
        let resolver = VoteResolver::new(actions, &f.roster);

        assert_eq!(resolver.tally().get(VoteTarget::Player(dave)), 2);
    }
}
