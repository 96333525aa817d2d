//! Read-only views of a game for the `list-*` commands.

use rand::seq::SliceRandom;
use rand::thread_rng;
use serde::Serialize;
use types::{ActionKind, PostNumber, RosterMember};
use uuid::Uuid;

use crate::resolver::{VoteResolver, VoteTarget};
use crate::roster::Roster;
use crate::threshold::{base_threshold, threshold};

pub const NO_LYNCH_LABEL: &str = "No lynch";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoterEntry {
    pub voter: String,
    pub post: PostNumber,
    pub retracted_in: Option<PostNumber>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteLine {
    pub target: String,
    pub votes: u32,
    pub to_lynch: i64,
    /// One more vote would lynch.
    pub hammer: bool,
    pub voters: Vec<VoterEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteReport {
    pub day: u32,
    pub living: usize,
    pub to_lynch: i64,
    pub lines: Vec<VoteLine>,
    pub not_voting: Vec<String>,
}

impl VoteReport {
    pub fn build(day: u32, resolver: &VoteResolver<'_>, roster: &Roster) -> Self {
        let living = roster.living_count();
        let tally = resolver.tally();

        let mut targets: Vec<VoteTarget> = Vec::new();
        for action in resolver.history() {
            if !action.is_vote_type() {
                continue;
            }
            let target = match target_of(action.kind, action.target_id) {
                Some(VoteTarget::Player(id)) if roster.is_placeholder(id) => continue,
                Some(target) => target,
                None => continue,
            };
            if !targets.contains(&target) {
                targets.push(target);
            }
        }

        let lines = targets
            .into_iter()
            .map(|target| {
                let voters = resolver
                    .history()
                    .iter()
                    .filter(|a| a.is_vote_type() && target_of(a.kind, a.target_id) == Some(target))
                    .map(|a| VoterEntry {
                        voter: display_name(roster.member(a.player_id)),
                        post: a.post,
                        retracted_in: a.retracted_in_post,
                    })
                    .collect();
                let (label, to_lynch) = match target {
                    VoteTarget::Player(id) => {
                        let member = roster.member(id);
                        let modifier = member.map(|m| m.entry.lynch_modifier).unwrap_or_default();
                        (display_name(member), threshold(living, modifier))
                    }
                    VoteTarget::NoLynch => (NO_LYNCH_LABEL.to_string(), base_threshold(living)),
                };
                let votes = tally.get(target);
                VoteLine {
                    target: label,
                    votes,
                    to_lynch,
                    hammer: to_lynch - i64::from(votes) == 1,
                    voters,
                }
            })
            .collect();

        let mut not_voting: Vec<String> = resolver
            .players_without_current_vote()
            .into_iter()
            .map(|m| m.player.display_name.clone())
            .collect();
        not_voting.shuffle(&mut thread_rng());

        Self {
            day,
            living,
            to_lynch: base_threshold(living),
            lines,
            not_voting,
        }
    }
}

fn target_of(kind: ActionKind, target: Option<Uuid>) -> Option<VoteTarget> {
    match kind {
        ActionKind::NoLynch => Some(VoteTarget::NoLynch),
        _ => target.map(VoteTarget::Player),
    }
}

fn display_name(member: Option<&RosterMember>) -> String {
    member
        .map(|m| m.player.display_name.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

fn display_names<'a>(members: impl Iterator<Item = &'a RosterMember>) -> Vec<String> {
    members.map(|m| m.player.display_name.clone()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerList {
    pub living: Vec<String>,
    /// Only filled for `list-all-players` and the end-of-game summary.
    pub dead: Option<Vec<String>>,
    pub mods: Vec<String>,
}

impl PlayerList {
    pub fn build(roster: &Roster, include_dead: bool) -> Self {
        let mut rng = thread_rng();
        let mut living = display_names(roster.living());
        living.shuffle(&mut rng);
        let dead = include_dead.then(|| {
            let mut dead = display_names(roster.dead());
            dead.shuffle(&mut rng);
            dead
        });

        Self {
            living,
            dead,
            mods: display_names(roster.mods()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use types::{Action, GameId, LynchModifier, Player, PlayerStatus, RosterEntry};

    fn roster() -> (Roster, Vec<Uuid>) {
        let mut members = Vec::new();
        for (name, status) in [
            ("Alice", PlayerStatus::Alive),
            ("Bob", PlayerStatus::Alive),
            ("Carol", PlayerStatus::Alive),
            ("Dave", PlayerStatus::Alive),
            ("Eve", PlayerStatus::Alive),
            ("Mallory", PlayerStatus::Dead),
            ("Mod", PlayerStatus::Mod),
        ] {
            let player = Player::new(name);
            members.push(RosterMember {
                entry: RosterEntry::new(GameId::new(1), player.id, status),
                player,
            });
        }
        members[1].entry.lynch_modifier = LynchModifier::Hated;
        let ids = members.iter().map(|m| m.player.id).collect();
        (Roster::new(members), ids)
    }

    fn vote(id: i64, post: PostNumber, player: Uuid, target: Uuid) -> Action {
        Action {
            id,
            game_id: GameId::new(1),
            day: 1,
            post,
            player_id: player,
            kind: ActionKind::Vote,
            target_id: Some(target),
            retracted_in_post: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_vote_report_lines() {
        let (roster, ids) = roster();
        let mut first = vote(1, 10, ids[0], ids[2]);
        first.retracted_in_post = Some(12);
        let actions = vec![
            first,
            vote(2, 11, ids[2], ids[1]),
            vote(3, 12, ids[0], ids[1]),
        ];
        let resolver = VoteResolver::new(actions, &roster);
        let report = VoteReport::build(1, &resolver, &roster);

        assert_eq!(report.living, 5);
        assert_eq!(report.to_lynch, 3);
        assert_eq!(report.lines.len(), 2);

        let carol = &report.lines[0];
        assert_eq!(carol.target, "Carol");
        assert_eq!(carol.votes, 0);
        assert_eq!(carol.voters[0].retracted_in, Some(12));

        // Bob is hated, which moves his threshold to four.
        let bob = &report.lines[1];
        assert_eq!(bob.votes, 2);
        assert_eq!(bob.to_lynch, 4);
        assert!(!bob.hammer);
        let posts: Vec<_> = bob.voters.iter().map(|v| v.post).collect();
        assert_eq!(posts, vec![11, 12]);

        let mut idle = report.not_voting.clone();
        idle.sort();
        assert_eq!(idle, vec!["Bob", "Dave", "Eve"]);
    }

    #[test]
    fn test_player_lists() {
        let (roster, _) = roster();
        let short = PlayerList::build(&roster, false);
        assert_eq!(short.living.len(), 5);
        assert!(short.dead.is_none());
        assert_eq!(short.mods, vec!["Mod"]);

        let full = PlayerList::build(&roster, true);
        assert_eq!(full.dead, Some(vec!["Mallory".to_string()]));
    }
}
