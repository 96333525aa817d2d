use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{GameId, ParseError, PostNumber};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Vote,
    DoubleVote,
    NoLynch,
    Kill,
    /// Written by the engine when a vote reaches the threshold.
    Lynch,
    Visit,
    Guard,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Vote => "vote",
            ActionKind::DoubleVote => "double-vote",
            ActionKind::NoLynch => "no-lynch",
            ActionKind::Kill => "kill",
            ActionKind::Lynch => "lynch",
            ActionKind::Visit => "visit",
            ActionKind::Guard => "guard",
        }
    }

    /// Kinds that compete for a player's single current vote.
    pub fn is_vote_type(&self) -> bool {
        matches!(
            self,
            ActionKind::Vote | ActionKind::DoubleVote | ActionKind::NoLynch
        )
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vote" => Ok(ActionKind::Vote),
            "double-vote" => Ok(ActionKind::DoubleVote),
            "no-lynch" => Ok(ActionKind::NoLynch),
            "kill" => Ok(ActionKind::Kill),
            "lynch" => Ok(ActionKind::Lynch),
            "visit" => Ok(ActionKind::Visit),
            "guard" => Ok(ActionKind::Guard),
            _ => Err(ParseError::unrecognized("action kind", s)),
        }
    }
}

/// A recorded player command. Only `retracted_in_post` ever changes, and only once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: i64,
    pub game_id: GameId,
    pub day: u32,
    pub post: PostNumber,
    pub player_id: Uuid,
    pub kind: ActionKind,
    pub target_id: Option<Uuid>,
    pub retracted_in_post: Option<PostNumber>,
    pub created_at: DateTime<Utc>,
}

impl Action {
    pub fn is_current(&self) -> bool {
        self.retracted_in_post.is_none()
    }

    pub fn is_vote_type(&self) -> bool {
        self.kind.is_vote_type()
    }
}

/// An action that has not been written to the log yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAction {
    pub game_id: GameId,
    pub day: u32,
    pub post: PostNumber,
    pub player_id: Uuid,
    pub kind: ActionKind,
    pub target_id: Option<Uuid>,
}

impl NewAction {
    /// True when `action` has the same (game, post, player, kind, target) identity.
    pub fn collides_with(&self, action: &Action) -> bool {
        self.game_id == action.game_id
            && self.post == action.post
            && self.player_id == action.player_id
            && self.kind == action.kind
            && self.target_id == action.target_id
    }

    pub fn into_action(self, id: i64, created_at: DateTime<Utc>) -> Action {
        Action {
            id,
            game_id: self.game_id,
            day: self.day,
            post: self.post,
            player_id: self.player_id,
            kind: self.kind,
            target_id: self.target_id,
            retracted_in_post: None,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_vote(post: PostNumber, target: Option<Uuid>) -> NewAction {
        NewAction {
            game_id: GameId::new(1),
            day: 1,
            post,
            player_id: Uuid::nil(),
            kind: ActionKind::Vote,
            target_id: target,
        }
    }

    #[test]
    fn test_vote_types() {
        assert!(ActionKind::Vote.is_vote_type());
        assert!(ActionKind::DoubleVote.is_vote_type());
        assert!(ActionKind::NoLynch.is_vote_type());
        assert!(!ActionKind::Kill.is_vote_type());
        assert!(!ActionKind::Lynch.is_vote_type());
        assert!(!ActionKind::Guard.is_vote_type());
    }

    #[test]
    fn test_collision_requires_full_identity() {
        let target = Uuid::new_v4();
        let recorded = new_vote(10, Some(target)).into_action(1, Utc::now());

        assert!(new_vote(10, Some(target)).collides_with(&recorded));
        assert!(!new_vote(11, Some(target)).collides_with(&recorded));
        assert!(!new_vote(10, None).collides_with(&recorded));
    }

    #[test]
    fn test_new_action_starts_current() {
        let action = new_vote(3, None).into_action(9, Utc::now());
        assert_eq!(action.id, 9);
        assert!(action.is_current());
    }

    #[test]
    fn test_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&ActionKind::DoubleVote).expect("Failed to serialize");
        assert_eq!(json, "\"double-vote\"");
        assert_eq!("no-lynch".parse::<ActionKind>(), Ok(ActionKind::NoLynch));
    }
}
