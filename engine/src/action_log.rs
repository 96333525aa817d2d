//! Append-only record of player actions, one game-day at a time.

use std::collections::HashMap;

use database::StoreTransaction;
use types::{Action, ActionKind, Game, NewAction, PostNumber};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult, Missing, Rejection};

/// Writes `action`. The action must belong to the game's current day and must
/// not repeat an action already recorded in the same post.
pub async fn record_action(
    tx: &mut dyn StoreTransaction,
    game: &Game,
    action: NewAction,
) -> EngineResult<Action> {
    if action.day != game.day {
        return Err(Rejection::WrongDay {
            recorded: action.day,
            current: game.day,
        }
        .into());
    }

    let existing = tx.actions_for_day(game.id, action.day).await?;
    if existing.iter().any(|a| action.collides_with(a)) {
        return Err(EngineError::Conflict(format!(
            "{} by {} already recorded in post {}",
            action.kind, action.player_id, action.post
        )));
    }

    let recorded = tx.insert_action(&action).await?;
    log::debug!(
        "Recorded {} in post {} (game {}, day {})",
        recorded.kind,
        recorded.post,
        recorded.game_id,
        recorded.day
    );
    Ok(recorded)
}

/// Marks every action made in `post` as superseded by `retracting_post`.
/// Actions that were already retracted keep their original retraction.
pub async fn retract_action(
    tx: &mut dyn StoreTransaction,
    game: &Game,
    post: PostNumber,
    retracting_post: PostNumber,
) -> EngineResult<()> {
    if retracting_post < post {
        return Err(Rejection::RetractionBeforeAction {
            post,
            retracting: retracting_post,
        }
        .into());
    }

    let targets: Vec<Action> = tx
        .actions_for_game(game.id)
        .await?
        .into_iter()
        .filter(|a| a.post == post)
        .collect();
    if targets.is_empty() {
        return Err(EngineError::NotFound(Missing::Action {
            game: game.id,
            post,
        }));
    }

    for action in targets.iter().filter(|a| a.is_current()) {
        tx.retract_action(action.id, retracting_post).await?;
    }
    Ok(())
}

/// Non-retracted actions by `player` on `day`, optionally of a single kind.
pub async fn current_actions_for_player(
    tx: &mut dyn StoreTransaction,
    game: &Game,
    day: u32,
    player: Uuid,
    kind: Option<ActionKind>,
) -> EngineResult<Vec<Action>> {
    Ok(tx
        .actions_for_day(game.id, day)
        .await?
        .into_iter()
        .filter(|a| a.is_current() && a.player_id == player)
        .filter(|a| kind.map_or(true, |k| a.kind == k))
        .collect())
}

/// Every action recorded on `day`, oldest post first.
pub async fn all_actions_for_day(
    tx: &mut dyn StoreTransaction,
    game: &Game,
    day: u32,
) -> EngineResult<Vec<Action>> {
    Ok(tx.actions_for_day(game.id, day).await?)
}

/// The day each killed or lynched player died on.
pub async fn death_days(
    tx: &mut dyn StoreTransaction,
    game: &Game,
) -> EngineResult<HashMap<Uuid, u32>> {
    Ok(tx
        .actions_for_game(game.id)
        .await?
        .into_iter()
        .filter(|a| a.is_current() && matches!(a.kind, ActionKind::Kill | ActionKind::Lynch))
        .filter_map(|a| a.target_id.map(|target| (target, a.day)))
        .collect())
}

/// Retracts `player`'s current actions for today that `matches` selects,
/// returning how many were retracted.
pub async fn revoke_current(
    tx: &mut dyn StoreTransaction,
    game: &Game,
    player: Uuid,
    retracting_post: PostNumber,
    matches: impl Fn(ActionKind) -> bool + Send + Sync,
) -> EngineResult<usize> {
    let current = current_actions_for_player(tx, game, game.day, player, None).await?;
    let mut revoked = 0;
    for action in current.iter().filter(|a| matches(a.kind)) {
        if retracting_post < action.post {
            return Err(Rejection::RetractionBeforeAction {
                post: action.post,
                retracting: retracting_post,
            }
            .into());
        }
        tx.retract_action(action.id, retracting_post).await?;
        revoked += 1;
    }
    if revoked > 0 {
        log::debug!("Revoked {revoked} action(s) by {player} in post {retracting_post}");
    }
    Ok(revoked)
}
