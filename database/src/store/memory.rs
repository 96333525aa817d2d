use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use types::{
    Action, Game, GameId, NewAction, Player, PlayerStatus, PostNumber, RosterEntry, RosterMember,
};
use uuid::Uuid;

use super::{GameStore, StoreTransaction};
use crate::DatabaseError;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    games: BTreeMap<GameId, Game>,
    players: Vec<Player>,
    roster: Vec<RosterEntry>,
    actions: Vec<Action>,
    next_action_id: i64,
}

impl MemoryState {
    fn player(&self, id: Uuid) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    fn roster_position(&self, game: GameId, player: Uuid) -> Option<usize> {
        self.roster
            .iter()
            .position(|r| r.game_id == game && r.player_id == player)
    }

    fn sorted_actions(&self, keep: impl Fn(&Action) -> bool) -> Vec<Action> {
        let mut actions: Vec<Action> = self.actions.iter().filter(|a| keep(a)).cloned().collect();
        actions.sort_by_key(|a| (a.post, a.id));
        actions
    }
}

/// Store kept entirely in process memory. Transactions are serialized: the
/// whole state is locked for as long as a transaction is alive.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, DatabaseError> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, staged }))
    }
}

/// Writes go to `staged`; `commit` swaps it into the shared state.
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn game(&mut self, id: GameId) -> Result<Option<Game>, DatabaseError> {
        Ok(self.staged.games.get(&id).cloned())
    }

    async fn game_by_name(&mut self, name: &str) -> Result<Option<Game>, DatabaseError> {
        Ok(self
            .staged
            .games
            .values()
            .find(|g| g.name.as_deref() == Some(name))
            .cloned())
    }

    async fn insert_game(&mut self, game: &Game) -> Result<(), DatabaseError> {
        if self.staged.games.contains_key(&game.id) {
            return Err(DatabaseError::Duplicate(format!("game {}", game.id)));
        }
        if let Some(name) = &game.name {
            if self.game_by_name(name).await?.is_some() {
                return Err(DatabaseError::Duplicate(format!("game name {name}")));
            }
        }
        self.staged.games.insert(game.id, game.clone());
        Ok(())
    }

    async fn update_game(&mut self, game: &Game) -> Result<(), DatabaseError> {
        match self.staged.games.get_mut(&game.id) {
            Some(existing) => {
                *existing = game.clone();
                Ok(())
            }
            None => Err(DatabaseError::GameNotFound(game.id)),
        }
    }

    async fn find_or_create_player(&mut self, display_name: &str) -> Result<Player, DatabaseError> {
        let candidate = Player::new(display_name);
        if let Some(existing) = self.player_by_name(&candidate.name).await? {
            return Ok(existing);
        }
        self.staged.players.push(candidate.clone());
        Ok(candidate)
    }

    async fn player_by_name(&mut self, name: &str) -> Result<Option<Player>, DatabaseError> {
        let name = name.to_lowercase();
        Ok(self.staged.players.iter().find(|p| p.name == name).cloned())
    }

    async fn player_by_id(&mut self, id: Uuid) -> Result<Option<Player>, DatabaseError> {
        Ok(self.staged.player(id).cloned())
    }

    async fn roster_entry(
        &mut self,
        game: GameId,
        player: Uuid,
    ) -> Result<Option<RosterEntry>, DatabaseError> {
        Ok(self
            .staged
            .roster_position(game, player)
            .map(|idx| self.staged.roster[idx].clone()))
    }

    async fn find_or_create_roster_entry(
        &mut self,
        game: GameId,
        player: Uuid,
        status: PlayerStatus,
    ) -> Result<RosterEntry, DatabaseError> {
        if let Some(existing) = self.roster_entry(game, player).await? {
            return Ok(existing);
        }
        if self.staged.player(player).is_none() {
            return Err(DatabaseError::PlayerNotFound(player.to_string()));
        }
        let entry = RosterEntry::new(game, player, status);
        self.staged.roster.push(entry.clone());
        Ok(entry)
    }

    async fn update_roster_entry(&mut self, entry: &RosterEntry) -> Result<(), DatabaseError> {
        let idx = self
            .staged
            .roster_position(entry.game_id, entry.player_id)
            .ok_or_else(|| DatabaseError::PlayerNotFound(entry.player_id.to_string()))?;
        self.staged.roster[idx] = entry.clone();
        Ok(())
    }

    async fn roster(
        &mut self,
        game: GameId,
        status: Option<PlayerStatus>,
    ) -> Result<Vec<RosterMember>, DatabaseError> {
        self.staged
            .roster
            .iter()
            .filter(|r| r.game_id == game && status.map_or(true, |s| r.status == s))
            .map(|entry| {
                let player = self
                    .staged
                    .player(entry.player_id)
                    .cloned()
                    .ok_or_else(|| DatabaseError::PlayerNotFound(entry.player_id.to_string()))?;
                Ok(RosterMember {
                    entry: entry.clone(),
                    player,
                })
            })
            .collect()
    }

    async fn insert_action(&mut self, action: &NewAction) -> Result<Action, DatabaseError> {
        if self.staged.actions.iter().any(|a| action.collides_with(a)) {
            return Err(DatabaseError::Duplicate(format!(
                "{} by {} in post {}",
                action.kind, action.player_id, action.post
            )));
        }
        self.staged.next_action_id += 1;
        let recorded = action
            .clone()
            .into_action(self.staged.next_action_id, Utc::now());
        self.staged.actions.push(recorded.clone());
        Ok(recorded)
    }

    async fn retract_action(
        &mut self,
        action_id: i64,
        retracted_in_post: PostNumber,
    ) -> Result<(), DatabaseError> {
        if let Some(action) = self
            .staged
            .actions
            .iter_mut()
            .find(|a| a.id == action_id && a.retracted_in_post.is_none())
        {
            if retracted_in_post < action.post {
                return Err(DatabaseError::Query(format!(
                    "action {action_id} cannot be retracted before post {}",
                    action.post
                )));
            }
            action.retracted_in_post = Some(retracted_in_post);
        }
        Ok(())
    }

    async fn actions_for_day(&mut self, game: GameId, day: u32) -> Result<Vec<Action>, DatabaseError> {
        Ok(self
            .staged
            .sorted_actions(|a| a.game_id == game && a.day == day))
    }

    async fn actions_for_game(&mut self, game: GameId) -> Result<Vec<Action>, DatabaseError> {
        Ok(self.staged.sorted_actions(|a| a.game_id == game))
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        let MemoryTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ActionKind;

    fn vote(game: GameId, post: PostNumber, player: Uuid, target: Uuid) -> NewAction {
        NewAction {
            game_id: game,
            day: 1,
            post,
            player_id: player,
            kind: ActionKind::Vote,
            target_id: Some(target),
        }
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = MemoryStore::new();
        let game = Game::new(GameId::new(7), Some("Dropped".to_string()));

        {
            let mut tx = store.begin().await.expect("Failed to begin");
            tx.insert_game(&game).await.expect("Failed to insert game");
        }

        let mut tx = store.begin().await.expect("Failed to begin");
        assert!(tx.game(game.id).await.expect("Failed to read").is_none());
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = MemoryStore::new();
        let game = Game::new(GameId::new(8), None);

        let mut tx = store.begin().await.expect("Failed to begin");
        tx.insert_game(&game).await.expect("Failed to insert game");
        tx.commit().await.expect("Failed to commit");

        let mut tx = store.begin().await.expect("Failed to begin");
        assert_eq!(tx.game(game.id).await.expect("Failed to read"), Some(game));
    }

    #[tokio::test]
    async fn test_duplicate_action_identity_rejected() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.expect("Failed to begin");
        let game = GameId::new(1);
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        tx.insert_action(&vote(game, 10, alice, bob))
            .await
            .expect("Failed to insert");
        let err = tx
            .insert_action(&vote(game, 10, alice, bob))
            .await
            .expect_err("Duplicate should fail");
        assert!(matches!(err, DatabaseError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_retraction_is_write_once() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.expect("Failed to begin");
        let game = GameId::new(1);
        let action = tx
            .insert_action(&vote(game, 10, Uuid::new_v4(), Uuid::new_v4()))
            .await
            .expect("Failed to insert");

        tx.retract_action(action.id, 12).await.expect("Failed to retract");
        tx.retract_action(action.id, 20).await.expect("Second retract is a no-op");

        let actions = tx.actions_for_day(game, 1).await.expect("Failed to list");
        assert_eq!(actions[0].retracted_in_post, Some(12));
    }

    #[tokio::test]
    async fn test_roster_keeps_insertion_order_and_filters() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.expect("Failed to begin");
        let game = GameId::new(3);

        for (name, status) in [
            ("Zed", PlayerStatus::Alive),
            ("Amy", PlayerStatus::Mod),
            ("Bo", PlayerStatus::Alive),
        ] {
            let player = tx.find_or_create_player(name).await.expect("player");
            tx.find_or_create_roster_entry(game, player.id, status)
                .await
                .expect("roster entry");
        }

        let alive: Vec<String> = tx
            .roster(game, Some(PlayerStatus::Alive))
            .await
            .expect("roster")
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(alive, vec!["zed", "bo"]);
        assert_eq!(tx.roster(game, None).await.expect("roster").len(), 3);
    }
}
