use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use types::GameId;

/// One async mutex per game. Commands for the same game queue up behind each
/// other; different games never wait on one another.
#[derive(Clone, Default)]
pub struct GameLocks {
    games: Arc<Mutex<HashMap<GameId, Arc<Mutex<()>>>>>,
}

impl GameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn get_or_create(&self, game: GameId) -> Arc<Mutex<()>> {
        let mut games = self.games.lock().await;
        games.entry(game).or_default().clone()
    }

    /// Held for the whole of one command's transaction.
    pub async fn acquire(&self, game: GameId) -> OwnedMutexGuard<()> {
        self.get_or_create(game).await.lock_owned().await
    }

    /// Forgets `game`'s mutex unless a command is holding or waiting on it.
    pub async fn release(&self, game: GameId) {
        let mut games = self.games.lock().await;
        if games.get(&game).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            games.remove(&game);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_game_waits() {
        let locks = GameLocks::new();
        let guard = locks.acquire(GameId::new(1)).await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move { contender.acquire(GameId::new(1)).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .expect("Lock should be released")
            .expect("Task should not panic");
    }

    #[tokio::test]
    async fn test_other_games_proceed() {
        let locks = GameLocks::new();
        let _held = locks.acquire(GameId::new(1)).await;

        tokio::time::timeout(Duration::from_secs(1), locks.acquire(GameId::new(2)))
            .await
            .expect("Different game should not block");
    }

    #[tokio::test]
    async fn test_release_skips_busy_games() {
        let locks = GameLocks::new();
        drop(locks.acquire(GameId::new(1)).await);
        let held = locks.acquire(GameId::new(2)).await;

        locks.release(GameId::new(1)).await;
        locks.release(GameId::new(2)).await;

        let games = locks.games.lock().await;
        assert!(!games.contains_key(&GameId::new(1)));
        assert!(games.contains_key(&GameId::new(2)));
        drop(held);
    }
}
