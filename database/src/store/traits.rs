use async_trait::async_trait;
use types::{Action, Game, GameId, NewAction, Player, PlayerStatus, PostNumber, RosterEntry, RosterMember};
use uuid::Uuid;

use crate::DatabaseError;

/// Entry point to persistence. Every engine command runs inside one transaction.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Opens a transaction that may write.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, DatabaseError>;

    /// Opens a transaction that only reads.
    async fn begin_read(&self) -> Result<Box<dyn StoreTransaction>, DatabaseError> {
        self.begin().await
    }
}

/// A unit of work against the store. Dropping it without `commit` discards every write.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn game(&mut self, id: GameId) -> Result<Option<Game>, DatabaseError>;
    async fn game_by_name(&mut self, name: &str) -> Result<Option<Game>, DatabaseError>;
    async fn insert_game(&mut self, game: &Game) -> Result<(), DatabaseError>;
    async fn update_game(&mut self, game: &Game) -> Result<(), DatabaseError>;

    /// Looks the player up by lower-cased name, creating them on first reference.
    async fn find_or_create_player(&mut self, display_name: &str) -> Result<Player, DatabaseError>;
    async fn player_by_name(&mut self, name: &str) -> Result<Option<Player>, DatabaseError>;
    async fn player_by_id(&mut self, id: Uuid) -> Result<Option<Player>, DatabaseError>;

    async fn roster_entry(
        &mut self,
        game: GameId,
        player: Uuid,
    ) -> Result<Option<RosterEntry>, DatabaseError>;
    /// Returns the existing entry untouched if the player is already on the roster.
    async fn find_or_create_roster_entry(
        &mut self,
        game: GameId,
        player: Uuid,
        status: PlayerStatus,
    ) -> Result<RosterEntry, DatabaseError>;
    async fn update_roster_entry(&mut self, entry: &RosterEntry) -> Result<(), DatabaseError>;
    /// Roster members in the order they were added, optionally filtered by status.
    async fn roster(
        &mut self,
        game: GameId,
        status: Option<PlayerStatus>,
    ) -> Result<Vec<RosterMember>, DatabaseError>;

    async fn insert_action(&mut self, action: &NewAction) -> Result<Action, DatabaseError>;
    /// Sets `retracted_in_post` if it is still empty; an already retracted action is left alone.
    async fn retract_action(
        &mut self,
        action_id: i64,
        retracted_in_post: PostNumber,
    ) -> Result<(), DatabaseError>;
    /// Ordered by post, then insertion.
    async fn actions_for_day(&mut self, game: GameId, day: u32) -> Result<Vec<Action>, DatabaseError>;
    /// Ordered by post, then insertion.
    async fn actions_for_game(&mut self, game: GameId) -> Result<Vec<Action>, DatabaseError>;

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError>;
}
