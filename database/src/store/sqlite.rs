use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};
use types::{
    Action, Game, GameId, NewAction, Player, PlayerStatus, PostNumber, RosterEntry, RosterMember,
};
use uuid::Uuid;

use super::{GameStore, StoreTransaction};
use crate::models::{
    action_from_row, game_from_row, player_from_row, roster_entry_from_row,
    roster_member_from_row,
};
use crate::DatabaseError;

const ROSTER_MEMBER_COLUMNS: &str = "r.game_id, r.player_id, r.status, r.vote_weight, \
     r.lynch_modifier, p.name, p.display_name";

const ACTION_COLUMNS: &str =
    "id, game_id, day, post, player_id, kind, target_id, retracted_in_post, created_at";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl GameStore for SqliteStore {
    /// Takes the write lock up front. A deferred transaction that reads first
    /// cannot be upgraded while another connection writes, and fails with
    /// `SQLITE_BUSY` instead of waiting.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, DatabaseError> {
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| DatabaseError::Transaction(e.to_string()))?;
        Ok(Box::new(SqliteTransaction { tx }))
    }

    async fn begin_read(&self) -> Result<Box<dyn StoreTransaction>, DatabaseError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Transaction(e.to_string()))?;
        Ok(Box::new(SqliteTransaction { tx }))
    }
}

pub struct SqliteTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl StoreTransaction for SqliteTransaction {
    async fn game(&mut self, id: GameId) -> Result<Option<Game>, DatabaseError> {
        let row = sqlx::query("SELECT id, name, status, day, time_of_day FROM games WHERE id = ?")
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(DatabaseError::from_query)?;

        row.as_ref().map(game_from_row).transpose()
    }

    async fn game_by_name(&mut self, name: &str) -> Result<Option<Game>, DatabaseError> {
        let row =
            sqlx::query("SELECT id, name, status, day, time_of_day FROM games WHERE name = ?")
                .bind(name)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(DatabaseError::from_query)?;

        row.as_ref().map(game_from_row).transpose()
    }

    async fn insert_game(&mut self, game: &Game) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO games (id, name, status, day, time_of_day) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(game.id.as_i64())
        .bind(&game.name)
        .bind(game.status.as_str())
        .bind(game.day)
        .bind(game.time_of_day.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::from_query)?;
        Ok(())
    }

    async fn update_game(&mut self, game: &Game) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE games SET name = ?, status = ?, day = ?, time_of_day = ? WHERE id = ?",
        )
        .bind(&game.name)
        .bind(game.status.as_str())
        .bind(game.day)
        .bind(game.time_of_day.as_str())
        .bind(game.id.as_i64())
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::from_query)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::GameNotFound(game.id));
        }
        Ok(())
    }

    async fn find_or_create_player(&mut self, display_name: &str) -> Result<Player, DatabaseError> {
        let candidate = Player::new(display_name);
        sqlx::query("INSERT OR IGNORE INTO players (id, name, display_name) VALUES (?, ?, ?)")
            .bind(candidate.id.to_string())
            .bind(&candidate.name)
            .bind(&candidate.display_name)
            .execute(&mut *self.tx)
            .await
            .map_err(DatabaseError::from_query)?;

        self.player_by_name(&candidate.name)
            .await?
            .ok_or(DatabaseError::PlayerNotFound(candidate.name))
    }

    async fn player_by_name(&mut self, name: &str) -> Result<Option<Player>, DatabaseError> {
        let row = sqlx::query("SELECT id, name, display_name FROM players WHERE name = ?")
            .bind(name.to_lowercase())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(DatabaseError::from_query)?;

        row.as_ref().map(player_from_row).transpose()
    }

    async fn player_by_id(&mut self, id: Uuid) -> Result<Option<Player>, DatabaseError> {
        let row = sqlx::query("SELECT id, name, display_name FROM players WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(DatabaseError::from_query)?;

        row.as_ref().map(player_from_row).transpose()
    }

    async fn roster_entry(
        &mut self,
        game: GameId,
        player: Uuid,
    ) -> Result<Option<RosterEntry>, DatabaseError> {
        let row = sqlx::query(
            "SELECT game_id, player_id, status, vote_weight, lynch_modifier
             FROM roster WHERE game_id = ? AND player_id = ?",
        )
        .bind(game.as_i64())
        .bind(player.to_string())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(DatabaseError::from_query)?;

        row.as_ref().map(roster_entry_from_row).transpose()
    }

    async fn find_or_create_roster_entry(
        &mut self,
        game: GameId,
        player: Uuid,
        status: PlayerStatus,
    ) -> Result<RosterEntry, DatabaseError> {
        let entry = RosterEntry::new(game, player, status);
        sqlx::query(
            "INSERT OR IGNORE INTO roster (game_id, player_id, status, vote_weight, lynch_modifier)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(game.as_i64())
        .bind(player.to_string())
        .bind(entry.status.as_str())
        .bind(entry.vote_weight)
        .bind(entry.lynch_modifier.value())
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::from_query)?;

        self.roster_entry(game, player)
            .await?
            .ok_or_else(|| DatabaseError::PlayerNotFound(player.to_string()))
    }

    async fn update_roster_entry(&mut self, entry: &RosterEntry) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE roster SET status = ?, vote_weight = ?, lynch_modifier = ?
             WHERE game_id = ? AND player_id = ?",
        )
        .bind(entry.status.as_str())
        .bind(entry.vote_weight)
        .bind(entry.lynch_modifier.value())
        .bind(entry.game_id.as_i64())
        .bind(entry.player_id.to_string())
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::from_query)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::PlayerNotFound(entry.player_id.to_string()));
        }
        Ok(())
    }

    async fn roster(
        &mut self,
        game: GameId,
        status: Option<PlayerStatus>,
    ) -> Result<Vec<RosterMember>, DatabaseError> {
        let sql = format!(
            "SELECT {ROSTER_MEMBER_COLUMNS} FROM roster r JOIN players p ON p.id = r.player_id
             WHERE r.game_id = ? AND (? IS NULL OR r.status = ?)
             ORDER BY r.id"
        );
        let status = status.map(|s| s.as_str());
        let rows = sqlx::query(&sql)
            .bind(game.as_i64())
            .bind(status)
            .bind(status)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(DatabaseError::from_query)?;

        rows.iter().map(roster_member_from_row).collect()
    }

    async fn insert_action(&mut self, action: &NewAction) -> Result<Action, DatabaseError> {
        let created_at = chrono::Utc::now();
        let result = sqlx::query(
            "INSERT INTO actions (game_id, day, post, player_id, kind, target_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(action.game_id.as_i64())
        .bind(action.day)
        .bind(action.post)
        .bind(action.player_id.to_string())
        .bind(action.kind.as_str())
        .bind(action.target_id.map(|id| id.to_string()))
        .bind(created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::from_query)?;

        Ok(action
            .clone()
            .into_action(result.last_insert_rowid(), created_at))
    }

    async fn retract_action(
        &mut self,
        action_id: i64,
        retracted_in_post: PostNumber,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE actions SET retracted_in_post = ? WHERE id = ? AND retracted_in_post IS NULL",
        )
        .bind(retracted_in_post)
        .bind(action_id)
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::from_query)?;

        tracing::debug!(
            action_id,
            retracted_in_post,
            changed = result.rows_affected(),
            "Retracted action"
        );
        Ok(())
    }

    async fn actions_for_day(&mut self, game: GameId, day: u32) -> Result<Vec<Action>, DatabaseError> {
        let sql = format!(
            "SELECT {ACTION_COLUMNS} FROM actions WHERE game_id = ? AND day = ? ORDER BY post, id"
        );
        let rows = sqlx::query(&sql)
            .bind(game.as_i64())
            .bind(day)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(DatabaseError::from_query)?;

        rows.iter().map(action_from_row).collect()
    }

    async fn actions_for_game(&mut self, game: GameId) -> Result<Vec<Action>, DatabaseError> {
        let sql = format!("SELECT {ACTION_COLUMNS} FROM actions WHERE game_id = ? ORDER BY post, id");
        let rows = sqlx::query(&sql)
            .bind(game.as_i64())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(DatabaseError::from_query)?;

        rows.iter().map(action_from_row).collect()
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        self.tx
            .commit()
            .await
            .map_err(|e| DatabaseError::Transaction(e.to_string()))
    }
}
