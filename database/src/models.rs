//! Translation between SQLite rows and the domain structs in `types`.

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use types::{
    Action, ActionKind, Game, GameId, GameStatus, LynchModifier, Player, PlayerStatus,
    RosterEntry, RosterMember, TimeOfDay,
};
use uuid::Uuid;

use crate::DatabaseError;

fn column<'r, T>(row: &'r SqliteRow, name: &'static str) -> Result<T, DatabaseError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| DatabaseError::Query(format!("column {name}: {e}")))
}

fn uuid_column(row: &SqliteRow, name: &'static str) -> Result<Uuid, DatabaseError> {
    let raw: String = column(row, name)?;
    Ok(Uuid::parse_str(&raw)?)
}

pub(crate) fn game_from_row(row: &SqliteRow) -> Result<Game, DatabaseError> {
    let status: String = column(row, "status")?;
    let time_of_day: String = column(row, "time_of_day")?;
    Ok(Game {
        id: GameId::new(column(row, "id")?),
        name: column(row, "name")?,
        status: status
            .parse::<GameStatus>()
            .map_err(|e| DatabaseError::decode("games.status", e))?,
        day: column(row, "day")?,
        time_of_day: time_of_day
            .parse::<TimeOfDay>()
            .map_err(|e| DatabaseError::decode("games.time_of_day", e))?,
    })
}

pub(crate) fn player_from_row(row: &SqliteRow) -> Result<Player, DatabaseError> {
    Ok(Player {
        id: uuid_column(row, "id")?,
        name: column(row, "name")?,
        display_name: column(row, "display_name")?,
    })
}

pub(crate) fn roster_entry_from_row(row: &SqliteRow) -> Result<RosterEntry, DatabaseError> {
    let status: String = column(row, "status")?;
    let lynch_modifier: i64 = column(row, "lynch_modifier")?;
    Ok(RosterEntry {
        game_id: GameId::new(column(row, "game_id")?),
        player_id: uuid_column(row, "player_id")?,
        status: status
            .parse::<PlayerStatus>()
            .map_err(|e| DatabaseError::decode("roster.status", e))?,
        vote_weight: column(row, "vote_weight")?,
        lynch_modifier: LynchModifier::from_value(lynch_modifier)
            .map_err(|e| DatabaseError::decode("roster.lynch_modifier", e))?,
    })
}

/// Expects the roster columns plus `name` and `display_name` from `players`.
pub(crate) fn roster_member_from_row(row: &SqliteRow) -> Result<RosterMember, DatabaseError> {
    let entry = roster_entry_from_row(row)?;
    let player = Player {
        id: entry.player_id,
        name: column(row, "name")?,
        display_name: column(row, "display_name")?,
    };
    Ok(RosterMember { entry, player })
}

pub(crate) fn action_from_row(row: &SqliteRow) -> Result<Action, DatabaseError> {
    let kind: String = column(row, "kind")?;
    let target_id: Option<String> = column(row, "target_id")?;
    let created_at: DateTime<Utc> = column(row, "created_at")?;
    Ok(Action {
        id: column(row, "id")?,
        game_id: GameId::new(column(row, "game_id")?),
        day: column(row, "day")?,
        post: column(row, "post")?,
        player_id: uuid_column(row, "player_id")?,
        kind: kind
            .parse::<ActionKind>()
            .map_err(|e| DatabaseError::decode("actions.kind", e))?,
        target_id: target_id.as_deref().map(Uuid::parse_str).transpose()?,
        retracted_in_post: column(row, "retracted_in_post")?,
        created_at,
    })
}
