use thiserror::Error;
use types::{GameId, ParseError};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Query execution error: {0}")]
    Query(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Game not found: {0}")]
    GameNotFound(GameId),

    #[error("Invalid value in column {column}: {source}")]
    Decode {
        column: &'static str,
        #[source]
        source: ParseError,
    },

    #[error("UUID parsing error: {0}")]
    UuidParsing(#[from] uuid::Error),
}

impl DatabaseError {
    /// Unique constraint violations surface as `Duplicate`, everything else as `Query`.
    pub(crate) fn from_query(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DatabaseError::Duplicate(db_err.message().to_string())
            }
            _ => DatabaseError::Query(err.to_string()),
        }
    }

    pub(crate) fn decode(column: &'static str, source: ParseError) -> Self {
        DatabaseError::Decode { column, source }
    }
}
