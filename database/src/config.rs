use std::{str::FromStr, time::Duration};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::retry::{retry_with_backoff, RetryFuture};
use crate::DatabaseError;

pub const MEMORY_URL: &str = "sqlite::memory:";

/// How long a writer waits for another connection's write transaction.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub connect_retries: usize,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pool_size: 5,
            connect_retries: 3,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MEMORY_URL)
    }

    pub fn from_cli_or_env_or_yaml(cli_arg: Option<String>, yaml_config: Option<String>) -> Self {
        let url = if let Some(arg) = cli_arg {
            arg
        } else if let Ok(env) = std::env::var("DATABASE_URL") {
            env
        } else if let Some(yaml) = yaml_config {
            yaml
        } else {
            MEMORY_URL.to_string()
        };

        Self::new(url)
    }

    pub fn is_memory(&self) -> bool {
        matches!(self.url.as_str(), MEMORY_URL | ":memory:")
    }

    fn connect_options(&self) -> Result<SqliteConnectOptions, DatabaseError> {
        if self.is_memory() {
            return SqliteConnectOptions::from_str(MEMORY_URL)
                .map_err(|e| DatabaseError::Connection(e.to_string()));
        }
        let options = if self.url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(&self.url)
                .map_err(|e| DatabaseError::Connection(e.to_string()))?
        } else {
            SqliteConnectOptions::new().filename(&self.url)
        };
        // WAL lets list commands read while another game writes.
        Ok(options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT))
    }

    /// An in-memory database lives and dies with its connection, so it gets exactly one.
    pub async fn create_pool(&self) -> Result<SqlitePool, DatabaseError> {
        let options = self.connect_options()?;
        let pool_options = if self.is_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(self.pool_size)
        };

        retry_with_backoff(
            move || -> RetryFuture<SqlitePool, sqlx::Error> {
                let options = options.clone();
                let pool_options = pool_options.clone();
                Box::pin(async move { pool_options.connect_with(options).await })
            },
            self.connect_retries,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| DatabaseError::Connection(e.to_string()))
    }
}
