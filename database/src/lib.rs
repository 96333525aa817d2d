pub mod config;
pub mod error;
mod models;
pub mod retry;
pub mod store;


pub use config::DatabaseConfig;
pub use error::DatabaseError;
pub use retry::retry_with_backoff;
pub use store::{GameStore, MemoryStore, SqliteStore, StoreTransaction};
