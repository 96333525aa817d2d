use std::fmt::Display;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    /// Lower case, unique across all games.
    pub name: String,
    pub display_name: String,
}

impl Player {
    pub fn new(display_name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: canonical_name(display_name),
            display_name: strip_mention(display_name).to_string(),
        }
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name)
    }
}

/// Reduces a mention such as `@Bob!` to the lookup key `bob`.
pub fn canonical_name(raw: &str) -> String {
    strip_mention(raw).to_lowercase()
}

fn strip_mention(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches('@')
        .trim_end_matches(['.', '!', '?', ','])
}
