use uuid::Uuid;

use super::key::{DuckKey, EntryId, KeyError, UserKey};

/// A duck's position within a named leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub id: EntryId,
    pub leaderboard_key: String,
    pub ranking: i64,
    pub duck_key: DuckKey,
}

/// Base leaderboard_entry table model
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EntryRow {
    pub id: EntryId,
    pub leaderboard_key: String,
    pub ranking: i64,
    pub duck_id: Uuid,
    pub duck_owner_id: UserKey,
}

impl TryFrom<EntryRow> for LeaderboardEntry {
    type Error = KeyError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            leaderboard_key: row.leaderboard_key,
            ranking: row.ranking,
            duck_key: DuckKey {
                owner: UserKey::parse(row.duck_owner_id.as_str())?,
                id: row.duck_id,
            },
        })
    }
}
