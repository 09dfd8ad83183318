use core::fmt;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Result as SqlxResult};
use tracing::instrument;

use crate::db::prelude::*;

pub mod duck;
pub mod leaderboard;
#[cfg(test)]
pub mod memory;

pub mod sql_fragment {
    pub const DUCK_FIELDS: &str = r#"
        id,
        owner_id,
        name,
        js,
        opt_xml,
        published,
        leaderboard_entry_id,
        created_at,
        updated_at
    "#;

    pub const ENTRY_FIELDS: &str = r#"
        id,
        leaderboard_key,
        ranking,
        duck_id,
        duck_owner_id
    "#;
}

#[async_trait]
pub trait Repository {
    type Ident: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + Sync + fmt::Debug;
    type Output: for<'r> sqlx::FromRow<'r, <Postgres as sqlx::Database>::Row>
        + Sized
        + Unpin
        + Send
        + fmt::Debug;

    const BASE_FIELDS: &'static str;
    const TABLE_NAME: &'static str;

    fn new(pool: &'static Pool<Postgres>) -> Self
    where
        Self: Sized;

    fn pool(&self) -> &'static Pool<Postgres>;

    #[instrument(skip(self, id))]
    async fn get_by_id(&self, id: &Self::Ident) -> SqlxResult<Option<Self::Output>> {
        sqlx::query_as::<_, Self::Output>(&format!(
            "SELECT {} FROM {} WHERE id = $1",
            Self::BASE_FIELDS,
            Self::TABLE_NAME
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
    }
}

/// Postgres-backed [`DuckStore`].
pub struct PgPond {
    ducks: DuckRepository,
    entries: EntryRepository,
}

impl PgPond {
    pub fn new(pool: &'static Pool<Postgres>) -> Self {
        Self {
            ducks: DuckRepository::new(pool),
            entries: EntryRepository::new(pool),
        }
    }
}

#[async_trait]
impl DuckStore for PgPond {
    async fn get_duck(&self, key: &DuckKey) -> StoreResult<Option<Duck>> {
        match self.ducks.get_by_id(&key.id).await? {
            // a key naming the wrong ancestor doesn't resolve, same as an unknown id
            Some(row) if row.owner_id == key.owner => Ok(Some(Duck::try_from(row)?)),
            _ => Ok(None),
        }
    }

    async fn ducks_by_owner(&self, owner: &UserKey) -> StoreResult<Vec<Duck>> {
        self.ducks
            .get_by_owner(owner)
            .await?
            .into_iter()
            .map(|row| Duck::try_from(row).map_err(StoreError::from))
            .collect()
    }

    async fn get_entry(&self, id: &EntryId) -> StoreResult<Option<LeaderboardEntry>> {
        match self.entries.get_by_id(id).await? {
            Some(row) => Ok(Some(LeaderboardEntry::try_from(row)?)),
            None => Ok(None),
        }
    }

    async fn top_entries(
        &self,
        leaderboard_key: &str,
        count: i64,
    ) -> StoreResult<Vec<LeaderboardEntry>> {
        self.entries
            .get_ranked_range(leaderboard_key, 1, count)
            .await?
            .into_iter()
            .map(|row| LeaderboardEntry::try_from(row).map_err(StoreError::from))
            .collect()
    }
}
