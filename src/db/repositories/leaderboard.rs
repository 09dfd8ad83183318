use async_trait::async_trait;
use sqlx::{Pool, Postgres, Result as SqlxResult};
use tracing::instrument;

use super::sql_fragment::ENTRY_FIELDS;
use crate::db::models::leaderboard::EntryRow;
use crate::db::prelude::{EntryId, Repository};

pub struct EntryRepository {
    pool: &'static Pool<Postgres>,
}

#[async_trait]
impl Repository for EntryRepository {
    type Ident = EntryId;
    type Output = EntryRow;

    const BASE_FIELDS: &'static str = ENTRY_FIELDS;
    const TABLE_NAME: &'static str = "leaderboard_entry";

    fn new(pool: &'static Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &'static Pool<Postgres> {
        self.pool
    }
}

impl EntryRepository {
    /// Entries on `leaderboard_key` with `lowest <= ranking <= highest`, ordered by ranking.
    ///
    /// Ties on ranking are broken by id so repeated reads come back in the same order.
    #[instrument(skip(self))]
    pub async fn get_ranked_range(
        &self,
        leaderboard_key: &str,
        lowest: i64,
        highest: i64,
    ) -> SqlxResult<Vec<EntryRow>> {
        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            r#"
            SELECT {} FROM {}
            WHERE leaderboard_key = $1
            AND ranking >= $2
            AND ranking <= $3
            ORDER BY ranking ASC, id ASC
            "#,
            Self::BASE_FIELDS,
            Self::TABLE_NAME,
        ))
        .bind(leaderboard_key)
        .bind(lowest)
        .bind(highest)
        .fetch_all(self.pool)
        .await;

        if let Err(e) = &rows {
            tracing::error!(error = ?e, leaderboard_key, "ranked range query failure");
        }

        rows
    }
}
