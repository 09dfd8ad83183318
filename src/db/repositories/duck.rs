use async_trait::async_trait;
use sqlx::{Pool, Postgres, Result as SqlxResult};
use tracing::instrument;
use uuid::Uuid;

use super::sql_fragment::DUCK_FIELDS;
use crate::db::models::duck::DuckRow;
use crate::db::prelude::{Repository, UserKey};

pub struct DuckRepository {
    pool: &'static Pool<Postgres>,
}

#[async_trait]
impl Repository for DuckRepository {
    type Ident = Uuid;
    type Output = DuckRow;

    const BASE_FIELDS: &'static str = DUCK_FIELDS;
    const TABLE_NAME: &'static str = "duck";

    fn new(pool: &'static Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &'static Pool<Postgres> {
        self.pool
    }
}

impl DuckRepository {
    /// Ancestor query over a user's ducks.
    #[instrument(skip(self))]
    pub async fn get_by_owner(&self, owner: &UserKey) -> SqlxResult<Vec<DuckRow>> {
        sqlx::query_as::<_, DuckRow>(&format!(
            "SELECT {} FROM {} WHERE owner_id = $1 ORDER BY created_at ASC, id ASC",
            Self::BASE_FIELDS,
            Self::TABLE_NAME,
        ))
        .bind(owner)
        .fetch_all(self.pool)
        .await
    }
}
