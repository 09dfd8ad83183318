use std::sync::LazyLock;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::util::env::Env;

pub mod models;
pub mod pg;
pub mod repositories;

pub mod prelude {
    pub use crate::db::DuckStore;
    pub use crate::db::db_pool;
    pub use crate::db::{StoreError, StoreResult};

    pub use crate::db::models::duck::{Duck, DuckCode, DuckInfo};
    pub use crate::db::models::key::{DuckKey, EntryId, KeyError, UserKey};
    pub use crate::db::models::leaderboard::LeaderboardEntry;

    pub use crate::db::repositories::PgPond;
    pub use crate::db::repositories::Repository;
    pub use crate::db::repositories::duck::DuckRepository;
    pub use crate::db::repositories::leaderboard::EntryRepository;
}

use prelude::*;

static DB_POOL: LazyLock<OnceCell<Db>> = LazyLock::new(OnceCell::new);
pub async fn db_pool(env: &Env) -> StoreResult<&'static PgPool> {
    Ok(&DB_POOL
        .get_or_try_init(|| async { Db::new_pool(&env.database_url).await })
        .await?
        .pool)
}

struct Db {
    pool: PgPool,
}

impl Db {
    pub async fn new_pool(db_url: &str) -> StoreResult<Self> {
        let pool = sqlx::PgPool::connect(db_url).await?;
        pg::init_schema(&pool).await?;

        Ok(Self { pool })
    }
}

/// Read access to ducks and leaderboard entries.
///
/// Writes belong to the publishing flow and never go through this trait.
#[async_trait]
pub trait DuckStore: Send + Sync {
    async fn get_duck(&self, key: &DuckKey) -> StoreResult<Option<Duck>>;

    /// Every duck with `owner` as its ancestor, published or not, oldest first.
    async fn ducks_by_owner(&self, owner: &UserKey) -> StoreResult<Vec<Duck>>;

    async fn get_entry(&self, id: &EntryId) -> StoreResult<Option<LeaderboardEntry>>;

    /// Entries of `leaderboard_key` ranked within `1..=count`, best first.
    async fn top_entries(
        &self,
        leaderboard_key: &str,
        count: i64,
    ) -> StoreResult<Vec<LeaderboardEntry>>;
}

pub type StoreResult<T> = core::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    SqlxError(#[from] sqlx::Error),

    #[error("corrupt key in storage: {0}")]
    CorruptKey(#[from] KeyError),
}
