use sqlx::PgPool;
use tracing::instrument;

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS duck (
        id UUID PRIMARY KEY,
        owner_id TEXT NOT NULL,
        name TEXT NOT NULL,
        js TEXT NOT NULL,
        opt_xml TEXT,
        published BOOLEAN NOT NULL DEFAULT FALSE,
        leaderboard_entry_id UUID,
        created_at TIMESTAMP NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS leaderboard_entry (
        id UUID PRIMARY KEY,
        leaderboard_key TEXT NOT NULL,
        ranking BIGINT NOT NULL CHECK (ranking >= 1),
        duck_id UUID NOT NULL REFERENCES duck (id) ON DELETE CASCADE,
        duck_owner_id TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS duck_owner_idx ON duck (owner_id, created_at)",
    "CREATE INDEX IF NOT EXISTS leaderboard_rank_idx ON leaderboard_entry (leaderboard_key, ranking)",
];

/// Creates the duck + leaderboard tables if they don't exist yet.
#[instrument(skip(pool))]
pub async fn init_schema(pool: &PgPool) -> sqlx::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::debug!("pond schema ready");
    Ok(())
}
