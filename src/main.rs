use std::sync::Arc;

use thiserror::Error;

use crate::api::server::{AppState, start_server};
use crate::db::prelude::{PgPond, StoreError, db_pool};
use crate::util::env::{self, EnvErr};
use crate::util::telemetry::Telemetry;

mod api;
mod db;
mod pond;
mod util;

#[derive(Debug, Error)]
enum RunnerErr {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Env(#[from] EnvErr),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Std(#[from] Box<dyn std::error::Error>),
}

type Result<T> = core::result::Result<T, RunnerErr>;

#[tokio::main]
async fn main() -> Result<()> {
    let env = env::env().await?;
    let telemetry = Telemetry::new(env)?.register();

    tracing::info!("starting pond storage");

    let pool = db_pool(env).await?;
    let state = Arc::new(AppState::new(Arc::new(PgPond::new(pool)), env));

    let served = start_server(state, env).await;
    if let Err(e) = &served {
        tracing::error!(error = ?e, "server exited with error");
    }

    telemetry.shutdown();
    Ok(served?)
}
