use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::{Extension, Json};
use tracing::instrument;

use crate::api::server::{AppState, JsonResult};
use crate::pond::lookup::{self, PondResponse};
use crate::pond::request::DuckQuery;
use crate::pond::storage::CurrentUser;

/// `GET /pond-storage/get`
///
/// Without `key`, lists the caller's ducks. With `key`, returns that duck, or the top
/// of its leaderboard when `type=topducks`.
#[instrument(skip(state))]
pub async fn get_ducks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    query: Result<Query<DuckQuery>, QueryRejection>,
) -> JsonResult<PondResponse> {
    let Query(query) = query?;
    let request = query.into_request(state.max_top_count)?;

    let response = lookup::handle(state.store.as_ref(), &user, request).await?;
    Ok(Json(response))
}
