use tracing::instrument;

use super::{PondError, PondResult};
use crate::db::prelude::*;

/// The authenticated caller, as placed in request extensions by the session middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub UserKey);

pub fn get_user_key(user: &CurrentUser) -> &UserKey {
    &user.0
}

/// Resolves a fetched duck into one the caller may read.
///
/// Owners can always read their ducks. Anyone can read a published duck since it's
/// already visible on its leaderboard.
pub fn verify_duck(key: &DuckKey, duck: Option<Duck>, user: &CurrentUser) -> PondResult<Duck> {
    let Some(duck) = duck else {
        return Err(PondError::DuckNotFound(key.urlsafe()));
    };

    if duck.key.is_owned_by(get_user_key(user)) || duck.published {
        Ok(duck)
    } else {
        tracing::warn!(duck = %duck.key, user = %user.0, "rejected read of another user's duck");
        Err(PondError::Forbidden(key.urlsafe()))
    }
}

pub fn get_duck_info(duck: &Duck) -> DuckInfo {
    DuckInfo::from(duck)
}

#[instrument(skip(store))]
pub async fn get_user_ducks(store: &dyn DuckStore, user: &CurrentUser) -> PondResult<Vec<DuckInfo>> {
    let ducks = store.ducks_by_owner(get_user_key(user)).await?;
    Ok(ducks.iter().map(get_duck_info).collect())
}

/// Projects leaderboard entries onto their ducks, carrying the entry's ranking.
pub async fn entries_to_duck_info(
    store: &dyn DuckStore,
    entries: &[LeaderboardEntry],
) -> PondResult<Vec<DuckInfo>> {
    let mut infos = Vec::with_capacity(entries.len());

    for entry in entries {
        match store.get_duck(&entry.duck_key).await? {
            Some(duck) => {
                let mut info = get_duck_info(&duck);
                info.ranking = Some(entry.ranking);
                infos.push(info);
            }
            None => {
                tracing::warn!(entry = ?entry.id, duck = %entry.duck_key, "leaderboard entry without a duck");
            }
        }
    }

    Ok(infos)
}
