use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::key::{DuckKey, EntryId, KeyResult, UserKey};

/// A player's pond program.
#[derive(Debug, Clone, PartialEq)]
pub struct Duck {
    pub key: DuckKey,
    pub name: String,
    pub code: DuckCode,
    pub published: bool,
    pub leaderboard_entry: Option<EntryId>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuckCode {
    pub js: String,
    pub opt_xml: Option<String>,
}

/// Base duck table model
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DuckRow {
    pub id: Uuid,
    pub owner_id: UserKey,
    pub name: String,
    pub js: String,
    pub opt_xml: Option<String>,
    pub published: bool,
    pub leaderboard_entry_id: Option<EntryId>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<DuckRow> for Duck {
    type Error = super::key::KeyError;

    fn try_from(row: DuckRow) -> KeyResult<Self> {
        let owner = UserKey::parse(row.owner_id.as_str())?;

        Ok(Self {
            key: DuckKey { owner, id: row.id },
            name: row.name,
            code: DuckCode {
                js: row.js,
                opt_xml: row.opt_xml,
            },
            published: row.published,
            leaderboard_entry: row.leaderboard_entry_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// JSON projection of a duck as returned to the client.
///
/// `ranking` is only present for leaderboard rows. `isOwner` is only ever emitted as
/// `true`; a duck the caller doesn't own has no `isOwner` field at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuckInfo {
    pub name: String,
    pub duck_key: String,
    pub code: DuckCode,
    pub published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking: Option<i64>,
    #[serde(
        rename = "isOwner",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub is_owner: bool,
}

impl From<&Duck> for DuckInfo {
    fn from(duck: &Duck) -> Self {
        Self {
            name: duck.name.clone(),
            duck_key: duck.key.urlsafe(),
            code: duck.code.clone(),
            published: duck.published,
            ranking: None,
            is_owner: false,
        }
    }
}
