use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const USER_KIND: &str = "User";
const DUCK_KIND: &str = "Duck";

pub type KeyResult<T> = core::result::Result<T, KeyError>;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key is not valid hex: {0}")]
    Encoding(#[from] hex::FromHexError),

    #[error("key is not valid utf-8")]
    Utf8,

    #[error("malformed key path '{0}'")]
    Path(String),

    #[error("invalid duck id: {0}")]
    Id(String),

    #[error("invalid user key '{0}'")]
    User(String),
}

/// Stable identifier of a player, as resolved from their session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct UserKey(pub String);

impl UserKey {
    /// User keys are embedded in duck key paths and session tokens, so they can't be
    /// empty or contain either separator (`/`, `.`).
    pub fn parse(raw: &str) -> KeyResult<Self> {
        if raw.is_empty() || raw.contains('/') || raw.contains('.') {
            return Err(KeyError::User(raw.to_owned()));
        }

        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a duck along with the user that owns it.
///
/// The urlsafe form is the hex encoding of `User/<owner>/Duck/<id>`, which keeps the
/// ancestor recoverable from the key alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DuckKey {
    pub owner: UserKey,
    pub id: Uuid,
}

impl DuckKey {
    #[cfg(test)]
    pub fn new(owner: UserKey) -> Self {
        Self {
            owner,
            id: Uuid::new_v4(),
        }
    }

    pub fn urlsafe(&self) -> String {
        hex::encode(format!("{USER_KIND}/{}/{DUCK_KIND}/{}", self.owner, self.id))
    }

    pub fn from_urlsafe(encoded: &str) -> KeyResult<Self> {
        let bytes = hex::decode(encoded)?;
        let path = String::from_utf8(bytes).map_err(|_| KeyError::Utf8)?;

        let segments: Vec<&str> = path.split('/').collect();
        let [user_kind, owner, duck_kind, id] = segments.as_slice() else {
            return Err(KeyError::Path(path.clone()));
        };

        if *user_kind != USER_KIND || *duck_kind != DUCK_KIND {
            return Err(KeyError::Path(path.clone()));
        }

        let owner = UserKey::parse(owner)?;
        let id = Uuid::parse_str(id).map_err(|e| KeyError::Id(e.to_string()))?;

        Ok(Self { owner, id })
    }

    pub fn is_owned_by(&self, user: &UserKey) -> bool {
        &self.owner == user
    }
}

impl fmt::Display for DuckKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.urlsafe())
    }
}

impl FromStr for DuckKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_urlsafe(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct EntryId(pub Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}
