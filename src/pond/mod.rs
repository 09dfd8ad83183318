//! Duck lookup: the single read endpoint behind `/pond-storage/get`.
//!
//! A request either lists the caller's own ducks, returns one duck, or returns the
//! top of the leaderboard the given duck is published on.

use thiserror::Error;

use crate::db::prelude::{KeyError, StoreError};

pub mod lookup;
pub mod request;
pub mod storage;

pub type PondResult<T> = core::result::Result<T, PondError>;

#[derive(Debug, Error)]
pub enum PondError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("malformed duck key: {0}")]
    MalformedKey(#[from] KeyError),

    #[error("invalid count '{0}'")]
    InvalidCount(String),

    #[error("duck '{0}' not found")]
    DuckNotFound(String),

    #[error("duck '{0}' belongs to another user")]
    Forbidden(String),
}
