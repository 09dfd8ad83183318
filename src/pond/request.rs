use serde::Deserialize;

use super::{PondError, PondResult};
use crate::db::prelude::DuckKey;

pub const TOP_DUCKS: &str = "topducks";
pub const DEFAULT_TOP_COUNT: i64 = 10;

/// Raw query string, exactly as the client sent it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DuckQuery {
    pub key: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub count: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuckRequest {
    /// No key: every duck the caller owns.
    ListOwned,
    Single { key: DuckKey },
    TopDucks { key: DuckKey, count: i64 },
}

impl DuckQuery {
    /// Validates the raw parameters. `count` is only looked at in leaderboard mode and
    /// is clamped to `max_count`.
    pub fn into_request(self, max_count: i64) -> PondResult<DuckRequest> {
        let Some(raw_key) = non_blank(self.key) else {
            return Ok(DuckRequest::ListOwned);
        };

        let key = DuckKey::from_urlsafe(&raw_key)?;

        match non_blank(self.kind).as_deref() {
            Some(TOP_DUCKS) => {
                let count = parse_count(non_blank(self.count).as_deref(), max_count)?;
                Ok(DuckRequest::TopDucks { key, count })
            }
            _ => Ok(DuckRequest::Single { key }),
        }
    }
}

/// Blank parameters are treated as if they were never sent.
fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

fn parse_count(raw: Option<&str>, max_count: i64) -> PondResult<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_TOP_COUNT.min(max_count));
    };

    match raw.parse::<i64>() {
        Ok(count) if count >= 1 => Ok(count.min(max_count)),
        _ => Err(PondError::InvalidCount(raw.to_owned())),
    }
}
