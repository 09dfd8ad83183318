#![allow(dead_code)]

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use crate::db::prelude::*;

/// In-memory [`DuckStore`] for driving the lookup logic without postgres.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ducks: RwLock<Vec<Duck>>,
    entries: RwLock<HashMap<EntryId, LeaderboardEntry>>,
    // insertion order of entries, used to keep ties stable
    entry_order: RwLock<Vec<EntryId>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an unpublished duck and returns it.
    pub async fn add_duck(&self, owner: &str, name: &str) -> Duck {
        let mut ducks = self.ducks.write().await;
        // spread creation times so the owner listing has a defined order
        let created_at = Utc::now().naive_utc() + Duration::milliseconds(ducks.len() as i64);

        let duck = Duck {
            key: DuckKey::new(UserKey::parse(owner).unwrap()),
            name: name.to_string(),
            code: DuckCode {
                js: format!("// {name}"),
                opt_xml: Some(format!("<xml>{name}</xml>")),
            },
            published: false,
            leaderboard_entry: None,
            created_at,
            updated_at: created_at,
        };

        ducks.push(duck.clone());
        duck
    }

    /// Publishes `duck` onto `leaderboard_key` at `ranking`, returning the updated duck.
    pub async fn publish(&self, duck: &Duck, leaderboard_key: &str, ranking: i64) -> Duck {
        let entry = LeaderboardEntry {
            id: EntryId::new(),
            leaderboard_key: leaderboard_key.to_string(),
            ranking,
            duck_key: duck.key.clone(),
        };

        self.entry_order.write().await.push(entry.id);
        let id = entry.id;
        self.entries.write().await.insert(id, entry);

        let mut ducks = self.ducks.write().await;
        let stored = ducks
            .iter_mut()
            .find(|d| d.key == duck.key)
            .expect("duck must be added before publishing");
        stored.published = true;
        stored.leaderboard_entry = Some(id);

        stored.clone()
    }

    /// Points a duck at an entry that doesn't exist.
    pub async fn dangle_entry(&self, duck: &Duck) -> Duck {
        let mut ducks = self.ducks.write().await;
        let stored = ducks.iter_mut().find(|d| d.key == duck.key).unwrap();
        stored.published = true;
        stored.leaderboard_entry = Some(EntryId::new());

        stored.clone()
    }

    pub async fn remove_duck(&self, key: &DuckKey) {
        self.ducks.write().await.retain(|d| &d.key != key);
    }
}

#[async_trait]
impl DuckStore for MemoryStore {
    async fn get_duck(&self, key: &DuckKey) -> StoreResult<Option<Duck>> {
        Ok(self
            .ducks
            .read()
            .await
            .iter()
            .find(|d| &d.key == key)
            .cloned())
    }

    async fn ducks_by_owner(&self, owner: &UserKey) -> StoreResult<Vec<Duck>> {
        let mut owned: Vec<Duck> = self
            .ducks
            .read()
            .await
            .iter()
            .filter(|d| d.key.is_owned_by(owner))
            .cloned()
            .collect();

        owned.sort_by_key(|d| d.created_at);
        Ok(owned)
    }

    async fn get_entry(&self, id: &EntryId) -> StoreResult<Option<LeaderboardEntry>> {
        Ok(self.entries.read().await.get(id).cloned())
    }

    async fn top_entries(
        &self,
        leaderboard_key: &str,
        count: i64,
    ) -> StoreResult<Vec<LeaderboardEntry>> {
        let entries = self.entries.read().await;
        let mut top: Vec<LeaderboardEntry> = self
            .entry_order
            .read()
            .await
            .iter()
            .filter_map(|id| entries.get(id))
            .filter(|e| e.leaderboard_key == leaderboard_key)
            .filter(|e| (1..=count).contains(&e.ranking))
            .cloned()
            .collect();

        top.sort_by_key(|e| e.ranking);
        Ok(top)
    }
}
