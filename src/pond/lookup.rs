use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::PondResult;
use super::request::DuckRequest;
use super::storage::{
    CurrentUser, entries_to_duck_info, get_duck_info, get_user_ducks, get_user_key, verify_duck,
};
use crate::db::prelude::*;

/// Body of a successful lookup. Each mode has a distinct top-level shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PondResponse {
    DuckList {
        #[serde(rename = "duckList")]
        duck_list: Vec<DuckInfo>,
    },
    TopDucks {
        #[serde(rename = "topDucks")]
        top_ducks: Vec<DuckInfo>,
    },
    Duck(DuckInfo),
}

#[instrument(skip(store))]
pub async fn handle(
    store: &dyn DuckStore,
    user: &CurrentUser,
    request: DuckRequest,
) -> PondResult<PondResponse> {
    match request {
        DuckRequest::ListOwned => Ok(PondResponse::DuckList {
            duck_list: get_user_ducks(store, user).await?,
        }),

        DuckRequest::Single { key } => {
            let duck = verify_duck(&key, store.get_duck(&key).await?, user)?;
            Ok(PondResponse::Duck(get_duck_info(&duck)))
        }

        DuckRequest::TopDucks { key, count } => {
            let duck = verify_duck(&key, store.get_duck(&key).await?, user)?;
            Ok(PondResponse::TopDucks {
                top_ducks: get_top_ducks(store, user, count, &duck).await?,
            })
        }
    }
}

/// Entries sharing `user_entry`'s leaderboard with a ranking in `1..=count`.
pub async fn get_top_entries(
    store: &dyn DuckStore,
    user_entry: &LeaderboardEntry,
    count: i64,
) -> PondResult<Vec<LeaderboardEntry>> {
    Ok(store.top_entries(&user_entry.leaderboard_key, count).await?)
}

/// The best ranked ducks on the leaderboard `duck` is published to.
///
/// An unpublished duck has no leaderboard, which yields an empty list rather than an
/// error.
#[instrument(skip(store, duck), fields(duck = %duck.key))]
pub async fn get_top_ducks(
    store: &dyn DuckStore,
    user: &CurrentUser,
    count: i64,
    duck: &Duck,
) -> PondResult<Vec<DuckInfo>> {
    let Some(entry_id) = &duck.leaderboard_entry else {
        tracing::error!("can not get leaderboard for unpublished duck");
        return Ok(Vec::new());
    };

    let Some(user_entry) = store.get_entry(entry_id).await? else {
        tracing::error!(entry = ?entry_id, "duck references a missing leaderboard entry");
        return Ok(Vec::new());
    };

    let top_entries = get_top_entries(store, &user_entry, count).await?;
    let top_ducks_info = entries_to_duck_info(store, &top_entries).await?;

    format_top_ducks(store, user, top_ducks_info).await
}

/// Flags the caller's own ducks with `isOwner`.
pub async fn format_top_ducks(
    store: &dyn DuckStore,
    user: &CurrentUser,
    mut top_ducks_info: Vec<DuckInfo>,
) -> PondResult<Vec<DuckInfo>> {
    let owned: HashSet<String> = store
        .ducks_by_owner(get_user_key(user))
        .await?
        .iter()
        .map(|d| d.key.urlsafe())
        .collect();

    for info in &mut top_ducks_info {
        if owned.contains(&info.duck_key) {
            info.is_owner = true;
        }
    }

    Ok(top_ducks_info)
}

#[cfg(test)]
mod test {
    use std::io;
    use std::sync::{Arc, Mutex};

    use serde_json::{Value, json};
    use tracing::instrument::WithSubscriber;

    use super::*;
    use crate::db::repositories::memory::MemoryStore;
    use crate::pond::PondError;

    fn caller(name: &str) -> CurrentUser {
        CurrentUser(UserKey::parse(name).unwrap())
    }

    /// Publishes one duck per ranking onto `board`, alternating owners between alice
    /// and bob.
    async fn board(store: &MemoryStore, board: &str, rankings: &[i64]) -> Vec<Duck> {
        let mut ducks = Vec::new();
        for (i, ranking) in rankings.iter().enumerate() {
            let owner = if i % 2 == 0 { "alice" } else { "bob" };
            let duck = store.add_duck(owner, &format!("{board}-{i}")).await;
            ducks.push(store.publish(&duck, board, *ranking).await);
        }
        ducks
    }

    /// Shared buffer the fmt layer writes captured log lines into.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    async fn top_ducks_with_logs(
        store: &MemoryStore,
        user: &CurrentUser,
        count: i64,
        duck: &Duck,
    ) -> (PondResult<Vec<DuckInfo>>, String) {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let top = get_top_ducks(store, user, count, duck)
            .with_subscriber(subscriber)
            .await;

        (top, logs.contents())
    }

    #[tokio::test]
    async fn test_unpublished_duck_has_no_top_ducks() {
        let store = MemoryStore::new();
        board(&store, "pond", &[1, 2]).await;
        let lonely = store.add_duck("alice", "lonely").await;

        let (top, logs) = top_ducks_with_logs(&store, &caller("alice"), 10, &lonely).await;
        assert_eq!(top.unwrap(), Vec::new());
        assert!(logs.contains("ERROR"), "{logs}");
        assert!(logs.contains("unpublished duck"), "{logs}");
    }

    #[tokio::test]
    async fn test_dangling_entry_has_no_top_ducks() {
        let store = MemoryStore::new();
        let duck = store.add_duck("alice", "dangling").await;
        let duck = store.dangle_entry(&duck).await;

        let (top, logs) = top_ducks_with_logs(&store, &caller("alice"), 10, &duck).await;
        assert_eq!(top.unwrap(), Vec::new());
        assert!(logs.contains("missing leaderboard entry"), "{logs}");
    }

    #[tokio::test]
    async fn test_top_ducks_respect_count_and_order() {
        let store = MemoryStore::new();
        let ducks = board(&store, "pond", &[5, 2, 4, 1, 2, 0, -1]).await;
        board(&store, "other-pond", &[1, 2, 3]).await;

        let rankings = |top: Vec<DuckInfo>| -> Vec<i64> {
            top.iter().map(|d| d.ranking.unwrap()).collect()
        };

        let top = get_top_ducks(&store, &caller("carol"), 3, &ducks[0])
            .await
            .unwrap();
        assert!(top.iter().all(|d| d.name.starts_with("pond-")));
        assert_eq!(rankings(top), [1, 2, 2]);

        let top = get_top_ducks(&store, &caller("carol"), 1, &ducks[0])
            .await
            .unwrap();
        assert_eq!(rankings(top), [1]);

        // rankings below 1 never show up, even with room to spare
        let top = get_top_ducks(&store, &caller("carol"), 10, &ducks[0])
            .await
            .unwrap();
        assert_eq!(rankings(top), [1, 2, 2, 4, 5]);
    }

    #[tokio::test]
    async fn test_owner_flag_present_only_for_own_ducks() {
        let store = MemoryStore::new();
        let ducks = board(&store, "pond", &[1, 2, 3, 4]).await;

        let top = get_top_ducks(&store, &caller("alice"), 10, &ducks[1])
            .await
            .unwrap();
        let values: Vec<Value> = top
            .iter()
            .map(|d| serde_json::to_value(d).unwrap())
            .collect();

        // alice owns rankings 1 and 3
        assert_eq!(values[0]["isOwner"], json!(true));
        assert_eq!(values[2]["isOwner"], json!(true));
        for bob in [&values[1], &values[3]] {
            assert!(bob.get("isOwner").is_none());
        }
    }

    #[tokio::test]
    async fn test_formatting_twice_is_harmless() {
        let store = MemoryStore::new();
        let ducks = board(&store, "pond", &[1, 2]).await;
        let alice = caller("alice");

        let once = get_top_ducks(&store, &alice, 10, &ducks[0]).await.unwrap();
        let twice = format_top_ducks(&store, &alice, once.clone()).await.unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_handle_modes() {
        let store = MemoryStore::new();
        let ducks = board(&store, "pond", &[1, 2]).await;
        let draft = store.add_duck("alice", "draft").await;
        let alice = caller("alice");

        let listed = handle(&store, &alice, DuckRequest::ListOwned).await.unwrap();
        let PondResponse::DuckList { duck_list } = &listed else {
            panic!("expected a duck list, got {listed:?}");
        };
        assert_eq!(duck_list.len(), 2);
        assert!(duck_list.iter().any(|d| d.duck_key == draft.key.urlsafe()));

        let single = handle(&store, &alice, DuckRequest::Single { key: draft.key.clone() })
            .await
            .unwrap();
        assert_eq!(single, PondResponse::Duck(DuckInfo::from(&draft)));

        let top = handle(
            &store,
            &alice,
            DuckRequest::TopDucks { key: ducks[1].key.clone(), count: 10 },
        )
        .await
        .unwrap();
        let PondResponse::TopDucks { top_ducks } = top else {
            panic!("expected top ducks");
        };
        assert_eq!(top_ducks.len(), 2);
    }

    #[tokio::test]
    async fn test_handle_rejects_hidden_and_missing_ducks() {
        let store = MemoryStore::new();
        let draft = store.add_duck("bob", "draft").await;
        let alice = caller("alice");

        let res = handle(&store, &alice, DuckRequest::Single { key: draft.key.clone() }).await;
        assert!(matches!(res, Err(PondError::Forbidden(_))));

        let res = handle(
            &store,
            &alice,
            DuckRequest::TopDucks { key: draft.key.clone(), count: 10 },
        )
        .await;
        assert!(matches!(res, Err(PondError::Forbidden(_))));

        let missing = DuckKey::new(UserKey::parse("alice").unwrap());
        let res = handle(&store, &alice, DuckRequest::Single { key: missing }).await;
        assert!(matches!(res, Err(PondError::DuckNotFound(_))));
    }

    #[test]
    fn test_response_shapes() {
        let list = PondResponse::DuckList { duck_list: vec![] };
        assert_eq!(serde_json::to_value(list).unwrap(), json!({ "duckList": [] }));

        let top = PondResponse::TopDucks { top_ducks: vec![] };
        assert_eq!(serde_json::to_value(top).unwrap(), json!({ "topDucks": [] }));
    }
}
