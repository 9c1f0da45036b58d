use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{DocumentStore, StoreResult};
use crate::models::chat_entry::ChatEntry;
use crate::models::log_entry::{LogEntry, LogPatch, NewLogEntry};
use crate::models::user_profile::{NewUserProfile, UserProfile};

/// In-process store for local runs (`DATABASE_URL=memory://`) and tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

#[derive(Default)]
struct Collections {
    logs: Vec<LogEntry>,
    profiles: Vec<UserProfile>,
    chats: HashMap<Uuid, ChatEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn chat_count(&self) -> usize {
        self.inner.read().await.chats.len()
    }

    pub async fn chats_for(&self, user_id: &str) -> Vec<ChatEntry> {
        self.inner
            .read()
            .await
            .chats
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn profile_count(&self) -> usize {
        self.inner.read().await.profiles.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_log(&self, entry: NewLogEntry) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        self.inner.write().await.logs.push(LogEntry {
            id,
            user_id: entry.user_id,
            action: entry.action,
            timestamp: entry.timestamp,
            endpoint: entry.endpoint,
        });
        Ok(id)
    }

    async fn list_logs(&self) -> StoreResult<Vec<LogEntry>> {
        let mut logs = self.inner.read().await.logs.clone();
        // Stable sort keeps insertion order for equal timestamps.
        logs.sort_by_key(|l| l.timestamp);
        Ok(logs)
    }

    async fn update_log(&self, id: Uuid, patch: &LogPatch) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.logs.iter_mut().find(|l| l.id == id) {
            Some(entry) => {
                patch.apply(entry);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_log(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.logs.len();
        inner.logs.retain(|l| l.id != id);
        Ok(inner.logs.len() < before)
    }

    async fn insert_profile(&self, profile: NewUserProfile) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        self.inner
            .write()
            .await
            .profiles
            .push(profile.into_profile(id));
        Ok(id)
    }

    async fn find_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        let inner = self.inner.read().await;
        // Later insertions win ties on last_updated.
        let found = inner
            .profiles
            .iter()
            .filter(|p| p.user_id == user_id)
            .fold(None::<&UserProfile>, |best, p| match best {
                Some(b) if b.last_updated > p.last_updated => Some(b),
                _ => Some(p),
            });
        Ok(found.cloned())
    }

    async fn insert_chat(&self, entry: &ChatEntry) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        self.inner.write().await.chats.insert(id, entry.clone());
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn new_log(user_id: &str, action: &str) -> NewLogEntry {
        NewLogEntry {
            user_id: user_id.into(),
            action: action.into(),
            timestamp: Utc::now(),
            endpoint: "/log".into(),
        }
    }

    #[tokio::test]
    async fn test_log_lifecycle() {
        let store = MemoryStore::new();
        let id = store.insert_log(new_log("u1", "click")).await.unwrap();

        let patch = LogPatch { action: Some("tap".into()), ..Default::default() };
        assert!(store.update_log(id, &patch).await.unwrap());

        let logs = store.list_logs().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "tap");
        assert_eq!(logs[0].user_id, "u1");

        assert!(store.delete_log(id).await.unwrap());
        assert!(!store.delete_log(id).await.unwrap());
        assert!(!store.update_log(id, &patch).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_logs_sorted_by_timestamp() {
        let store = MemoryStore::new();
        let mut late = new_log("u1", "late");
        late.timestamp = Utc::now() + Duration::hours(1);
        store.insert_log(late).await.unwrap();
        store.insert_log(new_log("u1", "early")).await.unwrap();

        let actions: Vec<_> = store
            .list_logs()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.action)
            .collect();
        assert_eq!(actions, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn test_find_profile_returns_latest() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for (name, offset) in [("old", -10), ("new", 0)] {
            store
                .insert_profile(NewUserProfile {
                    user_id: "u1".into(),
                    name: name.into(),
                    birth_date: None,
                    personality: Default::default(),
                    bazi_analysis: Default::default(),
                    additional_analysis: Default::default(),
                    last_updated: now + Duration::seconds(offset),
                })
                .await
                .unwrap();
        }

        let found = store.find_profile("u1").await.unwrap().unwrap();
        assert_eq!(found.name, "new");
        assert_eq!(store.profile_count().await, 2);
        assert!(store.find_profile("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_profile_tie_goes_to_later_insert() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for name in ["first", "second"] {
            store
                .insert_profile(NewUserProfile {
                    user_id: "u1".into(),
                    name: name.into(),
                    birth_date: None,
                    personality: Default::default(),
                    bazi_analysis: Default::default(),
                    additional_analysis: Default::default(),
                    last_updated: now,
                })
                .await
                .unwrap();
        }

        let found = store.find_profile("u1").await.unwrap().unwrap();
        assert_eq!(found.name, "second");
    }
}
