//! Document store gateway.
//!
//! Three independent collections: log entries, user profiles and chat
//! history. Identifiers are assigned by the store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::chat_entry::ChatEntry;
use crate::models::log_entry::{LogEntry, LogPatch, NewLogEntry};
use crate::models::user_profile::{NewUserProfile, UserProfile};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Connectivity check.
    async fn ping(&self) -> StoreResult<()>;

    async fn insert_log(&self, entry: NewLogEntry) -> StoreResult<Uuid>;

    /// All log entries, oldest first.
    async fn list_logs(&self) -> StoreResult<Vec<LogEntry>>;

    /// Applies `patch` to the entry. Returns `false` if no entry matched.
    async fn update_log(&self, id: Uuid, patch: &LogPatch) -> StoreResult<bool>;

    /// Returns `false` if no entry matched.
    async fn delete_log(&self, id: Uuid) -> StoreResult<bool>;

    async fn insert_profile(&self, profile: NewUserProfile) -> StoreResult<Uuid>;

    /// Most recently updated profile with this `user_id`.
    async fn find_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>>;

    async fn insert_chat(&self, entry: &ChatEntry) -> StoreResult<Uuid>;
}
