use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::store::{DocumentStore, StoreResult};
use crate::models::chat_entry::ChatEntry;
use crate::models::log_entry::{LogEntry, LogPatch, NewLogEntry};
use crate::models::user_profile::{NewUserProfile, UserProfile};

// Latest profile for a user. Equal `last_updated` values fall back to insert
// order, matching the in-memory store.
const LATEST_PROFILE_SQL: &str = r#"
    SELECT id, user_id, name, birth_date, personality, bazi_analysis, additional_analysis, last_updated
    FROM user_profiles
    WHERE user_id = $1
    ORDER BY last_updated DESC, created_at DESC
    LIMIT 1
"#;

/// PostgreSQL-backed store: one table per collection, sub-documents in JSONB.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.db)
            .await?;
        Ok(())
    }

    async fn insert_log(&self, entry: NewLogEntry) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO orsa_logs (id, user_id, action, logged_at, endpoint)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(&entry.user_id)
        .bind(&entry.action)
        .bind(entry.timestamp)
        .bind(&entry.endpoint)
        .execute(&self.db)
        .await?;

        Ok(id)
    }

    async fn list_logs(&self) -> StoreResult<Vec<LogEntry>> {
        let logs = sqlx::query_as::<_, LogEntry>(
            r#"
            SELECT id, user_id, action, logged_at, endpoint
            FROM orsa_logs
            ORDER BY logged_at ASC, created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(logs)
    }

    async fn update_log(&self, id: Uuid, patch: &LogPatch) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orsa_logs SET
                user_id = COALESCE($2, user_id),
                action = COALESCE($3, action),
                logged_at = COALESCE($4, logged_at)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.user_id)
        .bind(&patch.action)
        .bind(patch.timestamp)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_log(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM orsa_logs WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_profile(&self, profile: NewUserProfile) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO user_profiles
                (id, user_id, name, birth_date, personality, bazi_analysis, additional_analysis, last_updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(&profile.user_id)
        .bind(&profile.name)
        .bind(&profile.birth_date)
        .bind(Json(&profile.personality))
        .bind(Json(&profile.bazi_analysis))
        .bind(Json(&profile.additional_analysis))
        .bind(profile.last_updated)
        .execute(&self.db)
        .await?;

        Ok(id)
    }

    async fn find_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(LATEST_PROFILE_SQL)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(profile)
    }

    async fn insert_chat(&self, entry: &ChatEntry) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO chat_history (id, user_id, created_at, conversation, analysis)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(&entry.user_id)
        .bind(entry.timestamp)
        .bind(&entry.conversation)
        .bind(Json(&entry.analysis))
        .execute(&self.db)
        .await?;

        Ok(id)
    }
}
