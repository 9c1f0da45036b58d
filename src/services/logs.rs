use chrono::Utc;
use uuid::Uuid;

use crate::db::DocumentStore;
use crate::error::{AppError, AppResult};
use crate::models::log_entry::{LogPatch, LogView, NewLogEntry};

/// Records that `user_id` performed `action` through `endpoint`.
pub async fn record_action(
    store: &dyn DocumentStore,
    user_id: &str,
    action: &str,
    endpoint: &str,
) -> AppResult<Uuid> {
    let id = store
        .insert_log(NewLogEntry {
            user_id: user_id.to_string(),
            action: action.to_string(),
            timestamp: Utc::now(),
            endpoint: endpoint.to_string(),
        })
        .await?;

    tracing::debug!(log_id = %id, user_id = %user_id, endpoint = %endpoint, "Action recorded");
    Ok(id)
}

pub async fn list_logs(store: &dyn DocumentStore) -> AppResult<Vec<LogView>> {
    let logs = store.list_logs().await?;
    Ok(logs.into_iter().map(LogView::from).collect())
}

pub fn parse_log_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::InvalidRequest("log_id is not a valid identifier".into()))
}

pub async fn update_log(store: &dyn DocumentStore, id: Uuid, patch: &LogPatch) -> AppResult<()> {
    let matched = store.update_log(id, patch).await.map_err(|e| {
        tracing::error!(log_id = %id, error = %e, "Failed to update log");
        e
    })?;

    if !matched {
        return Err(AppError::NotFound("Log not found".into()));
    }
    Ok(())
}

pub async fn delete_log(store: &dyn DocumentStore, id: Uuid) -> AppResult<()> {
    let deleted = store.delete_log(id).await.map_err(|e| {
        tracing::error!(log_id = %id, error = %e, "Failed to delete log");
        e
    })?;

    if !deleted {
        return Err(AppError::NotFound("Log not found".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    #[test]
    fn test_parse_log_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_log_id(&id.to_string()).unwrap(), id);
        assert!(matches!(parse_log_id("abc"), Err(AppError::InvalidRequest(_))));
        assert!(matches!(parse_log_id(""), Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_record_then_list_hides_identifier() {
        let store = MemoryStore::new();
        record_action(&store, "u1", "click", "/log").await.unwrap();

        let logs = list_logs(&store).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].endpoint, "/log");

        let json = serde_json::to_value(&logs[0]).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["action"], "click");
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_entry() {
        let store = MemoryStore::new();
        let missing = Uuid::new_v4();
        let patch = LogPatch { action: Some("x".into()), ..Default::default() };

        assert!(matches!(
            update_log(&store, missing, &patch).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(delete_log(&store, missing).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_second_delete_is_not_found() {
        let store = MemoryStore::new();
        let id = record_action(&store, "u1", "click", "/log").await.unwrap();

        assert!(delete_log(&store, id).await.is_ok());
        assert!(matches!(delete_log(&store, id).await, Err(AppError::NotFound(_))));
    }
}
