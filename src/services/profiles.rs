use chrono::Utc;
use uuid::Uuid;

use crate::db::DocumentStore;
use crate::error::{AppError, AppResult};
use crate::models::user_profile::{CreateProfileRequest, UserProfile};

/// Inserts a new profile document. Earlier profiles with the same `user_id`
/// are left in place.
pub async fn create_profile(
    store: &dyn DocumentStore,
    request: CreateProfileRequest,
) -> AppResult<Uuid> {
    let user_id = request.user_id.clone();
    let id = store
        .insert_profile(request.into_new_profile(Utc::now()))
        .await?;

    tracing::info!(profile_id = %id, user_id = %user_id, "User profile saved");
    Ok(id)
}

pub async fn get_profile(store: &dyn DocumentStore, user_id: &str) -> AppResult<UserProfile> {
    store
        .find_profile(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use serde_json::json;

    fn request(user_id: &str, name: &str) -> CreateProfileRequest {
        let obj = json!({ "user_id": user_id, "name": name, "personality": {"mbti": "INFP"} });
        CreateProfileRequest::from_json(obj.as_object().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = MemoryStore::new();
        let id = create_profile(&store, request("u1", "Aki")).await.unwrap();

        let profile = get_profile(&store, "u1").await.unwrap();
        assert_eq!(profile.id, id);
        assert_eq!(profile.name, "Aki");
        assert_eq!(profile.personality["mbti"], "INFP");
        assert_eq!(profile.additional_analysis, json!({}));
    }

    #[tokio::test]
    async fn test_repeated_submission_adds_document() {
        let store = MemoryStore::new();
        create_profile(&store, request("u1", "first")).await.unwrap();
        let second = create_profile(&store, request("u1", "second")).await.unwrap();

        assert_eq!(store.profile_count().await, 2);
        assert_eq!(get_profile(&store, "u1").await.unwrap().id, second);
    }

    #[tokio::test]
    async fn test_get_unknown_profile() {
        let store = MemoryStore::new();
        assert!(matches!(
            get_profile(&store, "ghost").await,
            Err(AppError::NotFound(_))
        ));
    }
}
