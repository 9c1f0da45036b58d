use std::time::Duration;

use chrono::Utc;
use serde_json::json;

use crate::db::DocumentStore;
use crate::error::{AppError, AppResult};
use crate::models::chat_entry::{ChatAnalysis, ChatEntry, SaveChatRequest};
use crate::services::personality::{analyze_with_timeout, PersonalityAnalyzer};
use crate::services::pillars::{pillars_document, PillarCalculator};

/// Collaborators of the chat-analysis flow.
pub struct ChatAnalysisDeps<'a> {
    pub store: &'a dyn DocumentStore,
    pub analyzer: &'a dyn PersonalityAnalyzer,
    pub pillars: &'a dyn PillarCalculator,
    pub analyzer_timeout: Duration,
}

/// Analyzes a conversation for the profile owner and stores the result.
///
/// The profile is resolved first so an unknown user never costs an LLM call.
pub async fn save_chat(deps: &ChatAnalysisDeps<'_>, request: SaveChatRequest) -> AppResult<ChatEntry> {
    let profile = deps
        .store
        .find_profile(&request.user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    let big_five =
        analyze_with_timeout(deps.analyzer, &request.conversation, deps.analyzer_timeout).await?;

    let four_pillars = match profile.birth_date.as_deref() {
        Some(birth_date) => pillars_document(deps.pillars, birth_date),
        None => json!({}),
    };

    let entry = ChatEntry {
        user_id: request.user_id,
        timestamp: Utc::now(),
        conversation: request.conversation,
        analysis: ChatAnalysis {
            big_five,
            four_pillars,
        },
    };

    let id = deps.store.insert_chat(&entry).await?;
    tracing::info!(chat_id = %id, user_id = %entry.user_id, "Chat analysis saved");

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::db::memory::MemoryStore;
    use crate::models::chat_entry::BigFiveScores;
    use crate::models::user_profile::CreateProfileRequest;
    use crate::services::personality::AnalyzerError;
    use crate::services::pillars::SexagenaryCalculator;
    use crate::services::profiles::create_profile;

    const SCORES: BigFiveScores = BigFiveScores {
        openness: 0.8,
        conscientiousness: 0.6,
        extraversion: 0.4,
        agreeableness: 0.7,
        neuroticism: 0.3,
    };

    #[derive(Default)]
    struct CountingAnalyzer {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl PersonalityAnalyzer for CountingAnalyzer {
        async fn analyze(&self, _conversation: &str) -> Result<BigFiveScores, AnalyzerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AnalyzerError::Api("quota exceeded".into()))
            } else {
                Ok(SCORES)
            }
        }
    }

    fn chat(user_id: &str) -> SaveChatRequest {
        SaveChatRequest {
            user_id: user_id.into(),
            conversation: "I love planning trips with friends.".into(),
        }
    }

    async fn seed_profile(store: &MemoryStore, user_id: &str, birth_date: Option<&str>) {
        let mut obj = json!({ "user_id": user_id });
        if let Some(date) = birth_date {
            obj["birth_date"] = json!(date);
        }
        let request = CreateProfileRequest::from_json(obj.as_object().unwrap()).unwrap();
        create_profile(store, request).await.unwrap();
    }

    fn deps<'a>(store: &'a MemoryStore, analyzer: &'a CountingAnalyzer) -> ChatAnalysisDeps<'a> {
        ChatAnalysisDeps {
            store,
            analyzer,
            pillars: &SexagenaryCalculator,
            analyzer_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found_without_analysis() {
        let store = MemoryStore::new();
        let analyzer = CountingAnalyzer::default();

        let result = save_chat(&deps(&store, &analyzer), chat("nouser")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.chat_count().await, 0);
    }

    #[tokio::test]
    async fn test_pillars_from_birth_date() {
        let store = MemoryStore::new();
        let analyzer = CountingAnalyzer::default();
        seed_profile(&store, "u1", Some("1990-05-15")).await;

        let entry = save_chat(&deps(&store, &analyzer), chat("u1")).await.unwrap();
        assert_eq!(entry.analysis.big_five, SCORES);
        assert_eq!(entry.analysis.four_pillars["year"], "庚午");
        assert_eq!(entry.analysis.four_pillars["month"], "辛巳");
        assert_eq!(entry.analysis.four_pillars["day"], "庚辰");
        assert_eq!(store.chats_for("u1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_no_birth_date_stores_empty_pillars() {
        let store = MemoryStore::new();
        let analyzer = CountingAnalyzer::default();
        seed_profile(&store, "u1", None).await;

        let entry = save_chat(&deps(&store, &analyzer), chat("u1")).await.unwrap();
        assert_eq!(entry.analysis.four_pillars, json!({}));
    }

    #[tokio::test]
    async fn test_analyzer_failure_stores_nothing() {
        let store = MemoryStore::new();
        let analyzer = CountingAnalyzer { fail: true, ..Default::default() };
        seed_profile(&store, "u1", None).await;

        let result = save_chat(&deps(&store, &analyzer), chat("u1")).await;
        assert!(matches!(result, Err(AppError::Analysis(_))));
        assert_eq!(store.chat_count().await, 0);
    }
}
