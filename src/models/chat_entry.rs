use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::validation::{self, FieldErrors, JsonObject, Validated};

/// Big Five trait scores, each in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BigFiveScores {
    pub openness: f64,
    pub conscientiousness: f64,
    pub extraversion: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
}

impl BigFiveScores {
    pub fn is_in_range(&self) -> bool {
        [
            self.openness,
            self.conscientiousness,
            self.extraversion,
            self.agreeableness,
            self.neuroticism,
        ]
        .iter()
        .all(|s| (0.0..=1.0).contains(s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnalysis {
    pub big_five: BigFiveScores,
    /// `{year, month, day}`, `{}` without a birth date, `{error}` if unreadable.
    pub four_pillars: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEntry {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub conversation: String,
    pub analysis: ChatAnalysis,
}

/// POST /chat-history
#[derive(Debug, Clone, Validate)]
pub struct SaveChatRequest {
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,

    #[validate(length(min = 1, message = "conversation is required"))]
    pub conversation: String,
}

impl SaveChatRequest {
    pub fn from_json(obj: &JsonObject) -> Validated<Self> {
        let mut errors = FieldErrors::new();
        let request = Self {
            user_id: validation::required_str(obj, "user_id", &mut errors),
            conversation: validation::required_str(obj, "conversation", &mut errors),
        };
        validation::check(request, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_chat_requires_both_fields() {
        let obj = json!({"user_id": "u1"}).as_object().cloned().unwrap();
        let errors = SaveChatRequest::from_json(&obj).unwrap_err();
        assert!(errors.contains("conversation"));
        assert!(!errors.contains("user_id"));
    }

    #[test]
    fn test_save_chat_rejects_blank_conversation() {
        let obj = json!({"user_id": "u1", "conversation": ""}).as_object().cloned().unwrap();
        let errors = SaveChatRequest::from_json(&obj).unwrap_err();
        assert_eq!(errors.to_string(), "conversation is required");
    }

    #[test]
    fn test_big_five_range() {
        let mut scores = BigFiveScores {
            openness: 0.85,
            conscientiousness: 0.65,
            extraversion: 0.4,
            agreeableness: 0.7,
            neuroticism: 0.45,
        };
        assert!(scores.is_in_range());
        scores.neuroticism = 1.2;
        assert!(!scores.is_in_range());
    }
}
