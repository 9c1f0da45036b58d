use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{self, FieldErrors, JsonObject, Validated};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    pub personality: Value,
    pub bazi_analysis: Value,
    pub additional_analysis: Value,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUserProfile {
    pub user_id: String,
    pub name: String,
    pub birth_date: Option<String>,
    pub personality: JsonObject,
    pub bazi_analysis: JsonObject,
    pub additional_analysis: JsonObject,
    pub last_updated: DateTime<Utc>,
}

impl NewUserProfile {
    pub fn into_profile(self, id: Uuid) -> UserProfile {
        UserProfile {
            id,
            user_id: self.user_id,
            name: self.name,
            birth_date: self.birth_date,
            personality: Value::Object(self.personality),
            bazi_analysis: Value::Object(self.bazi_analysis),
            additional_analysis: Value::Object(self.additional_analysis),
            last_updated: self.last_updated,
        }
    }
}

/// GET|POST /orsa/user_profile
#[derive(Debug, Clone, Validate)]
pub struct CreateProfileRequest {
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,

    #[validate(length(max = 200, message = "name must be at most 200 characters"))]
    pub name: String,

    /// YYYY-MM-DD; used for the four pillars of later chat analyses.
    #[validate(custom = "crate::validation::validate_birth_date")]
    pub birth_date: Option<String>,

    pub personality: JsonObject,
    pub bazi_analysis: JsonObject,
    pub additional_analysis: JsonObject,
}

impl CreateProfileRequest {
    pub fn from_json(obj: &JsonObject) -> Validated<Self> {
        let mut errors = FieldErrors::new();
        let request = Self {
            user_id: validation::required_str(obj, "user_id", &mut errors),
            name: validation::optional_str(obj, "name", &mut errors).unwrap_or_default(),
            birth_date: validation::optional_str(obj, "birth_date", &mut errors),
            personality: validation::optional_object(obj, "personality", &mut errors),
            bazi_analysis: validation::optional_object(obj, "bazi_analysis", &mut errors),
            additional_analysis: validation::optional_object(
                obj,
                "additional_analysis",
                &mut errors,
            ),
        };
        validation::check(request, errors)
    }

    pub fn into_new_profile(self, now: DateTime<Utc>) -> NewUserProfile {
        NewUserProfile {
            user_id: self.user_id,
            name: self.name,
            birth_date: self.birth_date,
            personality: self.personality,
            bazi_analysis: self.bazi_analysis,
            additional_analysis: self.additional_analysis,
            last_updated: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let req = CreateProfileRequest::from_json(&obj(json!({"user_id": "u1"}))).unwrap();
        assert_eq!(req.name, "");
        assert!(req.birth_date.is_none());
        assert!(req.personality.is_empty());
        assert!(req.bazi_analysis.is_empty());
        assert!(req.additional_analysis.is_empty());
    }

    #[test]
    fn test_user_id_required_and_non_empty() {
        let missing = CreateProfileRequest::from_json(&obj(json!({"name": "Aki"}))).unwrap_err();
        assert!(missing.contains("user_id"));
        assert_eq!(missing.iter().count(), 1);

        let empty = CreateProfileRequest::from_json(&obj(json!({"user_id": ""}))).unwrap_err();
        assert_eq!(empty.to_string(), "user_id is required");
    }

    #[test]
    fn test_mapping_fields_must_be_objects() {
        let errors = CreateProfileRequest::from_json(&obj(json!({
            "user_id": "u1",
            "personality": "calm",
            "bazi_analysis": [1, 2]
        })))
        .unwrap_err();
        assert!(errors.contains("personality"));
        assert!(errors.contains("bazi_analysis"));
        assert!(!errors.contains("additional_analysis"));
    }

    #[test]
    fn test_birth_date_format_checked() {
        let errors = CreateProfileRequest::from_json(&obj(json!({
            "user_id": "u1",
            "birth_date": "May 15 1990"
        })))
        .unwrap_err();
        assert!(errors.contains("birth_date"));

        let ok = CreateProfileRequest::from_json(&obj(json!({
            "user_id": "u1",
            "birth_date": "1990-05-15"
        })));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_profile_serializes_id_as_string() {
        let id = Uuid::new_v4();
        let profile = CreateProfileRequest::from_json(&obj(json!({"user_id": "u1"})))
            .unwrap()
            .into_new_profile(Utc::now())
            .into_profile(id);
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["id"], id.to_string());
        assert_eq!(json["personality"], json!({}));
        assert!(json.get("birth_date").is_none());
    }
}
