use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::validation::{self, FieldErrors, JsonObject, Validated};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LogEntry {
    pub id: Uuid,
    pub user_id: String,
    pub action: String,
    #[sqlx(rename = "logged_at")]
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
}

/// Listing shape: the store identifier is not exposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogView {
    pub user_id: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
}

impl From<LogEntry> for LogView {
    fn from(entry: LogEntry) -> Self {
        Self {
            user_id: entry.user_id,
            action: entry.action,
            timestamp: entry.timestamp,
            endpoint: entry.endpoint,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub user_id: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
}

/// POST /log and POST /user_action
#[derive(Debug, Clone, PartialEq)]
pub struct CreateLogRequest {
    pub user_id: String,
    pub action: String,
}

impl CreateLogRequest {
    pub fn from_json(obj: &JsonObject) -> Validated<Self> {
        let mut errors = FieldErrors::new();
        let user_id = validation::required_str(obj, "user_id", &mut errors);
        let action = validation::required_str(obj, "action", &mut errors);
        errors.finish(Self { user_id, action })
    }
}

/// PUT /log/{id}: only the supplied fields change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogPatch {
    pub user_id: Option<String>,
    pub action: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl LogPatch {
    pub const FIELDS: [&'static str; 3] = ["action", "user_id", "timestamp"];

    pub fn from_json(obj: &JsonObject) -> Validated<Self> {
        let mut errors = FieldErrors::new();
        let mut patch = LogPatch::default();

        for (key, value) in obj {
            match key.as_str() {
                "action" | "user_id" => match value.as_str() {
                    Some(s) if key == "action" => patch.action = Some(s.to_string()),
                    Some(s) => patch.user_id = Some(s.to_string()),
                    None => errors.push(key, format!("{} must be a string", key)),
                },
                "timestamp" => match value.as_str().and_then(validation::parse_iso8601) {
                    Some(ts) => patch.timestamp = Some(ts),
                    None => errors.push(key, "timestamp must be an ISO 8601 datetime"),
                },
                other => errors.push(other, format!("{} is not an updatable field", other)),
            }
        }

        if errors.is_empty() && patch.is_empty() {
            errors.push("body", "No fields to update");
        }
        errors.finish(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.action.is_none() && self.timestamp.is_none()
    }

    pub fn apply(&self, entry: &mut LogEntry) {
        if let Some(user_id) = &self.user_id {
            entry.user_id = user_id.clone();
        }
        if let Some(action) = &self.action {
            entry.action = action.clone();
        }
        if let Some(timestamp) = self.timestamp {
            entry.timestamp = timestamp;
        }
    }
}
