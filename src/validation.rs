//! Request-body validation shared by every JSON endpoint.
//!
//! Each schema function takes the raw JSON object and returns a
//! [`Validated`] result: the typed payload, or every field error found.
//! Nothing here touches the store, so a rejected request never writes.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors};

pub type JsonObject = Map<String, Value>;

pub type Validated<T> = Result<T, FieldErrors>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Returns `value` if no error was collected.
    pub fn finish<T>(self, value: T) -> Validated<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);
        for (field, list) in fields {
            for error in list {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                out.push(field, message);
            }
        }
        out
    }
}

/// Runs the `validator` rules of a typed payload on top of the errors already
/// collected while extracting it. A field is reported at most once.
pub fn check<T: Validate>(payload: T, mut errors: FieldErrors) -> Validated<T> {
    if let Err(rule_errors) = payload.validate() {
        for error in FieldErrors::from(rule_errors).0 {
            if !errors.contains(&error.field) {
                errors.0.push(error);
            }
        }
    }
    errors.finish(payload)
}

/// Parses a request body into a non-empty JSON object.
pub fn parse_object(body: &[u8]) -> Validated<JsonObject> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(FieldErrors::single("body", "Request body is empty"));
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if map.is_empty() => {
            Err(FieldErrors::single("body", "Request body is empty"))
        }
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Err(FieldErrors::single("body", "Request body is empty")),
        Ok(_) => Err(FieldErrors::single("body", "Request body must be a JSON object")),
        Err(_) => Err(FieldErrors::single("body", "Request body must be valid JSON")),
    }
}

pub fn required_str(obj: &JsonObject, field: &str, errors: &mut FieldErrors) -> String {
    match obj.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            errors.push(field, format!("{} must be a string", field));
            String::new()
        }
        None => {
            errors.push(field, format!("{} is required", field));
            String::new()
        }
    }
}

pub fn optional_str(obj: &JsonObject, field: &str, errors: &mut FieldErrors) -> Option<String> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(field, format!("{} must be a string", field));
            None
        }
    }
}

pub fn optional_object(obj: &JsonObject, field: &str, errors: &mut FieldErrors) -> JsonObject {
    match obj.get(field) {
        None | Some(Value::Null) => JsonObject::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            errors.push(field, format!("{} must be an object", field));
            JsonObject::new()
        }
    }
}

/// Accepts RFC 3339 (`Z` or numeric offset, seconds optional), an offset-less
/// datetime down to hour precision, or a bare date. Offset-less forms are
/// read as UTC.
pub fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = match raw.strip_suffix('Z') {
        Some(rest) => format!("{}+00:00", rest),
        None => raw.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    if let Some(naive) = parse_hour_only(raw) {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// chrono needs a minute field to build a time, so `YYYY-MM-DDTHH` is split by hand.
fn parse_hour_only(raw: &str) -> Option<NaiveDateTime> {
    let (date, hour) = raw.split_once(|c: char| c == 'T' || c == ' ')?;
    if hour.len() != 2 || !hour.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(hour.parse().ok()?, 0, 0)
}

pub fn validate_birth_date(value: &str) -> Result<(), validator::ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| {
            let mut error = validator::ValidationError::new("birth_date");
            error.message = Some("birth_date must be a YYYY-MM-DD date".into());
            error
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_object_rejects_empty_inputs() {
        let bodies: [&[u8]; 4] = [b"", b"   ", b"{}", b"null"];
        for body in bodies {
            let errors = parse_object(body).unwrap_err();
            assert!(errors.contains("body"), "body {:?} should be rejected", body);
        }
    }

    #[test]
    fn test_parse_object_rejects_non_objects() {
        assert!(parse_object(b"[1,2]").is_err());
        assert!(parse_object(b"\"text\"").is_err());
        assert!(parse_object(b"{not json").is_err());
    }

    #[test]
    fn test_parse_object_accepts_object() {
        let map = parse_object(br#"{"user_id":"u1"}"#).unwrap();
        assert_eq!(map["user_id"], "u1");
    }

    #[test]
    fn test_required_str_reports_missing_and_wrong_type() {
        let data = obj(json!({ "user_id": 5 }));
        let mut errors = FieldErrors::new();
        required_str(&data, "user_id", &mut errors);
        required_str(&data, "action", &mut errors);

        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["user_id", "action"]);
        assert_eq!(errors.to_string(), "user_id must be a string; action is required");
    }

    #[test]
    fn test_optional_object_defaults_to_empty() {
        let data = obj(json!({ "personality": null }));
        let mut errors = FieldErrors::new();
        assert!(optional_object(&data, "personality", &mut errors).is_empty());
        assert!(optional_object(&data, "bazi_analysis", &mut errors).is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_parse_iso8601_variants() {
        let z = parse_iso8601("2024-03-01T12:30:00Z").unwrap();
        let offset = parse_iso8601("2024-03-01T21:30:00+09:00").unwrap();
        let naive = parse_iso8601("2024-03-01T12:30:00").unwrap();
        assert_eq!(z, offset);
        assert_eq!(z, naive);

        let date = parse_iso8601("2024-03-01").unwrap();
        assert_eq!(date.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_iso8601_reduced_precision() {
        let expected = parse_iso8601("2024-03-01T03:30:00Z").unwrap();
        assert_eq!(parse_iso8601("2024-03-01T12:30+09:00"), Some(expected));
        assert_eq!(parse_iso8601("2024-03-01 12:30+09:00"), Some(expected));
        assert_eq!(parse_iso8601("2024-03-01T03:30Z"), Some(expected));
        assert_eq!(parse_iso8601("2024-03-01 03:30"), Some(expected));

        let hour = parse_iso8601("2024-03-01T12").unwrap();
        assert_eq!(hour.to_rfc3339(), "2024-03-01T12:00:00+00:00");
        assert!(parse_iso8601("2024-03-01T25").is_none());
        assert!(parse_iso8601("2024-03-01T1").is_none());
    }

    #[test]
    fn test_parse_iso8601_rejects_garbage() {
        assert!(parse_iso8601("yesterday").is_none());
        assert!(parse_iso8601("2024-13-01").is_none());
        assert!(parse_iso8601("").is_none());
    }

    #[test]
    fn test_birth_date_rule() {
        assert!(validate_birth_date("1990-05-15").is_ok());
        assert!(validate_birth_date("15/05/1990").is_err());
    }
}
