use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::chat_entry::SaveChatRequest;
use crate::services::chat::{self, ChatAnalysisDeps};
use crate::validation;
use crate::AppState;

pub async fn save_chat(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Value>)> {
    let request = SaveChatRequest::from_json(&validation::parse_object(&body)?)?;

    let analyzer = state.analyzer.as_deref().ok_or_else(|| {
        AppError::Unavailable("Personality analysis is not configured".into())
    })?;

    let deps = ChatAnalysisDeps {
        store: state.store.as_ref(),
        analyzer,
        pillars: state.pillars.as_ref(),
        analyzer_timeout: state.config.analyzer_timeout(),
    };
    let entry = chat::save_chat(&deps, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Chat saved", "analysis": entry.analysis })),
    ))
}
