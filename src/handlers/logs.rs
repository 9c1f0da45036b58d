use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::models::log_entry::{CreateLogRequest, LogPatch, LogView};
use crate::services::logs;
use crate::validation;
use crate::AppState;

pub async fn list_logs(State(state): State<AppState>) -> AppResult<Json<Vec<LogView>>> {
    let logs = logs::list_logs(state.store.as_ref()).await?;
    Ok(Json(logs))
}

pub async fn create_log(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Value>)> {
    let request = CreateLogRequest::from_json(&validation::parse_object(&body)?)?;
    let id = logs::record_action(state.store.as_ref(), &request.user_id, &request.action, "/log")
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Log saved", "id": id })),
    ))
}

pub async fn user_action(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Value>)> {
    let request = CreateLogRequest::from_json(&validation::parse_object(&body)?)?;
    let id = logs::record_action(
        state.store.as_ref(),
        &request.user_id,
        &request.action,
        "/user_action",
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("User {} performed '{}'", request.user_id, request.action),
            "id": id,
        })),
    ))
}

pub async fn update_log(
    State(state): State<AppState>,
    Path(log_id): Path<String>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    // The identifier is checked before the body is even parsed.
    let id = logs::parse_log_id(&log_id)?;
    let patch = LogPatch::from_json(&validation::parse_object(&body)?)?;

    logs::update_log(state.store.as_ref(), id, &patch).await?;
    Ok(Json(json!({ "message": format!("Log {} updated", id) })))
}

pub async fn delete_log(
    State(state): State<AppState>,
    Path(log_id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = logs::parse_log_id(&log_id)?;

    logs::delete_log(state.store.as_ref(), id).await?;
    Ok(Json(json!({ "message": format!("Log {} deleted", id) })))
}
