use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::models::user_profile::{CreateProfileRequest, UserProfile};
use crate::services::profiles;
use crate::validation;
use crate::AppState;

/// Served on both GET and POST; either verb creates a profile.
pub async fn create_profile(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Value>)> {
    let request = CreateProfileRequest::from_json(&validation::parse_object(&body)?)?;
    let id = profiles::create_profile(state.store.as_ref(), request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User profile saved", "id": id.to_string() })),
    ))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<UserProfile>> {
    let profile = profiles::get_profile(state.store.as_ref(), &user_id).await?;
    Ok(Json(profile))
}
