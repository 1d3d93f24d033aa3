//! Read state of in-app notifications.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use fichajes_common::{AppError, AppResult};
use fichajes_core::domain::de::value_to_string;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::middleware::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadQuery {
    pub user_id: Option<String>,
}

async fn list_read(
    State(state): State<AppState>,
    Query(query): Query<ReadQuery>,
) -> AppResult<Json<Vec<String>>> {
    let user_id = query
        .user_id
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::BadRequest("User ID required".to_string()))?;

    Ok(Json(state.read_notifications.read_ids(&user_id).await))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub user_id: Option<Value>,
    pub notification_ids: Option<Vec<Value>>,
}

async fn mark_read(
    State(state): State<AppState>,
    Json(req): Json<MarkReadRequest>,
) -> AppResult<Json<Value>> {
    let user_id = req
        .user_id
        .as_ref()
        .and_then(value_to_string)
        .filter(|u| !u.is_empty());
    let (Some(user_id), Some(ids)) = (user_id, req.notification_ids) else {
        return Err(AppError::BadRequest("Invalid data".to_string()));
    };

    let ids: Vec<String> = ids.iter().filter_map(value_to_string).collect();
    state.read_notifications.mark_as_read(&user_id, &ids).await?;
    Ok(Json(json!({ "success": true })))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/read", get(list_read).post(mark_read))
}
