//! User endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::Method,
    routing::get,
};
use fichajes_common::AppResult;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    extractors::{DolApiKey, ErpId},
    middleware::AppState,
};

/// Only active users are listed.
const ACTIVE_FILTER: &str = "(t.statut:=:1)";

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_limit")]
    pub limit: String,
}

fn default_limit() -> String {
    "100".to_string()
}

async fn list(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<Json<Value>> {
    let params = [
        ("limit".to_string(), query.limit),
        ("sqlfilters".to_string(), ACTIVE_FILTER.to_string()),
    ];
    let data = state
        .dolibarr
        .get_json("/users", &api_key, &params, "Error al obtener usuarios")
        .await?;
    Ok(Json(data))
}

async fn show(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    ErpId(id): ErpId,
) -> AppResult<Json<Value>> {
    let data = state
        .dolibarr
        .get_json(&format!("/users/{id}"), &api_key, &[], "Error al obtener usuario")
        .await?;
    Ok(Json(data))
}

async fn update(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    ErpId(id): ErpId,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let data = state
        .dolibarr
        .send_json(
            Method::PUT,
            &format!("/users/{id}"),
            &api_key,
            &body,
            "Error al actualizar usuario",
        )
        .await?;
    tracing::info!(user_id = %id, "User updated");
    Ok(Json(json!({ "success": true, "data": data })))
}

/// Per-user settings kept by the time-tracking module.
async fn get_config(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    ErpId(id): ErpId,
) -> AppResult<Json<Value>> {
    let data = state
        .dolibarr
        .get_json(
            &format!("/fichajestrabajadoresapi/userconfig/{id}"),
            &api_key,
            &[],
            "Error",
        )
        .await?;
    Ok(Json(data))
}

async fn set_config(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    ErpId(id): ErpId,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let data = state
        .dolibarr
        .send_json(
            Method::POST,
            &format!("/fichajestrabajadoresapi/users/{id}/config"),
            &api_key,
            &body,
            "Error",
        )
        .await?;
    Ok(Json(data))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(show).put(update))
        .route("/{id}/config", get(get_config).post(set_config))
}
