//! Work shift endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{Method, StatusCode},
    routing::{get, put},
};
use fichajes_common::AppResult;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    extractors::{DolApiKey, ErpId},
    middleware::AppState,
};

const JORNADAS_PATH: &str = "/fichajestrabajadoresapi/jornadas";

#[derive(Debug, Default, Deserialize)]
pub struct JornadasQuery {
    pub user_id: Option<String>,
}

async fn list(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    Query(query): Query<JornadasQuery>,
) -> AppResult<Json<Value>> {
    let params: Vec<(String, String)> = query
        .user_id
        .filter(|id| !id.is_empty())
        .map(|id| ("user_id".to_string(), id))
        .into_iter()
        .collect();

    let response = state.dolibarr.get(JORNADAS_PATH, &api_key, &params).await?;
    // The ERP answers 404 when a user has no shifts.
    if response.status == StatusCode::NOT_FOUND {
        return Ok(Json(json!([])));
    }
    Ok(Json(response.ok_json("Error fetching shifts")?))
}

async fn create(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let data = state
        .dolibarr
        .send_json(Method::POST, JORNADAS_PATH, &api_key, &body, "Error creating shift")
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
            &format!("{JORNADAS_PATH}/{id}"),
            &api_key,
            &body,
            "Error updating shift",
        )
        .await?;
    Ok(Json(data))
}

async fn delete(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    ErpId(id): ErpId,
) -> AppResult<Json<Value>> {
    let data = state
        .dolibarr
        .send(Method::DELETE, &format!("{JORNADAS_PATH}/{id}"), &api_key, &[], None)
        .await?
        .ok_json("Error deleting shift")?;
    Ok(Json(data))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", put(update).delete(delete))
}
