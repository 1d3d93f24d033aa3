//! Correction request endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::Method,
    routing::{get, post},
};
use fichajes_common::AppResult;
use fichajes_core::{NotificationTopic, PushPayload, domain::correction_owner};
use serde::Deserialize;
use serde_json::Value;

use super::notify_user;
use crate::{
    extractors::{DolApiKey, ErpId},
    middleware::AppState,
    response::Relay,
};

const CORRECTIONS_PATH: &str = "/fichajestrabajadoresapi/corrections";

#[derive(Debug, Default, Deserialize)]
pub struct CorrectionsQuery {
    pub fk_user: Option<String>,
    pub estado: Option<String>,
}

async fn list(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    Query(query): Query<CorrectionsQuery>,
) -> AppResult<Json<Value>> {
    let params: Vec<(String, String)> = [("fk_user", query.fk_user), ("estado", query.estado)]
        .into_iter()
        .filter_map(|(k, v)| v.filter(|v| !v.is_empty()).map(|v| (k.to_string(), v)))
        .collect();

    let data = state
        .dolibarr
        .get_json(CORRECTIONS_PATH, &api_key, &params, "Error fetching corrections")
        .await?;
    Ok(Json(data))
}

async fn create(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Relay> {
    let response = state
        .dolibarr
        .send(Method::POST, CORRECTIONS_PATH, &api_key, &[], Some(&body))
        .await?;
    Ok(Relay::upstream(response, "Error creating correction"))
}

/// Decision taken on a correction.
#[derive(Debug, Clone, Copy)]
enum Decision {
    Approve,
    Reject,
}

impl Decision {
    const fn action(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }

    fn payload(self) -> PushPayload {
        let (title, body) = match self {
            Self::Approve => (
                "Solicitud Aprobada",
                "Tu solicitud de corrección de fichaje ha sido aprobada.",
            ),
            Self::Reject => (
                "Solicitud Rechazada",
                "Tu solicitud de corrección de fichaje ha sido rechazada.",
            ),
        };
        PushPayload::new(title, body).with_url("/fichajes/historial")
    }
}

/// Forward the decision, then tell the requester.
async fn decide(state: &AppState, api_key: &str, id: &str, decision: Decision) -> AppResult<Relay> {
    // Owner lookup failures are not fatal.
    let owner = match state.dolibarr.get(CORRECTIONS_PATH, api_key, &[]).await {
        Ok(response) if response.is_success() => correction_owner(&response.into_json(), id),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(correction_id = %id, error = %e, "Failed to look up correction owner");
            None
        }
    };
    if owner.is_none() {
        tracing::warn!(correction_id = %id, "Correction owner not found, skipping notification");
    }

    let response = state
        .dolibarr
        .send(
            Method::POST,
            &format!("{CORRECTIONS_PATH}/{id}/{}", decision.action()),
            api_key,
            &[],
            None,
        )
        .await?;

    if response.is_success() {
        tracing::info!(correction_id = %id, action = decision.action(), "Correction decided");
        if let Some(owner) = owner {
            notify_user(state, &owner, NotificationTopic::Cambios, &decision.payload()).await;
        }
    }

    Ok(Relay::upstream(response, "Error"))
}

async fn approve(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    ErpId(id): ErpId,
) -> AppResult<Relay> {
    decide(&state, &api_key, &id, Decision::Approve).await
}

async fn reject(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    ErpId(id): ErpId,
) -> AppResult<Relay> {
    decide(&state, &api_key, &id, Decision::Reject).await
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}/approve", post(approve))
        .route("/{id}/reject", post(reject))
}
