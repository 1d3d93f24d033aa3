//! Vacation endpoints.
//!
//! Everything under `/vacations` is forwarded to the ERP vacation module,
//! except the overlap check which is answered here.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::Method,
    routing::{get, post},
};
use fichajes_common::{AppError, AppResult};
use fichajes_core::{
    NotificationTopic, PushPayload,
    domain::{
        VacationRequest, check_overlap,
        de::{self, value_to_string},
        parse_day, working_days,
    },
    encode_path,
};
use serde::Deserialize;
use serde_json::{Value, json};
use validator::Validate;

use super::notify_user;
use crate::{extractors::DolApiKey, middleware::AppState, response::Relay};

const VACACIONES_PATH: &str = "/fichajestrabajadoresapi/vacaciones";
const USERS_PATH: &str = "/users";

/// Last path segments that decide a request.
const DECISION_SEGMENTS: [&str; 4] = ["approve", "aprobar", "reject", "rechazar"];

fn query_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .into_owned()
            .collect()
    })
    .unwrap_or_default()
}

fn is_approval(segment: &str) -> bool {
    matches!(segment, "approve" | "aprobar")
}

async fn forward(
    state: AppState,
    api_key: String,
    method: Method,
    path: &str,
    raw_query: Option<&str>,
    body: &Bytes,
) -> AppResult<Relay> {
    let path = encode_path(path)?;
    let upstream_path = if path.is_empty() {
        VACACIONES_PATH.to_string()
    } else {
        format!("{VACACIONES_PATH}/{path}")
    };
    let json_body: Option<Value> = if method == Method::GET || body.is_empty() {
        None
    } else {
        serde_json::from_slice(body).ok()
    };

    tracing::debug!(%method, path = %upstream_path, "Proxying vacation request");
    let response = state
        .dolibarr
        .send(
            method.clone(),
            &upstream_path,
            &api_key,
            &query_pairs(raw_query),
            json_body.as_ref(),
        )
        .await?;

    if !response.is_success() {
        return Err(response.into_relayed_error("Error en la petición a Dolibarr"));
    }

    if method == Method::POST {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if let [.., vacation_id, action] = segments.as_slice() {
            if DECISION_SEGMENTS.contains(action) {
                let approved = is_approval(action);
                let vacation_id = (*vacation_id).to_string();
                tokio::spawn(notify_decision(state, api_key, vacation_id, approved));
            }
        }
    }

    Ok(Relay::ok(response.json_or_ack()))
}

/// ERP user id for `login`, looked up in the users listing.
async fn user_id_for_login(state: &AppState, api_key: &str, login: &str) -> AppResult<Option<String>> {
    if login.contains(['\'', '(', ')']) {
        return Ok(None);
    }
    let query = [("sqlfilters".to_string(), format!("(t.login:=:'{login}')"))];
    let response = state.dolibarr.get(USERS_PATH, api_key, &query).await?;
    // The users listing answers 404 when nothing matches.
    if !response.is_success() {
        return Ok(None);
    }

    let users = response.into_json();
    Ok(users
        .as_array()
        .and_then(|users| {
            users
                .iter()
                .find(|u| u.get("login").and_then(Value::as_str) == Some(login))
        })
        .and_then(|user| user.get("id"))
        .and_then(value_to_string)
        .filter(|id| !id.is_empty()))
}

/// Requester of a vacation row: `fk_user` when present, else the `usuario` login resolved to an id.
async fn vacation_owner(state: &AppState, api_key: &str, details: &Value) -> AppResult<Option<String>> {
    if let Some(user_id) = details
        .get("fk_user")
        .and_then(value_to_string)
        .filter(|u| !u.is_empty() && u != "0")
    {
        return Ok(Some(user_id));
    }
    match details
        .get("usuario")
        .and_then(value_to_string)
        .filter(|u| !u.is_empty())
    {
        Some(login) => user_id_for_login(state, api_key, &login).await,
        None => Ok(None),
    }
}

/// Tell the requester about a decision. Runs detached from the request.
async fn notify_decision(state: AppState, api_key: String, vacation_id: String, approved: bool) {
    let details = match state
        .dolibarr
        .get(&format!("{VACACIONES_PATH}/{vacation_id}"), &api_key, &[])
        .await
    {
        Ok(response) if response.is_success() => response.into_json(),
        Ok(response) => {
            tracing::warn!(vacation_id = %vacation_id, status = response.status.as_u16(), "Vacation lookup failed");
            return;
        }
        Err(e) => {
            tracing::error!(vacation_id = %vacation_id, error = %e, "Background notification error");
            return;
        }
    };

    let user_id = match vacation_owner(&state, &api_key, &details).await {
        Ok(Some(user_id)) => user_id,
        Ok(None) => {
            tracing::warn!(vacation_id = %vacation_id, "Vacation requester not found, skipping notification");
            return;
        }
        Err(e) => {
            tracing::error!(vacation_id = %vacation_id, error = %e, "Background notification error");
            return;
        }
    };

    let action = if approved { "Aprobada" } else { "Rechazada" };
    let payload = PushPayload::new(
        format!("Vacaciones {action}"),
        format!("Tu solicitud de vacaciones ha sido {}.", action.to_lowercase()),
    )
    .with_url("/vacaciones");

    notify_user(&state, &user_id, NotificationTopic::Vacaciones, &payload).await;
}

async fn proxy_root(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> AppResult<Relay> {
    forward(state, api_key, method, "", query.as_deref(), &body).await
}

async fn proxy(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> AppResult<Relay> {
    forward(state, api_key, method, &path, query.as_deref(), &body).await
}

/// Overlap check input. `usuario` is the requester's login, which is what
/// vacation rows are keyed by.
#[derive(Debug, Deserialize, Validate)]
pub struct OverlapRequest {
    #[validate(length(min = 1, message = "fecha_inicio es obligatoria"))]
    pub fecha_inicio: String,
    #[validate(length(min = 1, message = "fecha_fin es obligatoria"))]
    pub fecha_fin: String,
    #[validate(length(min = 1, message = "usuario es obligatorio"))]
    #[serde(default, deserialize_with = "de::string")]
    pub usuario: String,
}

/// Check a requested range against the user's existing requests.
async fn check_overlap_handler(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    Json(req): Json<OverlapRequest>,
) -> AppResult<Json<Value>> {
    req.validate()?;

    let (Some(start), Some(end)) = (parse_day(&req.fecha_inicio), parse_day(&req.fecha_fin)) else {
        return Err(AppError::BadRequest("Fechas inválidas".to_string()));
    };
    if end < start {
        return Err(AppError::BadRequest(
            "La fecha de fin no puede ser anterior a la de inicio".to_string(),
        ));
    }

    let params = [("usuario".to_string(), req.usuario.clone())];
    let data = state
        .dolibarr
        .get_json(VACACIONES_PATH, &api_key, &params, "Error al obtener vacaciones")
        .await?;
    let existing: Vec<VacationRequest> = match data {
        Value::Array(rows) => rows
            .into_iter()
            .filter_map(|row| serde_json::from_value::<VacationRequest>(row).ok())
            .filter(|r| r.usuario.as_deref().is_none_or(|u| u == req.usuario))
            .collect(),
        _ => Vec::new(),
    };

    let conflict = check_overlap(start, end, &existing);
    Ok(Json(json!({
        "overlap": conflict.is_some(),
        "conflict": conflict,
        "working_days": working_days(start, end),
    })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/check-overlap", post(check_overlap_handler))
        .route("/", get(proxy_root).post(proxy_root).delete(proxy_root))
        .route("/{*path}", get(proxy).post(proxy).delete(proxy))
}
