//! Clock event endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{Method, header},
    response::IntoResponse,
    routing::{get, post},
};
use fichajes_common::{AppError, AppResult};
use fichajes_core::domain::{
    Fichaje, FichajeTipo, FichajeView, clock_state, de::is_truthy, group_into_cycles,
    normalize_pending, timeline,
};
use fichajes_core::{encode_segment, export::cycles_to_csv};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{extractors::DolApiKey, middleware::AppState, response::Relay};

const FICHAJES_PATH: &str = "/fichajestrabajadoresapi/fichajes";

/// Listing filters, forwarded as-is.
#[derive(Debug, Default, Deserialize)]
pub struct FichajesQuery {
    pub sortfield: Option<String>,
    pub sortorder: Option<String>,
    pub limit: Option<String>,
    pub page: Option<String>,
    pub fk_user: Option<String>,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
}

impl FichajesQuery {
    fn to_upstream(&self) -> Vec<(String, String)> {
        let or = |v: &Option<String>, default: &str| {
            v.clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let mut query = vec![
            ("sortfield".to_string(), or(&self.sortfield, "f.rowid")),
            ("sortorder".to_string(), or(&self.sortorder, "DESC")),
            ("limit".to_string(), or(&self.limit, "1000")),
        ];
        let optional = [
            ("page", &self.page),
            ("fk_user", &self.fk_user),
            ("date_start", &self.date_start),
            ("date_end", &self.date_end),
        ];
        for (key, value) in optional {
            if let Some(value) = value.as_ref().filter(|v| !v.is_empty()) {
                query.push((key.to_string(), value.clone()));
            }
        }
        query
    }
}

async fn fetch_fichajes(
    state: &AppState,
    api_key: &str,
    query: &FichajesQuery,
) -> AppResult<Vec<Fichaje>> {
    let data = state
        .dolibarr
        .get_json(
            FICHAJES_PATH,
            api_key,
            &query.to_upstream(),
            "Error al obtener fichajes de Dolibarr",
        )
        .await?;

    Ok(match data {
        Value::Array(rows) => rows
            .into_iter()
            .filter_map(|row| serde_json::from_value(row).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// List clock events.
async fn list(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    Query(query): Query<FichajesQuery>,
) -> AppResult<Json<Value>> {
    let fichajes: Vec<FichajeView> = fetch_fichajes(&state, &api_key, &query)
        .await?
        .into_iter()
        .map(FichajeView::from)
        .collect();

    Ok(Json(json!({ "success": true, "fichajes": fichajes })))
}

/// Work cycles, clock state and timeline derived from the listing.
async fn cycles(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    Query(query): Query<FichajesQuery>,
) -> AppResult<Json<Value>> {
    let events = fetch_fichajes(&state, &api_key, &query).await?;
    let cycles = group_into_cycles(&events, state.dolibarr.now());

    Ok(Json(json!({
        "cycles": cycles,
        "state": clock_state(&cycles),
        "timeline": timeline(&cycles),
    })))
}

/// CSV report of the work cycles.
async fn export(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    Query(query): Query<FichajesQuery>,
) -> AppResult<impl IntoResponse> {
    let events = fetch_fichajes(&state, &api_key, &query).await?;
    let cycles = group_into_cycles(&events, state.dolibarr.now());
    let csv = cycles_to_csv(&cycles)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"reporte-fichajes.csv\"",
            ),
        ],
        csv,
    ))
}

#[derive(Debug, Deserialize)]
pub struct RegistrarRequest {
    pub tipo: Option<String>,
    pub usuario: Option<Value>,
    pub username: Option<Value>,
    pub observaciones: Option<String>,
    pub latitud: Option<Value>,
    pub longitud: Option<Value>,
}

/// Register a clock event for the key's owner.
async fn registrar(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    Json(req): Json<RegistrarRequest>,
) -> AppResult<Relay> {
    let tipo = req
        .tipo
        .as_deref()
        .and_then(|t| t.parse::<FichajeTipo>().ok())
        .ok_or_else(|| AppError::BadRequest("Tipo inválido".to_string()))?;

    let mut request_data = json!({ "observaciones": req.observaciones.unwrap_or_default() });
    if let (Some(lat), Some(lng)) = (&req.latitud, &req.longitud) {
        if is_truthy(lat) && is_truthy(lng) {
            request_data["latitud"] = lat.clone();
            request_data["longitud"] = lng.clone();
        }
    }

    tracing::info!(
        tipo = %tipo,
        usuario = ?req.usuario.as_ref().or(req.username.as_ref()),
        "Registering clock event"
    );

    let response = state
        .dolibarr
        .send(
            Method::POST,
            tipo.register_endpoint(),
            &api_key,
            &[],
            Some(&json!({ "request_data": request_data })),
        )
        .await?;

    if !response.is_success() {
        return Ok(Relay::upstream(response, "Error al registrar fichaje"));
    }
    Ok(Relay::ok(json!({ "success": true, "data": response.json_or_ack() })))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub id_user: Option<String>,
}

/// Audit history of clock events.
async fn history(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Value>> {
    let params: Vec<(String, String)> = query
        .id_user
        .filter(|id| !id.is_empty())
        .map(|id| ("id_user".to_string(), id))
        .into_iter()
        .collect();

    let data = state
        .dolibarr
        .get_json(
            "/fichajestrabajadoresapi/fichajes/history",
            &api_key,
            &params,
            "Error al obtener auditoría de Dolibarr",
        )
        .await?;
    Ok(Json(data))
}

/// Pending corrections, normalized for the approval dialog.
async fn pending(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
) -> AppResult<Json<Value>> {
    let data = state
        .dolibarr
        .get_json(
            "/fichajestrabajadoresapi/corrections",
            &api_key,
            &[("estado".to_string(), "pendiente".to_string())],
            "Error al obtener cambios pendientes",
        )
        .await?;

    Ok(Json(serde_json::to_value(normalize_pending(&data, state.dolibarr.timezone()))?))
}

async fn manual_alive() -> Json<Value> {
    Json(json!({ "message": "Manual API is alive" }))
}

/// Insert a full manual workday.
async fn manual(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Relay> {
    let response = state
        .dolibarr
        .send(
            Method::POST,
            "/fichajestrabajadoresapi/insertarJornadaManual",
            &api_key,
            &[],
            Some(&body),
        )
        .await?;

    if !response.is_success() {
        return Ok(Relay::upstream(response, "Error al insertar jornada manual"));
    }

    let data = response.json_or_ack();
    Ok(Relay::ok(json!({
        "success": true,
        "id_jornada": data.get("id_jornada"),
        "ids_fichajes": data.get("ids_fichajes"),
    })))
}

/// Accept or reject a correction from the clock screen.
async fn decide(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    Path((id, action)): Path<(String, String)>,
) -> AppResult<Relay> {
    let action = if action == "accept" { "approve" } else { "reject" };
    let response = state
        .dolibarr
        .send(
            Method::POST,
            &format!(
                "/fichajestrabajadoresapi/corrections/{}/{action}",
                encode_segment(&id)
            ),
            &api_key,
            &[],
            None,
        )
        .await?;

    Ok(Relay::upstream(response, "Error"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/cycles", get(cycles))
        .route("/export", get(export))
        .route("/registrar", post(registrar))
        .route("/history", get(history))
        .route("/pending", get(pending))
        .route("/manual", get(manual_alive).post(manual))
        .route("/{id}/{action}", post(decide))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults_and_optional_params() {
        let query = FichajesQuery {
            fk_user: Some("4".to_string()),
            page: Some(String::new()),
            ..FichajesQuery::default()
        };
        let pairs = query.to_upstream();
        let keys: Vec<_> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
        assert_eq!(
            keys,
            vec!["sortfield=f.rowid", "sortorder=DESC", "limit=1000", "fk_user=4"]
        );
    }
}
