//! Session info and self-registration.

use axum::{
    Json, Router,
    extract::State,
    http::{Method, StatusCode},
    routing::{get, post},
};
use fichajes_common::AppResult;
use fichajes_core::{
    UpstreamBody,
    domain::de::{self, value_to_string},
    encode_segment,
};
use serde::Deserialize;
use serde_json::{Value, json};
use validator::Validate;

use crate::{extractors::DolApiKey, middleware::AppState, response::Relay};

/// Current user as seen by the ERP.
async fn me(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
) -> AppResult<Json<Value>> {
    let data = state
        .dolibarr
        .get_json(
            "/fichajestrabajadoresapi/info",
            &api_key,
            &[],
            "Error fetching user info",
        )
        .await?;
    Ok(Json(data))
}

/// Self-registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1))]
    #[serde(default, deserialize_with = "de::string")]
    pub firstname: String,
    #[validate(length(min = 1))]
    #[serde(default, deserialize_with = "de::string")]
    pub lastname: String,
    #[validate(length(min = 1))]
    #[serde(default, deserialize_with = "de::string")]
    pub login: String,
    #[validate(length(min = 1))]
    #[serde(default, deserialize_with = "de::string")]
    pub password: String,
    pub email: Option<String>,
    #[serde(default)]
    pub center_ids: Vec<Value>,
}

fn failure(status: StatusCode, message: impl Into<String>) -> Relay {
    Relay {
        status,
        body: json!({ "success": false, "message": message.into() }),
    }
}

/// Id of a freshly created user: `{ "id": .. }` or the bare value.
fn created_user_id(data: &Value) -> Option<String> {
    match data {
        Value::Object(_) => data.get("id").and_then(value_to_string),
        Value::Array(_) => None,
        other => value_to_string(other),
    }
    .filter(|id| !id.is_empty())
}

/// Create an employee account with the server key.
async fn register(State(state): State<AppState>, Json(req): Json<RegisterRequest>) -> AppResult<Relay> {
    if req.validate().is_err() {
        return Ok(failure(StatusCode::BAD_REQUEST, "Faltan campos obligatorios"));
    }

    let Some(admin_key) = state.dolibarr.admin_api_key() else {
        tracing::error!("Registration attempted without an admin API key configured");
        return Ok(failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error de configuración del servidor",
        ));
    };

    let payload = json!({
        "firstname": req.firstname,
        "lastname": req.lastname,
        "login": req.login,
        "email": req.email,
        "password": req.password,
        "employee": 1,
        "admin": 0,
    });
    let response = state
        .dolibarr
        .send(
            Method::POST,
            "/setupusuariosapi/crearUsuario",
            admin_key,
            &[],
            Some(&payload),
        )
        .await?;

    let status = response.status;
    let data = match response.body {
        UpstreamBody::Json(data) => data,
        UpstreamBody::Text(_) | UpstreamBody::Empty => {
            tracing::error!(status = status.as_u16(), "ERP returned a non-JSON body on registration");
            let relayed = if status == StatusCode::OK {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                status
            };
            return Ok(failure(
                relayed,
                format!("Error del servidor Dolibarr ({})", status.as_u16()),
            ));
        }
    };

    if !status.is_success() {
        let message = data
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .or_else(|| data.get("message").and_then(Value::as_str))
            .unwrap_or("Error al crear usuario");
        return Ok(failure(status, message));
    }

    tracing::info!(login = %req.login, "User registered");

    if !req.center_ids.is_empty() {
        assign_centers(&state, admin_key, &data, &req.center_ids).await;
    }

    Ok(Relay::ok(json!({ "success": true, "data": data })))
}

/// Store the chosen work centers on the new user. Failures are logged only.
async fn assign_centers(state: &AppState, admin_key: &str, data: &Value, center_ids: &[Value]) {
    let Some(user_id) = created_user_id(data) else {
        return;
    };
    let ids: Vec<String> = center_ids.iter().filter_map(value_to_string).collect();
    let value = ids.join(",");
    tracing::info!(user_id = %user_id, centers = %value, "Assigning centers to new user");

    let result = state
        .dolibarr
        .send(
            Method::POST,
            &format!(
                "/fichajestrabajadoresapi/users/{}/config",
                encode_segment(&user_id)
            ),
            admin_key,
            &[],
            Some(&json!({ "param_name": "work_centers_ids", "value": value })),
        )
        .await;

    match result {
        Ok(response) if response.is_success() => {}
        Ok(response) => {
            tracing::error!(user_id = %user_id, status = response.status.as_u16(), "Error assigning centers to new user");
        }
        Err(e) => tracing::error!(user_id = %user_id, error = %e, "Error assigning centers to new user"),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/register", post(register))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_created_user_id_shapes() {
        assert_eq!(created_user_id(&json!(42)), Some("42".to_string()));
        assert_eq!(created_user_id(&json!({"id": "7"})), Some("7".to_string()));
        assert_eq!(created_user_id(&json!("")), None);
    }

    #[test]
    fn test_missing_fields_fail_validation() {
        let req: RegisterRequest =
            serde_json::from_value(json!({"firstname": "Ana", "login": "ana"})).unwrap();
        assert!(req.validate().is_err());
    }
}
