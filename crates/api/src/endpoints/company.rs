//! Company setup endpoints.

use axum::{
    Json, Router,
    extract::State,
    http::Method,
    routing::get,
};
use fichajes_common::{AppError, AppResult};
use serde::Deserialize;
use serde_json::Value;
use validator::{Validate, ValidateEmail, ValidateUrl, ValidationError};

use crate::{extractors::DolApiKey, middleware::AppState};

const SETUP_PATH: &str = "/setupempresaapi";
const LEGACY_SETUP_PATH: &str = "/setupempresa";

/// Fields of the company payload that are checked before forwarding.
/// Everything else is passed through untouched.
#[derive(Debug, Deserialize, Validate)]
pub struct CompanySetupCheck {
    #[validate(length(min = 1, message = "El nombre de la empresa es obligatorio"))]
    #[serde(default)]
    pub name: String,
    #[validate(custom(function = "validate_email_if_present"))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_url_if_present"))]
    pub url: Option<String>,
}

fn validate_email_if_present(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_email() {
        Ok(())
    } else {
        Err(ValidationError::new("email").with_message("Email inválido".into()))
    }
}

fn validate_url_if_present(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_url() {
        Ok(())
    } else {
        Err(ValidationError::new("url").with_message("URL inválida".into()))
    }
}

async fn show(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
) -> AppResult<Json<Value>> {
    let response = state.dolibarr.get(SETUP_PATH, &api_key, &[]).await?;
    if response.is_success() {
        return Ok(Json(response.json_or_ack()));
    }

    tracing::debug!(status = response.status.as_u16(), "Falling back to legacy setup path");
    let data = state
        .dolibarr
        .get_json(LEGACY_SETUP_PATH, &api_key, &[], "Error al obtener setup de Dolibarr")
        .await?;
    Ok(Json(data))
}

async fn update(
    DolApiKey(api_key): DolApiKey,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let check: CompanySetupCheck = serde_json::from_value(body.clone())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    check.validate()?;

    let data = state
        .dolibarr
        .send_json(
            Method::PUT,
            SETUP_PATH,
            &api_key,
            &body,
            "Error al actualizar setup en Dolibarr",
        )
        .await?;
    tracing::info!("Company setup updated");
    Ok(Json(data))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(show).put(update))
}
