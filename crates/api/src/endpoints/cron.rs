//! Scheduled job triggers.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, header},
    routing::get,
};
use fichajes_common::{AppError, AppResult};
use serde_json::{Value, json};

use crate::middleware::{ApiSettings, AppState};

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Without a configured secret only insecure mode lets a trigger through.
fn authorize(settings: &ApiSettings, headers: &HeaderMap) -> AppResult<()> {
    let token = bearer_token(headers);
    match settings.cron_secret.as_deref() {
        Some(secret) if token == Some(secret) => Ok(()),
        _ if settings.allow_insecure_cron => {
            tracing::warn!("Running reminders without a valid cron secret");
            Ok(())
        }
        Some(_) => Err(AppError::Unauthorized),
        None => Err(AppError::Forbidden(
            "Recordatorios deshabilitados: secreto de cron no configurado".to_string(),
        )),
    }
}

/// Run one shift reminder sweep.
async fn reminders(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<Value>> {
    authorize(&state.settings, &headers)?;

    let summary = state.reminders.sweep().await?;
    Ok(Json(json!({
        "success": true,
        "sent": summary.sent,
        "checked": summary.checked,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/reminders", get(reminders))
}
