//! Client feature flags.

use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};

use crate::middleware::AppState;

async fn logout_after_clock(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "enabled": state.settings.logout_after_clock }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/logout-after-clock", get(logout_after_clock))
}
