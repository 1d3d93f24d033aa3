//! Web Push subscription and preference endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use fichajes_common::{AppError, AppResult};
use fichajes_core::{
    PreferencesUpdate, PushConfigResponse, PushSubscription, domain::de::value_to_string,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    extractors::{MaybeDolApiKey, UserAgent, UserIdHeader},
    middleware::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Option<String>,
}

/// Both the ERP token and a user id are required.
fn require_user(api_key: Option<String>, user_id: Option<String>) -> AppResult<String> {
    match (api_key, user_id.filter(|u| !u.is_empty())) {
        (Some(_), Some(user_id)) => Ok(user_id),
        _ => Err(AppError::Unauthorized),
    }
}

async fn list_subscriptions(
    MaybeDolApiKey(api_key): MaybeDolApiKey,
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<Vec<PushSubscription>>> {
    let user_id = require_user(api_key, query.user_id)?;
    Ok(Json(state.push.store().subscriptions_for_user(&user_id).await))
}

/// A subscription object is usable when it has an endpoint and both keys.
fn parse_subscription(body: &Value) -> Option<PushSubscription> {
    let subscription: PushSubscription = serde_json::from_value(body.clone()).ok()?;
    let complete = !subscription.endpoint.is_empty()
        && !subscription.keys.p256dh.is_empty()
        && !subscription.keys.auth.is_empty();
    complete.then_some(subscription)
}

async fn subscribe(
    MaybeDolApiKey(api_key): MaybeDolApiKey,
    UserIdHeader(user_id): UserIdHeader,
    UserAgent(user_agent): UserAgent,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let user_id = require_user(api_key, user_id)?;
    let subscription = parse_subscription(&body)
        .ok_or_else(|| AppError::BadRequest("Invalid subscription object".to_string()))?;

    state
        .push
        .store()
        .save_subscription(
            &user_id,
            subscription,
            Some(user_agent.unwrap_or_else(|| "unknown".to_string())),
        )
        .await?;

    tracing::info!(user_id = %user_id, "Push subscription saved");
    Ok(Json(json!({ "success": true })))
}

async fn public_key(State(state): State<AppState>) -> Json<PushConfigResponse> {
    Json(PushConfigResponse {
        available: state.push.is_enabled(),
        public_key: state.push.public_key().map(str::to_string),
    })
}

async fn get_preferences(
    MaybeDolApiKey(api_key): MaybeDolApiKey,
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<Value>> {
    let user_id = require_user(api_key, query.user_id)?;
    let prefs = state.push.store().preferences(&user_id).await;
    Ok(Json(serde_json::to_value(prefs)?))
}

async fn save_preferences(
    MaybeDolApiKey(api_key): MaybeDolApiKey,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let user_id = body.get("userId").and_then(value_to_string);
    let user_id = require_user(api_key, user_id)?;

    let prefs = state
        .push
        .store()
        .save_preferences(&user_id, PreferencesUpdate::from_json(&body))
        .await?;
    tracing::debug!(user_id = %user_id, ?prefs, "Notification preferences saved");
    Ok(Json(json!({ "success": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subscribe", get(list_subscriptions).post(subscribe))
        .route("/public-key", get(public_key))
        .route("/preferences", get(get_preferences).post(save_preferences))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subscription_requires_keys() {
        let ok = json!({
            "endpoint": "https://push.example/abc",
            "keys": {"p256dh": "BPk", "auth": "xyz"}
        });
        assert!(parse_subscription(&ok).is_some());

        let missing_auth = json!({"endpoint": "https://push.example/abc", "keys": {"p256dh": "BPk"}});
        assert!(parse_subscription(&missing_auth).is_none());

        let empty_endpoint = json!({"endpoint": "", "keys": {"p256dh": "BPk", "auth": "xyz"}});
        assert!(parse_subscription(&empty_endpoint).is_none());
    }

    #[test]
    fn test_require_user() {
        assert!(require_user(None, Some("1".to_string())).is_err());
        assert!(require_user(Some("k".to_string()), Some(String::new())).is_err());
        assert_eq!(
            require_user(Some("k".to_string()), Some("1".to_string())).ok(),
            Some("1".to_string())
        );
    }
}
