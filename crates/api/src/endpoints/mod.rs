//! API endpoints.

mod auth;
mod centers;
mod company;
mod config;
mod corrections;
mod cron;
mod fichajes;
mod jornadas;
mod notifications;
mod users;
mod vacations;
mod web_push;

use axum::Router;
use fichajes_core::{NotificationTopic, PushPayload};

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/fichajes", fichajes::router())
        .nest("/corrections", corrections::router())
        .nest("/jornadas", jornadas::router())
        .nest("/vacations", vacations::router())
        .nest("/users", users::router())
        .nest("/centers", centers::router())
        .nest("/setupempresa", company::router())
        .nest("/notifications", notifications::router())
        .nest("/web-push", web_push::router())
        .nest("/cron", cron::router())
        .nest("/config", config::router())
}

/// Push `payload` to `user_id` if they allow `topic`. Failures are logged.
pub(crate) async fn notify_user(
    state: &AppState,
    user_id: &str,
    topic: NotificationTopic,
    payload: &PushPayload,
) {
    match state.push.notify_if_enabled(user_id, topic, payload).await {
        Ok(Some(summary)) => {
            tracing::info!(user_id = %user_id, sent = summary.sent, total = summary.total, "Notification sent");
        }
        Ok(None) => {}
        Err(e) => tracing::error!(user_id = %user_id, error = %e, "Failed to send notification"),
    }
}
