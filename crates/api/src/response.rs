//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fichajes_core::UpstreamResponse;
use serde_json::{Value, json};

/// A JSON body returned with an explicit status, usually mirrored from the ERP.
#[derive(Debug)]
pub struct Relay {
    pub status: StatusCode,
    pub body: Value,
}

impl Relay {
    /// `200` with `body`.
    #[must_use]
    pub const fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// Mirror the ERP's status and JSON body.
    ///
    /// Bodies that are not JSON become a generic acknowledgement on success
    /// and `{"error": ...}` otherwise.
    #[must_use]
    pub fn upstream(response: UpstreamResponse, fallback: &str) -> Self {
        let status = response.status;
        let body = if status.is_success() {
            response.json_or_ack()
        } else {
            let message = response.message();
            match response.into_json() {
                Value::Null => json!({ "error": message.unwrap_or_else(|| fallback.to_string()) }),
                body => body,
            }
        };
        Self { status, body }
    }
}

impl IntoResponse for Relay {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
