//! Dolibarr REST client.
//!
//! A thin request translator: it adds the `DOLAPIKEY` header, builds the
//! URL from the configured base, and hands back status plus decoded body.
//! Deciding what a non-2xx means is left to the caller.

use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

use fichajes_common::config::DolibarrConfig;
use fichajes_common::{AppError, AppResult};

/// Header carrying the user's ERP token.
pub const API_KEY_HEADER: &str = "DOLAPIKEY";

/// Error texts longer than this are not shown to users.
const MAX_TEXT_MESSAGE_LEN: usize = 200;

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    Json(Value),
    Text(String),
    Empty,
}

/// A response from the ERP.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: UpstreamBody,
}

impl UpstreamResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Human-readable message carried by an error body, if any.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match &self.body {
            UpstreamBody::Json(value) => {
                let from_error = match value.get("error") {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(err) => err.get("message").and_then(Value::as_str).map(str::to_string),
                    None => None,
                };
                from_error.or_else(|| value.get("message").and_then(Value::as_str).map(str::to_string))
            }
            UpstreamBody::Text(text) if text.len() < MAX_TEXT_MESSAGE_LEN => Some(text.clone()),
            UpstreamBody::Text(_) | UpstreamBody::Empty => None,
        }
    }

    /// Error keeping the upstream status, with `fallback` as the message and
    /// the ERP's own message as details.
    #[must_use]
    pub fn into_error(self, fallback: &str) -> AppError {
        AppError::Upstream {
            status: self.status.as_u16(),
            details: self.message(),
            message: fallback.to_string(),
        }
    }

    /// Error keeping the upstream status, preferring the ERP's own message.
    #[must_use]
    pub fn into_relayed_error(self, fallback: &str) -> AppError {
        let message = self.message().unwrap_or_else(|| fallback.to_string());
        AppError::upstream(self.status.as_u16(), message)
    }

    /// JSON body, or a generic success document when there is none.
    #[must_use]
    pub fn json_or_ack(self) -> Value {
        match self.body {
            UpstreamBody::Json(value) => value,
            UpstreamBody::Text(_) | UpstreamBody::Empty => {
                json!({ "success": true, "message": "Operación completada" })
            }
        }
    }

    /// Raw JSON body. Non-JSON bodies read as `null`.
    #[must_use]
    pub fn into_json(self) -> Value {
        match self.body {
            UpstreamBody::Json(value) => value,
            UpstreamBody::Text(_) | UpstreamBody::Empty => Value::Null,
        }
    }

    /// Success body, or the error built with [`Self::into_error`].
    pub fn ok_json(self, fallback: &str) -> AppResult<Value> {
        if self.is_success() {
            Ok(self.json_or_ack())
        } else {
            Err(self.into_error(fallback))
        }
    }
}

/// Client for the ERP REST API.
#[derive(Clone)]
pub struct DolibarrClient {
    http: reqwest::Client,
    base_url: String,
    admin_api_key: Option<String>,
    timezone: Tz,
}

impl DolibarrClient {
    /// Create a new client.
    pub fn new(config: &DolibarrConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {e}")))?;
        let timezone: Tz = config
            .timezone
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid ERP timezone: {e}")))?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            admin_api_key: config.admin_api_key.clone().filter(|k| !k.is_empty()),
            timezone,
        })
    }

    /// Zone of the ERP's wall-clock timestamps.
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Current wall-clock time in the ERP's zone.
    #[must_use]
    pub fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.timezone).naive_local()
    }

    /// Server-side key for flows without a user token.
    #[must_use]
    pub fn admin_api_key(&self) -> Option<&str> {
        self.admin_api_key.as_deref()
    }

    /// Admin key or an error when none is configured.
    pub fn require_admin_key(&self) -> AppResult<&str> {
        self.admin_api_key()
            .ok_or_else(|| AppError::Config("Admin API key not configured".to_string()))
    }

    /// Full URL for `path` with `query` appended.
    pub fn url(&self, path: &str, query: &[(String, String)]) -> AppResult<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| AppError::Config(format!("Invalid ERP URL: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Send a request and decode the response, whatever its status.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        api_key: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> AppResult<UpstreamResponse> {
        let url = self.url(path, query)?;
        tracing::debug!(%method, url = %url, "Forwarding to ERP");

        let mut request = self
            .http
            .request(method, url)
            .header(API_KEY_HEADER, api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("ERP request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to read ERP response: {e}")))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), path = %path, "ERP returned an error");
        }

        Ok(UpstreamResponse {
            status,
            body: decode_body(text),
        })
    }

    pub async fn get(
        &self,
        path: &str,
        api_key: &str,
        query: &[(String, String)],
    ) -> AppResult<UpstreamResponse> {
        self.send(Method::GET, path, api_key, query, None).await
    }

    /// `GET` that fails with [`UpstreamResponse::into_error`] on non-2xx.
    pub async fn get_json(
        &self,
        path: &str,
        api_key: &str,
        query: &[(String, String)],
        fallback: &str,
    ) -> AppResult<Value> {
        self.get(path, api_key, query).await?.ok_json(fallback)
    }

    /// Request with a JSON body that fails with [`UpstreamResponse::into_error`] on non-2xx.
    pub async fn send_json(
        &self,
        method: Method,
        path: &str,
        api_key: &str,
        body: &Value,
        fallback: &str,
    ) -> AppResult<Value> {
        self.send(method, path, api_key, &[], Some(body))
            .await?
            .ok_json(fallback)
    }
}

/// Percent-encode one path segment so it cannot add segments or a query.
#[must_use]
pub fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Encode every segment of a relative path. Dot segments are refused.
pub fn encode_path(path: &str) -> AppResult<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment {
            "." | ".." => Err(AppError::BadRequest("Ruta inválida".to_string())),
            segment => Ok(encode_segment(segment)),
        })
        .collect::<AppResult<Vec<_>>>()
        .map(|segments| segments.join("/"))
}

fn decode_body(text: String) -> UpstreamBody {
    if text.trim().is_empty() {
        return UpstreamBody::Empty;
    }
    match serde_json::from_str(&text) {
        Ok(value) => UpstreamBody::Json(value),
        Err(_) => UpstreamBody::Text(text),
    }
}
