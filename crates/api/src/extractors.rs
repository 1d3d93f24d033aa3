//! Request extractors.

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use fichajes_common::AppError;
use fichajes_core::{API_KEY_HEADER, encode_segment};

fn header_key(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// ERP token forwarded by the client in the `DOLAPIKEY` header.
#[derive(Debug, Clone)]
pub struct DolApiKey(pub String);

impl<S> FromRequestParts<S> for DolApiKey
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_key(parts).map(Self).ok_or(AppError::Unauthorized)
    }
}

/// Optional ERP token.
#[derive(Debug, Clone)]
pub struct MaybeDolApiKey(pub Option<String>);

impl<S> FromRequestParts<S> for MaybeDolApiKey
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(header_key(parts)))
    }
}

/// Value of the `User-Agent` header, if any.
#[derive(Debug, Clone)]
pub struct UserAgent(pub Option<String>);

impl<S> FromRequestParts<S> for UserAgent
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .headers
                .get(axum::http::header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(String::from),
        ))
    }
}

/// User id sent by the client in the `X-User-Id` header.
#[derive(Debug, Clone)]
pub struct UserIdHeader(pub Option<String>);

impl<S> FromRequestParts<S> for UserIdHeader
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .headers
                .get("x-user-id")
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        ))
    }
}

/// Single `{id}` path parameter, percent-encoded for use in an ERP path.
#[derive(Debug, Clone)]
pub struct ErpId(pub String);

impl<S> FromRequestParts<S> for ErpId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(Self(encode_segment(&id)))
    }
}
