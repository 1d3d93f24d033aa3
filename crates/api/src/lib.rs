//! HTTP API layer for the fichajes gateway.
//!
//! - **Endpoints**: one module per ERP resource plus the local stores
//! - **Extractors**: the forwarded `DOLAPIKEY` header
//! - **Middleware**: shared application state
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{ApiSettings, AppState};
