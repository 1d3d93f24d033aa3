//! Common utilities and shared types for the fichajes gateway.
//!
//! This crate provides foundational components used across all workspace crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//!
//! # Example
//!
//! ```no_run
//! use fichajes_common::{AppResult, Config};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     println!("Forwarding to {}", config.dolibarr.api_url);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;

pub use config::Config;
pub use error::{AppError, AppResult};
