//! Core logic for the fichajes gateway.
//!
//! [`domain`] holds the ERP data model and the pure derivations built on it
//! (work cycles, vacation overlap, pull-to-refresh). [`services`] holds
//! everything that does I/O.

pub mod domain;
pub mod export;
pub mod services;

pub use services::*;
