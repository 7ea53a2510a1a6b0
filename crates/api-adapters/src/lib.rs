//! # api-adapters
//!
//! The web layer: form parsing, askama views, and (behind the
//! `web-axum` feature) the axum router with its handlers. Everything
//! here translates between HTTP and the services; no business rule
//! lives in this crate.

pub mod forms;
pub mod state;
pub mod views;

#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
mod session;

#[cfg(feature = "web-axum")]
pub use handlers::router;
