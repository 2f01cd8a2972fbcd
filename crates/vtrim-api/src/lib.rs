//! Axum HTTP API server.
//!
//! This crate provides:
//! - Video upload endpoint that stores the blob and dispatches a
//!   processing job
//! - Task status polling
//! - Liveness and readiness probes

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
