//! Rendering HTTP service.
//!
//! This crate provides:
//! - `POST /concat` (alias `/stitch`) and `POST /slate`
//! - Liveness, health and Prometheus endpoints
//! - A typed client for pipeline workers

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod service;
pub mod state;

pub use client::{ClientError, RenderClient, RenderClientConfig};
pub use config::RenderConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use service::RenderService;
pub use state::AppState;
