//! FAQ Dialog Server
//!
//! HTTP endpoints wrapping the dialog engine: the turn endpoint, health and
//! readiness checks, and Prometheus metrics.

pub mod http;
pub mod metrics;
pub mod settings;
pub mod state;

pub use http::create_router;
pub use settings::{load_settings, DialogSettings, ServerSettings, Settings};
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("unknown tenant: {0}")]
    UnknownTenant(String),

    #[error("startup error: {0}")]
    Startup(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::UnknownTenant(_) => StatusCode::NOT_FOUND,
            ServerError::Startup(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
