//! HTTP Endpoints
//!
//! REST API for the dialog manager. Keyword extraction happens upstream; the
//! turn endpoint receives the already-detected keyword set alongside the raw
//! user text.

use axum::{
    extract::{Json, Path, State},
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use faq_dialog_config::ConfigError;
use faq_dialog_core::{SlotKey, TenantRef};
use faq_dialog_engine::{DialogError, TurnRequest, TurnResponse};

use crate::metrics::{metrics_handler, record_active_conversations, record_turn, record_turn_error};
use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(
        &state.settings.server.cors_origins,
        state.settings.server.cors_enabled,
    );

    Router::new()
        // Dialog turn endpoint
        .route("/api/dialog/:conversation_id", post(dialog_turn))
        // Health checks
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins.
///
/// Disabled means permissive (development only); an empty or fully invalid
/// origin list falls back to localhost:3000.
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed.is_empty() {
        tracing::info!("no usable CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static("http://localhost:3000"))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed.len());
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Turn request body
#[derive(Debug, Deserialize)]
struct TurnBody {
    /// Project (tenant) name
    project: String,
    /// Project version
    version: String,
    /// Slot keys detected in the user's utterance
    #[serde(default)]
    keywords: Vec<SlotKey>,
    /// Raw user text, used to seed new conversations via the predictor
    #[serde(default)]
    text: Option<String>,
}

/// Dialog turn endpoint
async fn dialog_turn(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Json(body): Json<TurnBody>,
) -> Result<Json<TurnResponse>, ServerError> {
    let request = TurnRequest {
        conversation_id,
        tenant: TenantRef::new(body.project, body.version),
        detected: body.keywords.into_iter().collect(),
        raw_text: body.text,
    };

    match state.controller.process(request).await {
        Ok(outcome) => {
            record_turn(outcome.done);
            record_active_conversations(state.controller.states().count());
            Ok(Json(outcome.response))
        }
        Err(DialogError::Config(ConfigError::NotFound(tenant))) => {
            record_turn_error();
            tracing::warn!(%tenant, "turn for unknown tenant");
            Err(ServerError::UnknownTenant(tenant.to_string()))
        }
        Err(e) => {
            record_turn_error();
            tracing::error!("dialog turn failed: {}", e);
            Err(ServerError::Internal(e.to_string()))
        }
    }
}

/// Health check
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ready",
        "active_conversations": state.controller.states().count(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use faq_dialog_config::SlotConfigStore;
    use faq_dialog_engine::DialogController;
    use std::sync::Arc;

    fn app_state() -> AppState {
        let mut configs = SlotConfigStore::new();
        configs
            .register_document(
                TenantRef::new("who-faq", "v1"),
                r#"{
                    "required": ["Vaccine"],
                    "Vaccine": ["What vaccine are you talking about ?", "none, polio"],
                    "Catch All": "Anything else ?"
                }"#,
                None,
            )
            .unwrap();
        let controller = Arc::new(DialogController::new(Arc::new(configs)));
        AppState::new(controller, Settings::default())
    }

    #[test]
    fn test_router_creation() {
        let _ = create_router(app_state());
    }

    #[tokio::test]
    async fn test_dialog_turn_handler() {
        let state = app_state();

        let response = dialog_turn(
            State(state),
            Path("c1".to_string()),
            Json(TurnBody {
                project: "who-faq".to_string(),
                version: "v1".to_string(),
                keywords: vec![],
                text: None,
            }),
        )
        .await
        .unwrap();

        assert!(response.0.ask_more_question);
        assert_eq!(response.0.conversation_id, "c1");
    }

    #[tokio::test]
    async fn test_dialog_turn_unknown_tenant_is_404() {
        use axum::http::StatusCode;

        let state = app_state();

        let err = dialog_turn(
            State(state),
            Path("c1".to_string()),
            Json(TurnBody {
                project: "nobody".to_string(),
                version: "v1".to_string(),
                keywords: vec![],
                text: None,
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ServerError::UnknownTenant(_)));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_server_error_status_codes() {
        use axum::http::StatusCode;

        assert_eq!(
            ServerError::UnknownTenant("p/v".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServerError::Startup("no recorder".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
