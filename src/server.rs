use crate::ai::provider::DEFAULT_TEMPERATURE;
use crate::error::TrinityError;
use crate::orchestrator::{Orchestrator, TrinityRequest, TrinityResult};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

/// Body of `POST /trinity/reason`.
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ReasonRequest {
    #[serde(flatten)]
    pub request: TrinityRequest,
    #[schemars(description = "Sampling temperature, 0.0 to 2.0. Defaults to 0.7.")]
    pub temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for TrinityError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::BAD_GATEWAY
        };
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/docs", get(docs))
        .route("/trinity/reason", post(reason))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), TrinityError> {
    let app = router(state);
    log::info!("🌐 Trinity Mind API listening on http://{addr} (docs at /docs)");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Trinity Mind API is running" }))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn reason(
    State(state): State<AppState>,
    body: Result<Json<ReasonRequest>, JsonRejection>,
) -> Result<Json<TrinityResult>, TrinityError> {
    let Json(body) = body.map_err(|rejection| TrinityError::InvalidInput(rejection.body_text()))?;
    let temperature = body.temperature.unwrap_or(DEFAULT_TEMPERATURE);
    let result = state.orchestrator.run(&body.request, temperature).await?;
    Ok(Json(result))
}

async fn docs() -> Json<Value> {
    Json(json!({
        "title": "Trinity Mind API",
        "version": env!("CARGO_PKG_VERSION"),
        "routes": [
            { "method": "GET", "path": "/", "description": "Liveness message." },
            { "method": "GET", "path": "/health", "description": "Plain-text health check." },
            { "method": "GET", "path": "/docs", "description": "This document." },
            {
                "method": "POST",
                "path": "/trinity/reason",
                "description": "Run Generate, Oppose and Synthesize for one topic.",
                "request": schema_for!(ReasonRequest),
                "response": schema_for!(TrinityResult),
            },
        ],
    }))
}
