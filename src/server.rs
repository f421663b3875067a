use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;
use tokio::task;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::AppConfig,
    error::ServiceError,
    model::{GenerationRequest, GenerationResponse, ModelStore, generate_text},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<ModelStore>,
}

pub fn build_router(config: Arc<AppConfig>, store: Arc<ModelStore>) -> Router {
    let state = AppState { config, store };

    Router::new()
        .route("/", get(root))
        .route("/docs", get(docs))
        .route("/health", get(health))
        .route("/generate", post(generate))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // open CORS policy, local/demo use only
        .layer(CorsLayer::very_permissive())
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Legal LLM API is running",
        "docs": "/docs",
        "generate": "/generate",
    }))
}

async fn docs() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "title": "Legal LLM API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "GET /": "service banner",
            "GET /health": "reports whether the model is loaded, never loads it",
            "POST /generate": {
                "request": {
                    "prompt": "string, required, non-empty",
                    "max_length": "int, default 200, range [10, 1000]",
                    "temperature": "float, default 0.8, range [0.1, 2.0]",
                    "top_p": "float, default 0.9",
                    "top_k": "int, default 50",
                },
                "response": {
                    "generated_text": "prompt followed by the continuation",
                    "prompt": "echo of the request prompt",
                    "parameters": "the merged generation parameters",
                },
            },
        },
    }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model_loaded: state.store.is_loaded(),
    })
}

async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GenerationResponse>, ServiceError> {
    request.validate()?;

    let store = state.store.clone();
    let response = task::spawn_blocking(move || {
        let backend = store.ensure_loaded()?;
        generate_text(backend.as_ref(), &request)
    })
    .await
    // last-resort net for a panicked or cancelled generation task
    .map_err(|err| ServiceError::Other(format!("generation task failed: {err}")))??;

    Ok(Json(response))
}
