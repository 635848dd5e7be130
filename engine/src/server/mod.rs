//! HTTP surface
//!
//! # Endpoints
//!
//! - POST /chat - Start a quiz, answer it, or query where it stands
//! - GET /threads/:id - Full stored thread
//! - GET /health - Liveness and provider health
//!
//! Errors are returned as `{"detail": "..."}` with the status code taken from
//! `TutorErrorExt::status_code`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sdk::{ChatRequest, ChatResponse, ChatStatus, ErrorBody, TutorError, TutorErrorExt};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::llm::Message;
use crate::quiz::QuizWorkflow;

/// State shared across handlers
#[derive(Clone)]
struct AppState {
    workflow: Arc<QuizWorkflow>,
}

/// `TutorError` rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub TutorError);

impl From<TutorError> for ApiError {
    fn from(err: TutorError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(TutorError::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self.0);
        }

        (
            status,
            Json(ErrorBody {
                detail: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    provider: String,
    provider_healthy: bool,
}

#[derive(Debug, Serialize)]
struct ThreadResponse {
    thread_id: String,
    status: ChatStatus,
    messages: Vec<Message>,
    created_at: i64,
    updated_at: i64,
}

/// Build the router around a workflow
pub fn router(workflow: Arc<QuizWorkflow>, cors: bool) -> Router {
    let app = Router::new()
        .route("/chat", post(chat))
        .route("/threads/:id", get(thread))
        .route("/health", get(health))
        .with_state(AppState { workflow })
        .layer(TraceLayer::new_for_http());

    if cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Bind `addr` and serve until Ctrl+C
pub async fn serve(workflow: Arc<QuizWorkflow>, addr: SocketAddr, cors: bool) -> Result<(), TutorError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!("Tutor server listening on http://{}", local);

    axum::serve(listener, router(workflow, cors))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Tutor server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    let response = state.workflow.handle(&request).await?;
    Ok(Json(response))
}

async fn thread(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ThreadResponse>, ApiError> {
    let thread = state.workflow.thread(&id).await?;
    Ok(Json(ThreadResponse {
        thread_id: thread.id.clone(),
        status: thread.status(),
        messages: thread.messages,
        created_at: thread.created_at,
        updated_at: thread.updated_at,
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider = state.workflow.provider();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        provider: provider.name().to_string(),
        provider_healthy: provider.check_health().await,
    })
}
