//! HTTP surface: routing, request parsing and error-to-status mapping.

use std::any::Any;
use std::net::SocketAddr;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info, info_span};
use uuid::Uuid;

use crate::error::{PredictError, ValidationError};
use crate::models::{BatchItemResponse, PredictionOutput, SingleResponse};
use crate::orchestrator::{Mode, Orchestrator};

pub const HEALTH_PATH: &str = "/health";
pub const PREDICT_PATH: &str = "/predict-gaya-belajar";
pub const PREDICT_BATCH_PATH: &str = "/predict-gaya-belajar/batch";

#[derive(Clone)]
pub struct AppState {
    orchestrator: Orchestrator,
}

pub fn router(orchestrator: Orchestrator) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(PREDICT_PATH, post(predict_single))
        .route(PREDICT_BATCH_PATH, post(predict_batch))
        .with_state(AppState { orchestrator })
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            info_span!(
                "http",
                request_id = %Uuid::new_v4(),
                method = %request.method(),
                path = %request.uri().path()
            )
        }))
}

pub async fn serve(addr: SocketAddr, orchestrator: Orchestrator) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router(orchestrator))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
}

/// The model is loaded before the listener is bound, so reaching this
/// handler means it is ready.
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "model": "loaded" }))
}

async fn predict_single(State(state): State<AppState>, body: Bytes) -> Response {
    handle(&state.orchestrator, &body, Mode::Single)
}

async fn predict_batch(State(state): State<AppState>, body: Bytes) -> Response {
    handle(&state.orchestrator, &body, Mode::Batch)
}

fn handle(orchestrator: &Orchestrator, body: &[u8], mode: Mode) -> Response {
    let outcome = serde_json::from_slice::<Value>(body)
        .map_err(|err| PredictError::from(ValidationError::InvalidJson(err.to_string())))
        .and_then(|value| orchestrator.parse_request(value, mode))
        .and_then(|request| orchestrator.run(&request));

    match outcome {
        Ok(PredictionOutput::Single(result)) => Json(SingleResponse::from(&result)).into_response(),
        Ok(PredictionOutput::Batch(results)) => {
            let items: Vec<BatchItemResponse<'_>> = results.iter().map(Into::into).collect();
            Json(items).into_response()
        }
        Err(err) => err.into_response(),
    }
}

impl PredictError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PredictError::Validation(_) => StatusCode::BAD_REQUEST,
            PredictError::Prediction(_) | PredictError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else if let Some(text) = panic.downcast_ref::<&str>() {
        text.to_string()
    } else {
        "internal error".to_string()
    };
    PredictError::Internal(message).into_response()
}
