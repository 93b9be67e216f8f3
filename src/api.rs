//! HTTP surface for the assistant.

use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::chat::order_status::FRONTEND_URL_PLACEHOLDER;
use crate::chat::types::{ChatReply, ChatRequest};
use crate::errors::AssistantError;
use crate::service::{AssistantService, ServiceState};

pub struct AppState {
    pub service: Arc<AssistantService>,
    pub frontend_url: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: ServiceState,
}

pub struct ApiError(AssistantError);

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AssistantError::NotReady(state) => {
                log::warn!("rejected chat request, assistant is {}", state);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "assistant is not ready".to_string(),
                )
            }
            other => {
                log::error!("chat request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "something went wrong, please try again later".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let origin = match HeaderValue::from_str(&state.frontend_url) {
        Ok(v) => AllowOrigin::exact(v),
        Err(_) => {
            log::warn!(
                "frontend url `{}` is not a valid origin, allowing any origin",
                state.frontend_url
            );
            AllowOrigin::any()
        }
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let history = req.history.unwrap_or_default();
    let reply = state
        .service
        .process_message(&req.message, req.user_id.as_deref(), &history)
        .await?;
    Ok(Json(ChatReply {
        reply: reply.replace(FRONTEND_URL_PLACEHOLDER, &state.frontend_url),
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let status = state.service.state();
    let code = if status == ServiceState::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(HealthResponse { status }))
}
