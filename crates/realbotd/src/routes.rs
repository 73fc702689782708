//! API routes for realbotd
//!
//! Chat routes live under /api/chat, admin routes under /api. Every error
//! answers with `{"error": "<message>"}`.

use crate::knowledge::parse_update;
use crate::server::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use realbot_shared::analytics::AnalyticsSummary;
use realbot_shared::error::{RealbotError, StoreError};
use realbot_shared::knowledge::KnowledgeBase;
use realbot_shared::session::{ContactDetails, Message, UserData};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

type AppStateArc = Arc<AppState>;

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

impl From<RealbotError> for ErrorResponse {
    fn from(err: RealbotError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

fn from_realbot_error(err: RealbotError) -> ApiError {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(err)))
}

fn rejected_body(rejection: JsonRejection) -> ApiError {
    from_realbot_error(RealbotError::InvalidRequest(rejection.body_text()))
}

/// Body of a request addressed to an existing session. The session is
/// resolved first so an unknown id is a 404 whatever the body holds.
async fn session_body<T>(
    state: &AppState,
    id: &str,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    if !state.sessions.contains(id).await {
        return Err(from_realbot_error(RealbotError::SessionNotFound(
            id.to_string(),
        )));
    }
    body.map(|Json(value)| value).map_err(rejected_body)
}

// ============================================================================
// Chat Routes
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub user_data: UserData,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
    pub user_data: UserData,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub success: bool,
    pub user_data: UserData,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub session_id: String,
    pub conversation: Vec<Message>,
    pub user_data: UserData,
}

pub fn chat_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/chat/session", post(create_session))
        .route("/api/chat/session/:id", get(get_session))
        .route("/api/chat/session/:id/message", post(send_message))
        .route("/api/chat/session/:id/contact", post(update_contact))
        .route("/api/chat/session/:id/conversation", get(get_conversation))
}

async fn create_session(State(state): State<AppStateArc>) -> Json<SessionResponse> {
    let session = state.sessions.create().await;
    Json(SessionResponse {
        session_id: session.id,
        user_data: session.user_data,
    })
}

async fn get_session(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
) -> Json<SessionResponse> {
    let session = state.sessions.get_or_create(&id).await;
    Json(SessionResponse {
        session_id: session.id,
        user_data: session.user_data,
    })
}

async fn send_message(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
    body: Result<Json<MessageRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let req = session_body(&state, &id, body).await?;
    let reply = state
        .sessions
        .send_message(&id, &req.message)
        .await
        .map_err(from_realbot_error)?;

    Ok(Json(MessageResponse {
        message: reply.message,
        user_data: reply.user_data,
    }))
}

async fn update_contact(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
    body: Result<Json<ContactDetails>, JsonRejection>,
) -> Result<Json<ContactResponse>, ApiError> {
    let details = session_body(&state, &id, body).await?;
    let user_data = state
        .sessions
        .set_contact_info(&id, details)
        .await
        .map_err(from_realbot_error)?;

    Ok(Json(ContactResponse {
        success: true,
        user_data,
    }))
}

async fn get_conversation(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let conversation = state
        .sessions
        .conversation(&id)
        .await
        .map_err(from_realbot_error)?;

    Ok(Json(ConversationResponse {
        session_id: id,
        conversation: conversation.entries,
        user_data: conversation.user_data,
    }))
}

// ============================================================================
// Admin Routes
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub sessions: usize,
}

pub fn admin_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/analytics", get(get_analytics))
        .route("/api/knowledge", get(get_knowledge).post(update_knowledge))
        .route("/api/health", get(health))
}

async fn get_analytics(
    State(state): State<AppStateArc>,
) -> Result<Json<AnalyticsSummary>, ApiError> {
    let analytics = Arc::clone(&state.analytics);
    let summary = tokio::task::spawn_blocking(move || analytics.summary())
        .await
        .unwrap_or_else(|e| Err(StoreError::Unavailable(e.to_string())));

    summary.map(Json).map_err(|e| {
        error!("Error retrieving analytics: {}", e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to retrieve analytics data",
        )
    })
}

async fn get_knowledge(State(state): State<AppStateArc>) -> Json<KnowledgeBase> {
    Json(state.knowledge.document().await)
}

async fn update_knowledge(
    State(state): State<AppStateArc>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(payload) = body
        .map_err(|rejection| from_realbot_error(RealbotError::Validation(rejection.body_text())))?;
    let entries = parse_update(&payload).map_err(from_realbot_error)?;
    let count = entries.len();

    state.knowledge.replace(entries).await.map_err(|e| {
        error!("Error updating knowledge base: {}", e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to update knowledge base",
        )
    })?;

    info!("Knowledge base updated via API ({} entries)", count);
    Ok(Json(SuccessResponse { success: true }))
}

async fn health(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        version: realbot_shared::VERSION.to_string(),
        sessions: state.sessions.len().await,
    })
}
