/**
 * Contact Routes
 * Public contact form plus admin inbox
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

use crate::db::models::{ContactMessage, NewContactMessage};
use crate::db::SubmissionStore;
use crate::error::ApiError;
use crate::routes::{auth::AdminSession, non_blank, waitlist::is_valid_email, JsonBody, SuccessResponse};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub is_read: bool,
}

/// POST /api/contact - Public contact form
pub async fn submit_message(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<ContactRequest>,
) -> Result<(StatusCode, Json<ContactMessage>), ApiError> {
    let (Some(name), Some(email), Some(message)) = (
        non_blank(payload.name),
        non_blank(payload.email),
        non_blank(payload.message),
    ) else {
        return Err(ApiError::BadRequest(
            "Name, email and message are required".to_string(),
        ));
    };

    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("Invalid email format".to_string()));
    }

    let saved = state
        .store
        .create_contact_message(&NewContactMessage {
            name,
            email,
            subject: non_blank(payload.subject),
            message,
        })
        .await?;

    tracing::info!("Contact message #{} received", saved.id);
    Ok((StatusCode::CREATED, Json(saved)))
}

/// GET /api/contact (auth required)
pub async fn list_messages(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
) -> Result<Json<Vec<ContactMessage>>, ApiError> {
    Ok(Json(state.store.list_contact_messages().await?))
}

/// PUT /api/contact/{id} - Mark read or unread (auth required)
pub async fn mark_read(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    Path(id): Path<i64>,
    WithRejection(Json(payload), _): JsonBody<MarkReadRequest>,
) -> Result<Json<ContactMessage>, ApiError> {
    state
        .store
        .set_contact_message_read(id, payload.is_read)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// DELETE /api/contact/{id} (auth required)
pub async fn delete_message(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if state.store.delete_contact_message(id).await? {
        Ok(Json(SuccessResponse::ok()))
    } else {
        Err(ApiError::not_found())
    }
}
