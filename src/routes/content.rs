/**
 * Page Content Routes
 * Free-form JSON content per page, including its `metadata` block
 */
use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::models::PageContent;
use crate::db::PageStore;
use crate::error::ApiError;
use crate::routes::{auth::AdminSession, non_blank, JsonBody, SuccessResponse};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpsertContentRequest {
    pub page: Option<String>,
    pub content: Option<Value>,
}

/// GET /api/content - List all page content
pub async fn list_content(State(state): State<AppState>) -> Result<Json<Vec<PageContent>>, ApiError> {
    Ok(Json(state.store.list_pages().await?))
}

/// GET /api/content/{page}
pub async fn get_content(
    State(state): State<AppState>,
    Path(page): Path<String>,
) -> Result<Json<PageContent>, ApiError> {
    state
        .store
        .get_page(&page)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// POST /api/content - Create or replace a page's content (auth required)
pub async fn upsert_content(
    State(state): State<AppState>,
    AdminSession(user): AdminSession,
    WithRejection(Json(payload), _): JsonBody<UpsertContentRequest>,
) -> Result<Json<PageContent>, ApiError> {
    let (Some(page), Some(content)) = (
        non_blank(payload.page),
        payload.content.filter(|c| !c.is_null()),
    ) else {
        return Err(ApiError::BadRequest(
            "Page and content are required".to_string(),
        ));
    };

    let saved = state.store.upsert_page(&page, &content).await?;
    tracing::info!("Page content {} updated by {}", page, user.username);
    Ok(Json(saved))
}

/// DELETE /api/content/{page} (auth required)
pub async fn delete_content(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    Path(page): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if state.store.delete_page(&page).await? {
        Ok(Json(SuccessResponse::ok()))
    } else {
        Err(ApiError::not_found())
    }
}
