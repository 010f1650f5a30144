/**
 * Project Routes
 * CRUD API endpoints for portfolio projects
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

use crate::db::models::{Project, ProjectInput};
use crate::db::ItemStore;
use crate::error::{conflict_as, ApiError};
use crate::routes::{
    auth::AdminSession, non_blank, required, sanitize_html, validate_slug, JsonBody, SuccessResponse,
};
use crate::state::AppState;

const SLUG_TAKEN: &str = "Slug already exists";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /api/projects
#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    pub featured: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub is_featured: Option<bool>,
}

impl ProjectRequest {
    fn into_input(self) -> Result<ProjectInput, ApiError> {
        let title = required(self.title, "Title")?;
        let slug = validate_slug(required(self.slug, "Slug")?)?;
        let description = required(self.description, "Description")?;

        Ok(ProjectInput {
            title,
            slug,
            description,
            content: self.content.map(|c| sanitize_html(&c)).unwrap_or_default(),
            image_url: non_blank(self.image_url),
            category: non_blank(self.category),
            github_url: non_blank(self.github_url),
            demo_url: non_blank(self.demo_url),
            is_featured: self.is_featured.unwrap_or(false),
        })
    }

    fn merge_into(self, existing: Project) -> Result<ProjectInput, ApiError> {
        let slug = match non_blank(self.slug) {
            Some(slug) => validate_slug(slug)?,
            None => existing.slug,
        };

        Ok(ProjectInput {
            title: non_blank(self.title).unwrap_or(existing.title),
            slug,
            description: non_blank(self.description).unwrap_or(existing.description),
            content: self
                .content
                .map(|c| sanitize_html(&c))
                .unwrap_or(existing.content),
            image_url: self.image_url.map_or(existing.image_url, |v| non_blank(Some(v))),
            category: self.category.map_or(existing.category, |v| non_blank(Some(v))),
            github_url: self.github_url.map_or(existing.github_url, |v| non_blank(Some(v))),
            demo_url: self.demo_url.map_or(existing.demo_url, |v| non_blank(Some(v))),
            is_featured: self.is_featured.unwrap_or(existing.is_featured),
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/projects - List projects, optionally only featured ones
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(state.store.list_projects(query.featured).await?))
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Project>, ApiError> {
    state
        .store
        .get_project(id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// GET /api/projects/slug/{slug}
pub async fn get_project_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Project>, ApiError> {
    let slug = validate_slug(slug)?;
    state
        .store
        .get_project_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// POST /api/projects (auth required)
pub async fn create_project(
    State(state): State<AppState>,
    AdminSession(user): AdminSession,
    WithRejection(Json(payload), _): JsonBody<ProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let input = payload.into_input()?;

    let project = state
        .store
        .create_project(&input)
        .await
        .map_err(conflict_as(SLUG_TAKEN))?;

    tracing::info!("Project {} created by {}", project.slug, user.username);
    Ok((StatusCode::CREATED, Json(project)))
}

/// PUT /api/projects/{id} (auth required)
pub async fn update_project(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    Path(id): Path<i64>,
    WithRejection(Json(payload), _): JsonBody<ProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    let existing = state
        .store
        .get_project(id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    let input = payload.merge_into(existing)?;

    state
        .store
        .update_project(id, &input)
        .await
        .map_err(conflict_as(SLUG_TAKEN))?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// DELETE /api/projects/{id} (auth required)
pub async fn delete_project(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if state.store.delete_project(id).await? {
        Ok(Json(SuccessResponse::ok()))
    } else {
        Err(ApiError::not_found())
    }
}
