/**
 * Blog Routes
 * CRUD API endpoints for blog posts
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

use crate::db::models::{BlogPost, BlogPostInput};
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

/// Request body for POST /api/blog and PUT /api/blog/{id}.
///
/// Every field is optional so a PUT can patch a subset; create enforces the
/// required ones itself.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub author: Option<String>,
}

impl BlogPostRequest {
    fn into_input(self) -> Result<BlogPostInput, ApiError> {
        let title = required(self.title, "Title")?;
        let slug = validate_slug(required(self.slug, "Slug")?)?;
        let content = required(self.content, "Content")?;

        Ok(BlogPostInput {
            title,
            slug,
            excerpt: non_blank(self.excerpt).unwrap_or_default(),
            content: sanitize_html(&content),
            image_url: non_blank(self.image_url),
            author: non_blank(self.author),
        })
    }

    fn merge_into(self, existing: BlogPost) -> Result<BlogPostInput, ApiError> {
        let slug = match non_blank(self.slug) {
            Some(slug) => validate_slug(slug)?,
            None => existing.slug,
        };

        Ok(BlogPostInput {
            title: non_blank(self.title).unwrap_or(existing.title),
            slug,
            excerpt: self.excerpt.map(|e| e.trim().to_string()).unwrap_or(existing.excerpt),
            content: self
                .content
                .map(|c| sanitize_html(&c))
                .unwrap_or(existing.content),
            image_url: self.image_url.map_or(existing.image_url, |v| non_blank(Some(v))),
            author: self.author.map_or(existing.author, |v| non_blank(Some(v))),
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/blog - List blog posts, newest first
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<BlogPost>>, ApiError> {
    Ok(Json(state.store.list_blog_posts().await?))
}

/// GET /api/blog/{id} - Get single blog post by id
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BlogPost>, ApiError> {
    state
        .store
        .get_blog_post(id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// GET /api/blog/slug/{slug} - Get single blog post by slug
pub async fn get_post_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    let slug = validate_slug(slug)?;
    state
        .store
        .get_blog_post_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// POST /api/blog - Create new blog post (auth required)
pub async fn create_post(
    State(state): State<AppState>,
    AdminSession(user): AdminSession,
    WithRejection(Json(payload), _): JsonBody<BlogPostRequest>,
) -> Result<(StatusCode, Json<BlogPost>), ApiError> {
    let input = payload.into_input()?;

    let post = state
        .store
        .create_blog_post(&input)
        .await
        .map_err(conflict_as(SLUG_TAKEN))?;

    tracing::info!("Blog post {} created by {}", post.slug, user.username);
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/blog/{id} - Update blog post (auth required)
pub async fn update_post(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    Path(id): Path<i64>,
    WithRejection(Json(payload), _): JsonBody<BlogPostRequest>,
) -> Result<Json<BlogPost>, ApiError> {
    let existing = state
        .store
        .get_blog_post(id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    let input = payload.merge_into(existing)?;

    state
        .store
        .update_blog_post(id, &input)
        .await
        .map_err(conflict_as(SLUG_TAKEN))?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

/// DELETE /api/blog/{id} - Delete blog post (auth required)
pub async fn delete_post(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if state.store.delete_blog_post(id).await? {
        Ok(Json(SuccessResponse::ok()))
    } else {
        Err(ApiError::not_found())
    }
}
