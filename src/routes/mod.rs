/**
 * Routes Module
 * API, page and feed handlers
 */
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::seo::route::is_valid_slug;

pub mod auth;
pub mod blog;
pub mod contact;
pub mod content;
pub mod feeds;
pub mod health;
pub mod meta;
pub mod pages;
pub mod projects;
pub mod waitlist;

/// JSON request body whose rejections render as an `ApiError`.
pub type JsonBody<T> = WithRejection<Json<T>, ApiError>;

/// JSON error body shared by every API handler.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Trims a field and drops it when blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    non_blank(value).ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))
}

pub(crate) fn validate_slug(slug: String) -> Result<String, ApiError> {
    if is_valid_slug(&slug) {
        Ok(slug)
    } else {
        Err(ApiError::BadRequest(
            "Invalid slug: use only lowercase letters, numbers, and hyphens".to_string(),
        ))
    }
}

/// Sanitize HTML content using ammonia
pub(crate) fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::{net::SocketAddr, sync::Arc};

    use axum::{
        body::{Body, Bytes},
        extract::connect_info::MockConnectInfo,
        http::{Request, StatusCode},
        Router,
    };
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::db::{MemoryStore, UserStore};
    use crate::state::{AppState, DEFAULT_SHELL};

    pub const TEST_PASSWORD: &str = "correct-horse";

    pub fn test_state() -> AppState {
        let mut config = AppConfig::default();
        config.auth.session_secret = "test-secret".to_string();
        config.site.name = "Site".to_string();
        config.site.url = "https://acme.dev".to_string();
        AppState::new(Arc::new(MemoryStore::new()), config, DEFAULT_SHELL)
    }

    /// State whose Postgres store points at a closed port, so every query fails.
    pub fn unreachable_store_state() -> AppState {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .unwrap();
        let mut state = test_state();
        state.store = Arc::new(crate::db::PgStore::new(pool));
        state
    }

    pub fn test_app(state: AppState) -> Router {
        crate::create_app(state).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 12345))))
    }

    /// Creates an admin user and returns a `Cookie` header value for it.
    pub async fn session_cookie(state: &AppState) -> String {
        let hash = bcrypt::hash(TEST_PASSWORD, 4).unwrap();
        let user = state.store.create_user("admin", &hash).await.unwrap();
        let token = super::auth::issue_session_token(&state.config.auth, &user).unwrap();
        format!("{}={}", super::auth::SESSION_COOKIE, token)
    }

    pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, Bytes) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }

    pub fn json_request(
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        json: &impl serde::Serialize,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        builder
            .body(Body::from(serde_json::to_vec(json).unwrap()))
            .unwrap()
    }

    pub fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        builder.body(Body::empty()).unwrap()
    }
}
