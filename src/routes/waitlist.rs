/**
 * Waitlist Routes
 * Public signup plus admin listing
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::db::models::{NewWaitlistEntry, WaitlistEntry};
use crate::db::SubmissionStore;
use crate::error::{conflict_as, ApiError};
use crate::routes::{auth::AdminSession, non_blank, JsonBody, SuccessResponse};
use crate::state::AppState;

lazy_static::lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_REGEX.is_match(email)
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct JoinWaitlistRequest {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// POST /api/waitlist - Public signup
pub async fn join_waitlist(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<JoinWaitlistRequest>,
) -> Result<(StatusCode, Json<WaitlistEntry>), ApiError> {
    let email = non_blank(payload.email)
        .map(|e| e.to_lowercase())
        .filter(|e| is_valid_email(e))
        .ok_or_else(|| ApiError::BadRequest("A valid email is required".to_string()))?;

    let entry = state
        .store
        .create_waitlist_entry(&NewWaitlistEntry {
            email,
            name: non_blank(payload.name),
        })
        .await
        .map_err(conflict_as("Email already on the waitlist"))?;

    tracing::info!("Waitlist signup #{}", entry.id);
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/waitlist (auth required)
pub async fn list_waitlist(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
) -> Result<Json<Vec<WaitlistEntry>>, ApiError> {
    Ok(Json(state.store.list_waitlist().await?))
}

/// DELETE /api/waitlist/{id} (auth required)
pub async fn delete_waitlist_entry(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if state.store.delete_waitlist_entry(id).await? {
        Ok(Json(SuccessResponse::ok()))
    } else {
        Err(ApiError::not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{
        empty_request, json_request, send, session_cookie, test_app, test_state,
    };
    use crate::routes::ErrorResponse;

    fn signup(email: &str) -> JoinWaitlistRequest {
        JoinWaitlistRequest {
            email: Some(email.to_string()),
            name: None,
        }
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
    }

    #[tokio::test]
    async fn test_signup_flow() {
        let state = test_state();

        let (status, _) = send(
            test_app(state.clone()),
            json_request("POST", "/api/waitlist", None, &signup("bad")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            test_app(state.clone()),
            json_request("POST", "/api/waitlist", None, &signup("Me@Example.com")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        // Emails are compared case-insensitively.
        let (status, _) = send(
            test_app(state.clone()),
            json_request("POST", "/api/waitlist", None, &signup("me@example.com")),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            test_app(state.clone()),
            empty_request("GET", "/api/waitlist", None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let cookie = session_cookie(&state).await;
        let (status, bytes) = send(
            test_app(state),
            empty_request("GET", "/api/waitlist", Some(&cookie)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let entries: Vec<WaitlistEntry> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].email, "me@example.com");
    }

    #[tokio::test]
    async fn test_unparseable_bodies_get_json_errors() {
        use axum::{body::Body, http::Request};

        let broken = Request::builder()
            .method("POST")
            .uri("/api/waitlist")
            .header("content-type", "application/json")
            .body(Body::from("{\"email\":"))
            .unwrap();
        let no_content_type = Request::builder()
            .method("POST")
            .uri("/api/waitlist")
            .body(Body::from(r#"{"email":"me@example.com"}"#))
            .unwrap();

        for req in [broken, no_content_type] {
            let (status, bytes) = send(test_app(test_state()), req).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
            assert!(!body.error.is_empty());
        }
    }
}
