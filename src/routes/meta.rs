/**
 * Metadata Route
 * Resolved head metadata for client-rendered pages
 */
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::seo::{resolve_path, ResolvedPage};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    pub path: Option<String>,
}

/// GET /api/metadata?path=/blog/my-post
///
/// Never fails: store problems degrade to baseline metadata.
pub async fn get_metadata(
    State(state): State<AppState>,
    Query(query): Query<MetadataQuery>,
) -> Json<ResolvedPage> {
    let path = query.path.unwrap_or_else(|| "/".to_string());
    Json(resolve_path(state.store.as_ref(), &state.config.site, &path).await)
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{
        empty_request, json_request, send, session_cookie, test_app, test_state,
        unreachable_store_state,
    };
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_metadata_for_project_detail() {
        let state = test_state();
        let cookie = session_cookie(&state).await;
        let project = json!({ "title": "Widget", "slug": "widget", "description": "Gears" });
        send(
            test_app(state.clone()),
            json_request("POST", "/api/projects", Some(&cookie), &project),
        )
        .await;

        let (status, bytes) = send(
            test_app(state),
            empty_request("GET", "/api/metadata?path=/projects/widget", None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["metadata"]["title"], "Widget | Site");
        assert_eq!(body["metadata"]["canonical"], "https://acme.dev/projects/widget/");
        assert_eq!(body["contentType"], "article");
        assert_eq!(body["route"]["pageKey"], "projects");
        assert_eq!(body["notFound"], false);
    }

    #[tokio::test]
    async fn test_metadata_defaults_to_home() {
        let (status, bytes) = send(
            test_app(test_state()),
            empty_request("GET", "/api/metadata", None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["route"]["pageKey"], "home");
        assert_eq!(body["metadata"]["canonical"], "https://acme.dev/");
    }

    #[tokio::test]
    async fn test_metadata_survives_store_failure() {
        let (status, bytes) = send(
            test_app(unreachable_store_state()),
            empty_request("GET", "/api/metadata?path=/blog/hello", None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["metadata"]["title"], "Site");
        assert_eq!(body["notFound"], false);
    }
}
