/**
 * Page Routes
 * Serves the HTML shell with resolved head tags for every non-API path
 */
use axum::{
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};

use crate::error::ApiError;
use crate::seo::resolve_path;
use crate::state::AppState;

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

/// GET / and fallback for every unmatched path.
///
/// Unknown `/api` paths get a JSON 404 and page paths only answer GET/HEAD.
/// Detail routes naming a missing item render the shell with section
/// defaults and a 404 status.
pub async fn render_page(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    let path = uri.path();
    if is_api_path(path) {
        return ApiError::not_found().into_response();
    }
    if !matches!(method, Method::GET | Method::HEAD) {
        return (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "GET, HEAD")]).into_response();
    }

    let resolved = resolve_path(state.store.as_ref(), &state.config.site, path).await;
    let html = resolved.apply_to(&state.shell, &state.config.site);

    let status = if resolved.not_found {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };
    (status, Html(html)).into_response()
}
