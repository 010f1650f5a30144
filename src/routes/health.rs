/**
 * Health Routes
 * Endpoints for checking backend health status
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::Store;
use crate::state::AppState;

/// Single service check result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCheck {
    pub status: String,
    /// `postgres` or `memory`
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Detailed health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub environment: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub store: ServiceCheck,
}

/// Ready check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Simple health response
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: String,
}

async fn check_store(store: &dyn Store) -> ServiceCheck {
    match store.ping().await {
        Ok(duration) => ServiceCheck {
            status: "healthy".to_string(),
            backend: store.backend().to_string(),
            response_time: Some(duration.as_millis() as u64),
            error: None,
        },
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            ServiceCheck {
                status: "unhealthy".to_string(),
                backend: store.backend().to_string(),
                response_time: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// GET /health - Simple health ping
pub async fn health_ping() -> impl IntoResponse {
    Json(SimpleHealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /health/detailed - Detailed health with store check
pub async fn health_detailed(State(state): State<AppState>) -> impl IntoResponse {
    let store = check_store(state.store.as_ref()).await;

    // The process itself is up even when the store is not.
    let response = DetailedHealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs(),
        environment: state.config.environment.clone(),
        checks: HealthChecks { store },
    };

    (StatusCode::OK, Json(response))
}

/// GET /health/ready - Readiness check, 503 while the store is unreachable
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let store = check_store(state.store.as_ref()).await;
    let is_ready = store.status == "healthy";

    let response = ReadyResponse {
        status: if is_ready { "ready" } else { "not ready" }.to_string(),
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs(),
        reason: store.error,
    };

    let status = if is_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{
        empty_request, send, test_app, test_state, unreachable_store_state,
    };

    async fn get_json<T: serde::de::DeserializeOwned>(uri: &str) -> (StatusCode, T) {
        let (status, body) = send(test_app(test_state()), empty_request("GET", uri, None)).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_service_check_omits_empty_fields() {
        let check = ServiceCheck {
            status: "healthy".to_string(),
            backend: "memory".to_string(),
            response_time: Some(10),
            error: None,
        };
        let json = serde_json::to_string(&check).unwrap();
        assert!(json.contains("responseTime"));
        assert!(!json.contains("error"));
    }

    #[tokio::test]
    async fn test_health_ping_returns_ok() {
        let (status, body) = get_json::<SimpleHealthResponse>("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn test_health_detailed_reports_store() {
        let (status, body) = get_json::<DetailedHealthResponse>("/health/detailed").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.checks.store.backend, "memory");
        assert_eq!(body.checks.store.status, "healthy");
    }

    #[tokio::test]
    async fn test_health_ready_returns_ready() {
        let (status, body) = get_json::<ReadyResponse>("/health/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ready");
        assert!(body.reason.is_none());
    }

    #[tokio::test]
    async fn test_health_ready_unavailable_when_store_down() {
        let (status, bytes) = send(
            test_app(unreachable_store_state()),
            empty_request("GET", "/health/ready", None),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let body: ReadyResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.status, "not ready");
        assert!(body.reason.is_some());
    }
}
