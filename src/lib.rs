//! Marketing Site - metadata-resolving backend for a marketing site

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod routes;
pub mod seo;
pub mod state;

use anyhow::Context;
use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::db::{MemoryStore, PgStore, Store};
use crate::state::AppState;

/// Configure CORS from the allowed origin list.
pub fn configure_cors(origins: &[String]) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    use routes::{auth, blog, contact, content, feeds, health, meta, pages, projects, waitlist};

    let cors = configure_cors(&state.config.allowed_origins);

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/metadata", get(meta::get_metadata))
        .route(
            "/api/content",
            get(content::list_content).post(content::upsert_content),
        )
        .route(
            "/api/content/{page}",
            get(content::get_content).delete(content::delete_content),
        )
        .route("/api/blog", get(blog::list_posts).post(blog::create_post))
        .route(
            "/api/blog/{id}",
            get(blog::get_post)
                .put(blog::update_post)
                .delete(blog::delete_post),
        )
        .route("/api/blog/slug/{slug}", get(blog::get_post_by_slug))
        .route(
            "/api/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/api/projects/{id}",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/api/projects/slug/{slug}",
            get(projects::get_project_by_slug),
        )
        .route(
            "/api/waitlist",
            get(waitlist::list_waitlist).post(waitlist::join_waitlist),
        )
        .route(
            "/api/waitlist/{id}",
            axum::routing::delete(waitlist::delete_waitlist_entry),
        )
        .route(
            "/api/contact",
            get(contact::list_messages).post(contact::submit_message),
        )
        .route(
            "/api/contact/{id}",
            axum::routing::put(contact::mark_read).delete(contact::delete_message),
        )
        .route("/health", get(health::health_ping))
        .route("/health/detailed", get(health::health_detailed))
        .route("/health/ready", get(health::health_ready))
        .route("/rss.xml", get(feeds::rss_feed))
        .route("/sitemap.xml", get(feeds::sitemap))
        .route("/robots.txt", get(feeds::robots))
        .route("/", get(pages::render_page))
        .fallback(pages::render_page)
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        // Global 2 MB request body cap
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(cors)
}

/// Picks Postgres when configured and reachable, otherwise the in-memory store.
async fn connect_store(config: &AppConfig) -> Arc<dyn Store> {
    let Some(db_config) = &config.database else {
        tracing::info!("DATABASE_URL not set. Running on the in-memory store.");
        return Arc::new(MemoryStore::new());
    };

    match db::init_pool(db_config).await {
        Ok(pool) => {
            if let Err(e) = db::run_migrations(&pool).await {
                tracing::error!("Failed to run database migrations: {}", e);
            }
            Arc::new(PgStore::new(pool))
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize database pool: {}. Continuing on the in-memory store.",
                e
            );
            Arc::new(MemoryStore::new())
        }
    }
}

/// Run the server (used by main).
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;

    // Guards must live as long as the server or buffered log lines are lost.
    let _log_guards = logging::init(&config.logging);

    if std::env::var("SESSION_SECRET").is_err() {
        tracing::warn!(
            "SESSION_SECRET not set; using a random secret. Sessions will not survive a restart."
        );
    }

    let store = connect_store(&config).await;
    routes::auth::bootstrap_admin(store.as_ref(), &config.auth, config.is_production())
        .await
        .context("failed to bootstrap admin user")?;

    let shell = state::load_shell(config.shell_path.as_deref())
        .await
        .with_context(|| format!("failed to read SITE_SHELL_PATH {:?}", config.shell_path))?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid HOST/PORT configuration")?;

    tracing::info!(
        environment = %config.environment,
        store = store.backend(),
        site = %config.site.url,
        "Starting server on {}",
        addr
    );

    let app = create_app(AppState::new(store, config, shell));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[test]
    fn test_configure_cors_skips_invalid_origins() {
        let _cors = configure_cors(&["http://localhost:3000".to_string(), "bad\norigin".to_string()]);
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let app = create_app(test_state());
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_connect_store_without_database_uses_memory() {
        let store = connect_store(&AppConfig::default()).await;
        assert_eq!(store.backend(), "memory");
    }
}
