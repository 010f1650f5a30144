/**
 * Authentication Routes
 * Cookie session login, logout and current-user lookup
 */
use axum::{
    extract::{ConnectInfo, FromRequestParts, State},
    http::request::Parts,
    Json,
};
use axum_extra::extract::{
    cookie::{Cookie, CookieJar, SameSite},
    WithRejection,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::config::AuthConfig;
use crate::db::{models::User, Store, UserStore};
use crate::error::ApiError;
use crate::routes::{non_blank, JsonBody, SuccessResponse};
use crate::state::AppState;

/// Name of the HttpOnly cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Password used by the development fallback admin.
const DEV_ADMIN_PASSWORD: &str = "admin123";

// ============================================================================
// Types
// ============================================================================

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// User info returned to frontend
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub success: bool,
    pub user: UserInfo,
}

// ============================================================================
// Session tokens
// ============================================================================

pub fn issue_session_token(
    auth: &AuthConfig,
    user: &User,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        user_id: user.id,
        username: user.username.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(auth.session_ttl_hours)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.session_secret.as_bytes()),
    )
}

pub fn verify_session_token(
    auth: &AuthConfig,
    token: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.session_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

fn session_cookie(auth: &AuthConfig, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(auth.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(auth.session_ttl_hours))
        .build()
}

/// Authenticated admin, extracted from the session cookie.
///
/// The token must verify and its `userId` must still exist in the user
/// table; anything else rejects with 401.
#[derive(Debug, Clone)]
pub struct AdminSession(pub User);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let unauthorized = || ApiError::Unauthorized("Unauthorized".to_string());

        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(SESSION_COOKIE).ok_or_else(unauthorized)?;

        let claims = verify_session_token(&state.config.auth, token.value()).map_err(|e| {
            tracing::debug!("Rejected session token: {}", e);
            unauthorized()
        })?;

        match state.store.get_user(claims.user_id).await? {
            Some(user) => Ok(AdminSession(user)),
            None => Err(unauthorized()),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login - Verify credentials and set the session cookie
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    jar: CookieJar,
    WithRejection(Json(payload), _): JsonBody<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), ApiError> {
    let username = non_blank(payload.username);
    let password = payload.password.filter(|p| !p.is_empty());
    let (Some(username), Some(password)) = (username, password) else {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    };

    let ip = addr.ip();
    if !state.login_limiter.check(ip).await {
        tracing::warn!("Login rate limit exceeded for {}", ip);
        return Err(ApiError::TooManyRequests(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let user = state
        .store
        .get_user_by_username(&username)
        .await?
        .ok_or_else(invalid)?;

    // bcrypt is CPU-bound; keep it off the async executor.
    let password_hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| {
            tracing::error!("spawn_blocking panic during verify: {}", e);
            ApiError::Internal("Failed to verify password".to_string())
        })?
        .unwrap_or_else(|e| {
            tracing::error!("Failed to verify password hash: {}", e);
            false
        });

    if !valid {
        tracing::info!("Failed login for {} from {}", username, ip);
        return Err(invalid());
    }

    state.login_limiter.reset(ip).await;

    let token = issue_session_token(&state.config.auth, &user).map_err(|e| {
        tracing::error!("Failed to sign session token: {}", e);
        ApiError::Internal("Failed to create session".to_string())
    })?;

    tracing::info!("Admin {} logged in from {}", user.username, ip);

    Ok((
        jar.add(session_cookie(&state.config.auth, token)),
        Json(SessionResponse {
            success: true,
            user: UserInfo::from(&user),
        }),
    ))
}

/// POST /api/auth/logout - Clear the session cookie
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<SuccessResponse>) {
    (
        jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/")),
        Json(SuccessResponse::ok()),
    )
}

/// GET /api/auth/me - Current admin
pub async fn me(AdminSession(user): AdminSession) -> Json<UserInfo> {
    Json(UserInfo::from(&user))
}

// ============================================================================
// Bootstrap
// ============================================================================

/// Creates the first admin when the user table is empty.
///
/// Prefers `ADMIN_PASSWORD_HASH`, then hashes `ADMIN_PASSWORD`. Development
/// falls back to a well-known password; production skips creation instead.
pub async fn bootstrap_admin(
    store: &dyn Store,
    auth: &AuthConfig,
    is_production: bool,
) -> anyhow::Result<()> {
    if store.count_users().await? > 0 {
        return Ok(());
    }

    let password_hash = match (&auth.admin_password_hash, &auth.admin_password) {
        (Some(hash), _) => hash.clone(),
        (None, Some(plain)) => hash_blocking(plain.clone()).await?,
        (None, None) if is_production => {
            tracing::warn!(
                "SECURITY: no ADMIN_PASSWORD_HASH or ADMIN_PASSWORD set; admin login is disabled"
            );
            return Ok(());
        }
        (None, None) => {
            tracing::warn!(
                "SECURITY: creating admin '{}' with the default development password. \
                 Set ADMIN_PASSWORD_HASH before deploying.",
                auth.admin_username
            );
            hash_blocking(DEV_ADMIN_PASSWORD.to_string()).await?
        }
    };

    let user = store.create_user(&auth.admin_username, &password_hash).await?;
    tracing::info!("Created admin user {}", user.username);
    Ok(())
}

async fn hash_blocking(password: String) -> anyhow::Result<String> {
    Ok(tokio::task::spawn_blocking(move || hash(&password, DEFAULT_COST)).await??)
}
