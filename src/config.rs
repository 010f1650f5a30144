//! Application configuration, read once from the environment at startup.

use rand::distr::{Alphanumeric, SampleString};

use crate::db::DbConfig;
use crate::logging::config::LogConfig;

/// Site-wide identity used for metadata defaults, feeds and the sitemap.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub name: String,
    /// Base URL without a trailing slash, e.g. `https://example.com`.
    pub url: String,
    pub description: String,
    pub keywords: String,
    pub og_image: String,
    pub twitter_handle: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Site".to_string(),
            url: "https://example.com".to_string(),
            description: String::new(),
            keywords: String::new(),
            og_image: String::new(),
            twitter_handle: None,
        }
    }
}

impl SiteConfig {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            name: env_or("SITE_NAME", defaults.name),
            url: normalize_base_url(&env_or("SITE_URL", defaults.url)),
            description: env_or("SITE_DESCRIPTION", defaults.description),
            keywords: env_or("SITE_KEYWORDS", defaults.keywords),
            og_image: env_or("SITE_OG_IMAGE", defaults.og_image),
            twitter_handle: std::env::var("TWITTER_HANDLE")
                .ok()
                .filter(|h| !h.trim().is_empty()),
        }
    }

    /// Absolute URL for a site-relative path, always ending in `/`.
    pub fn absolute_url(&self, path: &str) -> String {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            format!("{}/", self.url)
        } else {
            format!("{}/{}/", self.url, trimmed)
        }
    }
}

/// Credentials and limits for the admin session.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
    pub admin_username: String,
    pub admin_password_hash: Option<String>,
    pub admin_password: Option<String>,
    pub login_max_attempts: usize,
    pub login_window_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: random_secret(),
            session_ttl_hours: 24,
            cookie_secure: false,
            admin_username: "admin".to_string(),
            admin_password_hash: None,
            admin_password: None,
            login_max_attempts: 5,
            login_window_secs: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    /// `None` runs the server on the in-memory store.
    pub database: Option<DbConfig>,
    pub allowed_origins: Vec<String>,
    pub shell_path: Option<String>,
    pub site: SiteConfig,
    pub auth: AuthConfig,
    pub logging: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3001,
            database: None,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            shell_path: None,
            site: SiteConfig::default(),
            auth: AuthConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SESSION_SECRET must be set in production")]
    MissingSessionSecret,
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let environment = env_or("ENVIRONMENT", defaults.environment);
        let is_production = environment == "production";

        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            Err(_) => defaults.port,
        };

        let session_secret = match std::env::var("SESSION_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if is_production => return Err(ConfigError::MissingSessionSecret),
            _ => defaults.auth.session_secret,
        };

        let auth = AuthConfig {
            session_secret,
            session_ttl_hours: env_parse("SESSION_TTL_HOURS", defaults.auth.session_ttl_hours),
            cookie_secure: is_production,
            admin_username: env_or("ADMIN_USERNAME", defaults.auth.admin_username),
            admin_password_hash: std::env::var("ADMIN_PASSWORD_HASH").ok(),
            admin_password: std::env::var("ADMIN_PASSWORD").ok(),
            login_max_attempts: env_parse("LOGIN_MAX_ATTEMPTS", defaults.auth.login_max_attempts),
            login_window_secs: env_parse("LOGIN_WINDOW_SECS", defaults.auth.login_window_secs),
        };

        Ok(Self {
            host: env_or("HOST", defaults.host),
            port,
            database: std::env::var("DATABASE_URL").is_ok().then(DbConfig::from_env),
            allowed_origins: allowed_origins().unwrap_or(defaults.allowed_origins),
            shell_path: std::env::var("SITE_SHELL_PATH").ok(),
            site: SiteConfig::from_env(),
            auth,
            logging: LogConfig::from_env(&environment),
            environment,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// ALLOWED_ORIGINS (comma-separated) wins over FRONTEND_ORIGIN.
fn allowed_origins() -> Option<Vec<String>> {
    std::env::var("ALLOWED_ORIGINS")
        .ok()
        .map(|s| {
            s.split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty())
        .or_else(|| std::env::var("FRONTEND_ORIGIN").ok().map(|origin| vec![origin]))
}

fn env_or(name: &str, fallback: String) -> String {
    std::env::var(name).unwrap_or(fallback)
}

pub(crate) fn env_parse<T: std::str::FromStr>(name: &str, fallback: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(fallback)
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn random_secret() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 64)
}
