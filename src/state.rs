//! Shared application state handed to every handler.

use std::{collections::HashMap, net::IpAddr, sync::Arc, time::Instant};

use chrono::Utc;
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::db::Store;

/// HTML shell used when `SITE_SHELL_PATH` is not set.
pub const DEFAULT_SHELL: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<link rel="icon" href="/favicon.ico">
<script type="module" src="/assets/main.js"></script>
</head>
<body>
<div id="root"></div>
</body>
</html>
"#;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub shell: Arc<str>,
    pub login_limiter: Arc<LoginLimiter>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig, shell: impl Into<Arc<str>>) -> Self {
        let login_limiter = LoginLimiter::new(
            config.auth.login_max_attempts,
            config.auth.login_window_secs,
        );
        Self {
            store,
            config: Arc::new(config),
            shell: shell.into(),
            login_limiter: Arc::new(login_limiter),
            started_at: Instant::now(),
        }
    }
}

/// Reads the HTML shell from `path`, or falls back to [`DEFAULT_SHELL`].
pub async fn load_shell(path: Option<&str>) -> std::io::Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path).await,
        None => Ok(DEFAULT_SHELL.to_string()),
    }
}

/// Sliding-window login attempt counter keyed by client IP.
///
/// Stale entries are evicted on every write so memory tracks active clients
/// rather than every address seen since startup.
#[derive(Debug)]
pub struct LoginLimiter {
    max_attempts: usize,
    window_secs: i64,
    attempts: RwLock<HashMap<IpAddr, Vec<i64>>>,
}

impl LoginLimiter {
    pub fn new(max_attempts: usize, window_secs: i64) -> Self {
        Self {
            max_attempts,
            window_secs,
            attempts: RwLock::new(HashMap::new()),
        }
    }

    /// Records an attempt, returning false once the window is full.
    pub async fn check(&self, ip: IpAddr) -> bool {
        self.check_at(ip, Utc::now().timestamp()).await
    }

    async fn check_at(&self, ip: IpAddr, now: i64) -> bool {
        let mut attempts = self.attempts.write().await;

        attempts.retain(|_, times| {
            times.retain(|t| now - *t < self.window_secs);
            !times.is_empty()
        });

        let times = attempts.entry(ip).or_default();
        if times.len() >= self.max_attempts {
            return false;
        }
        times.push(now);
        true
    }

    /// Clears the counter after a successful login.
    pub async fn reset(&self, ip: IpAddr) {
        self.attempts.write().await.remove(&ip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip() -> IpAddr {
        IpAddr::from([10, 0, 0, 1])
    }

    #[tokio::test]
    async fn test_limiter_blocks_after_max_attempts() {
        let limiter = LoginLimiter::new(2, 60);
        assert!(limiter.check_at(ip(), 100).await);
        assert!(limiter.check_at(ip(), 101).await);
        assert!(!limiter.check_at(ip(), 102).await);
        // other clients are unaffected
        assert!(limiter.check_at(IpAddr::from([10, 0, 0, 2]), 102).await);
    }

    #[tokio::test]
    async fn test_limiter_window_expires() {
        let limiter = LoginLimiter::new(1, 60);
        assert!(limiter.check_at(ip(), 100).await);
        assert!(!limiter.check_at(ip(), 159).await);
        assert!(limiter.check_at(ip(), 160).await);
    }

    #[tokio::test]
    async fn test_limiter_reset() {
        let limiter = LoginLimiter::new(1, 60);
        assert!(limiter.check_at(ip(), 100).await);
        limiter.reset(ip()).await;
        assert!(limiter.check_at(ip(), 101).await);
    }

    #[tokio::test]
    async fn test_default_shell_when_unset() {
        let shell = load_shell(None).await.unwrap();
        assert!(shell.contains("<head>"));
    }

    #[tokio::test]
    async fn test_missing_shell_file_errors() {
        assert!(load_shell(Some("/nonexistent/shell.html")).await.is_err());
    }
}
