use std::path::PathBuf;

/// Settings for the tracing subscriber installed by [`super::init`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Emit JSON lines instead of the pretty console format.
    pub json: bool,
    /// Level applied to this crate's target when `RUST_LOG` is unset.
    pub level: String,
    pub directory: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            json: false,
            level: "debug".to_string(),
            directory: PathBuf::from("logs"),
        }
    }
}

impl LogConfig {
    pub fn from_env(environment: &str) -> Self {
        let is_production = environment == "production";
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| {
            if is_production {
                "info".to_string()
            } else {
                "debug".to_string()
            }
        });

        Self {
            json: is_production,
            level,
            directory: std::env::var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("logs")),
        }
    }

    /// Default filter directive used when `RUST_LOG` is not set.
    pub fn filter_directive(&self) -> String {
        format!(
            "marketing_site={},tower_http=debug,axum=debug,sqlx=warn",
            self.level
        )
    }
}
