//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use blogicum_core::BlogSettings;
use blogicum_core::pagination::DEFAULT_PER_PAGE;
use blogicum_infra::database::DatabaseConfig;
use blogicum_infra::media::DEFAULT_MAX_UPLOAD_BYTES;
use blogicum_infra::JwtConfig;

/// Where uploads live and how they are addressed.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub root: PathBuf,
    /// URL prefix the uploads are served under.
    pub url: String,
    pub max_upload_bytes: usize,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub media: MediaConfig,
    pub blog: BlogSettings,
}

/// Parse `key`, falling back to `default` when unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: env_or("DB_MAX_CONNECTIONS", 100),
            min_connections: env_or("DB_MIN_CONNECTIONS", 10),
        });

        let jwt_defaults = JwtConfig::default();
        let jwt = JwtConfig {
            secret: env::var("JWT_SECRET").unwrap_or(jwt_defaults.secret),
            expiration_hours: env_or("JWT_EXPIRATION_HOURS", jwt_defaults.expiration_hours),
            issuer: env::var("JWT_ISSUER").unwrap_or(jwt_defaults.issuer),
        };

        let media = MediaConfig {
            root: env::var("MEDIA_ROOT")
                .unwrap_or_else(|_| "media".to_string())
                .into(),
            url: normalize_prefix(&env::var("MEDIA_URL").unwrap_or_else(|_| "/media".to_string())),
            max_upload_bytes: env_or("MEDIA_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
        };

        let blog = BlogSettings {
            per_page: env_or("BLOG_POSTS_PER_PAGE", DEFAULT_PER_PAGE).max(1),
            unique_title_text: env_flag("BLOG_UNIQUE_TITLE_TEXT"),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_or("PORT", 8080),
            database,
            jwt,
            media,
            blog,
        }
    }
}

/// `media/`, `/media/` and `/media` all mean `/media`.
fn normalize_prefix(prefix: &str) -> String {
    format!("/{}", prefix.trim_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("media"), "/media");
        assert_eq!(normalize_prefix("/media/"), "/media");
        assert_eq!(normalize_prefix("/static/uploads"), "/static/uploads");
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        // Unset variable.
        assert_eq!(env_or("BLOGICUM_TEST_SURELY_UNSET", 7usize), 7);
    }
}
