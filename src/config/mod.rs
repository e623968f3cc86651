use std::env;

/// Runtime configuration for the document service
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP port (default: 8080)
    pub server_port: u16,

    /// Database connection string (default: local SQLite file)
    pub database_url: String,

    /// JWT signing secret (Required in production)
    pub jwt_secret: String,

    /// Session token lifetime in hours (default: 24)
    pub token_ttl_hours: i64,

    /// Directory holding attachment binaries (default: "uploads")
    pub upload_dir: String,

    /// Directory receiving JSON document exports (default: "exports")
    pub export_dir: String,

    /// Maximum attachment size in bytes (default: 50 MB)
    pub max_upload_size: usize,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 8080,
            database_url: "sqlite://nexus.db?mode=rwc".to_string(),
            jwt_secret: "secret".to_string(),
            token_ttl_hours: 24,
            upload_dir: "uploads".to_string(),
            export_dir: "exports".to_string(),
            max_upload_size: 50 * 1024 * 1024, // 50 MB
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.server_port),

            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret), // Fallback for dev convenience, strictly enforced in production()

            token_ttl_hours: env::var("TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|h: &i64| *h > 0)
                .unwrap_or(default.token_ttl_hours),

            upload_dir: env::var("UPLOAD_DIR").unwrap_or(default.upload_dir),

            export_dir: env::var("EXPORT_DIR").unwrap_or(default.export_dir),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            allowed_origins: parse_origins(env::var("ALLOWED_ORIGINS").ok())
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Create config for development and tests (in-memory database)
    pub fn development() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "dev_secret".to_string(),
            ..Self::default()
        }
    }

    /// Create config for production. Panics when `JWT_SECRET` is missing.
    pub fn production() -> Self {
        let from_env = Self::from_env();
        Self {
            jwt_secret: env::var("JWT_SECRET").expect("CRITICAL: JWT_SECRET must be set"),
            allowed_origins: parse_origins(env::var("ALLOWED_ORIGINS").ok())
                .unwrap_or_default(),
            ..from_env
        }
    }
}

fn parse_origins(raw: Option<String>) -> Option<Vec<String>> {
    raw.map(|v| {
        v.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.token_ttl_hours, 24);
        assert_eq!(config.upload_dir, "uploads");
        assert_eq!(config.export_dir, "exports");
        assert_eq!(config.max_upload_size, 50 * 1024 * 1024);
    }

    #[test]
    fn test_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.token_ttl_hours, 24);
    }

    #[test]
    fn test_parse_origins() {
        let origins = parse_origins(Some(" http://a.test , ,http://b.test".to_string())).unwrap();
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
        assert!(parse_origins(None).is_none());
    }

    #[test]
    fn test_from_env_cors_fallback() {
        unsafe { env::remove_var("ALLOWED_ORIGINS") };
        let config = AppConfig::from_env();
        let default_config = AppConfig::default();
        assert_eq!(config.allowed_origins, default_config.allowed_origins);
        assert!(!config.allowed_origins.contains(&"*".to_string()));
    }
}
