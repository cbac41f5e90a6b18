use once_cell::sync::Lazy;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub media: MediaConfig,
    pub identity: IdentityConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Credentials and layout for the external media service.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Server-chosen storage folders; uploads never pick their own folder.
    pub video_folder: String,
    pub image_folder: String,
    /// Base URL of the upload API, overridable for tests.
    pub api_base: String,
}

impl MediaConfig {
    pub fn is_configured(&self) -> bool {
        !self.cloud_name.is_empty() && !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

/// Backend API access for the external identity provider.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub api_base: String,
    pub secret_key: String,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Secret used to verify provider-issued session tokens.
    pub session_jwt_secret: String,
    /// Signing secret for the identity webhook (svix "whsec_..." format).
    pub webhook_signing_secret: String,
    /// Maximum accepted webhook timestamp skew, in seconds.
    pub webhook_tolerance_secs: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        Self {
            environment,
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3000),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_default(),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            },
            media: MediaConfig {
                cloud_name: env::var("CLOUDINARY_CLOUD_NAME").unwrap_or_default(),
                api_key: env::var("CLOUDINARY_API_KEY").unwrap_or_default(),
                api_secret: env::var("CLOUDINARY_API_SECRET").unwrap_or_default(),
                video_folder: env::var("MEDIA_VIDEO_FOLDER")
                    .unwrap_or_else(|_| "vault-videos".to_string()),
                image_folder: env::var("MEDIA_IMAGE_FOLDER")
                    .unwrap_or_else(|_| "vault-images".to_string()),
                api_base: env::var("MEDIA_API_BASE")
                    .unwrap_or_else(|_| "https://api.cloudinary.com".to_string()),
            },
            identity: IdentityConfig {
                api_base: env::var("IDENTITY_API_BASE")
                    .unwrap_or_else(|_| "https://api.clerk.com".to_string()),
                secret_key: env::var("IDENTITY_SECRET_KEY").unwrap_or_default(),
            },
            security: SecurityConfig {
                session_jwt_secret: env::var("SESSION_JWT_SECRET").unwrap_or_default(),
                webhook_signing_secret: env::var("WEBHOOK_SIGNING_SECRET").unwrap_or_default(),
                webhook_tolerance_secs: env::var("WEBHOOK_TOLERANCE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        let config = AppConfig::from_env();
        assert_eq!(config.media.video_folder, "vault-videos");
        assert_eq!(config.security.webhook_tolerance_secs, 300);
        assert!(config.server.port > 0);
    }
}
