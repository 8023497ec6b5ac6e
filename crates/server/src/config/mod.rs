//! Configuration for the folio server.
//!
//! Configuration is stored in RON. Secrets never live in the file: the file
//! names environment variables and they are resolved at startup.

pub mod loader;

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub media: MediaConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

impl Config {
    /// Apply `FOLIO_DB_PATH` and `FOLIO_BIND` on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("FOLIO_DB_PATH") {
            if !path.trim().is_empty() {
                self.database.path = PathBuf::from(path);
            }
        }
        if let Ok(bind) = std::env::var("FOLIO_BIND") {
            if !bind.trim().is_empty() {
                self.server.bind = bind;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default)]
    pub environment: Environment,

    /// Origins allowed to call the API with credentials
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in megabytes
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            environment: Environment::default(),
            cors_origins: default_cors_origins(),
            body_limit_mb: default_body_limit_mb(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

fn default_body_limit_mb() -> usize {
    32
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DatabaseConfig {
    /// Directory holding `folio.db`
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".folio/data")
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AuthConfig {
    /// Environment variable containing the JWT signing secret
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: String,

    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: default_jwt_secret_env(),
            token_ttl_days: default_token_ttl_days(),
            cookie_name: default_cookie_name(),
        }
    }
}

impl AuthConfig {
    /// Resolve the signing secret.
    ///
    /// Production refuses to start without it. Development falls back to a
    /// random per-process secret, which invalidates tokens on restart.
    pub fn resolve_secret(&self, environment: Environment) -> Result<String> {
        match std::env::var(&self.jwt_secret_env) {
            Ok(secret) if !secret.is_empty() => Ok(secret),
            _ if environment.is_production() => Err(anyhow::anyhow!(
                "{} must be set in production",
                self.jwt_secret_env
            )),
            _ => {
                tracing::warn!(
                    "{} not set, using an ephemeral signing secret",
                    self.jwt_secret_env
                );
                Ok(cuid2::create_id())
            }
        }
    }
}

fn default_jwt_secret_env() -> String {
    "JWT_SECRET".to_string()
}

fn default_token_ttl_days() -> i64 {
    7
}

fn default_cookie_name() -> String {
    "token".to_string()
}

/// Where uploaded media is stored
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum MediaConfig {
    /// Files on disk, served by this process under `/media`
    Local { root: PathBuf, public_base: String },

    /// Cloudinary account; credentials come from the named variables
    Cloudinary {
        cloud_name: String,
        api_key_env: String,
        api_secret_env: String,
    },
}

impl Default for MediaConfig {
    fn default() -> Self {
        MediaConfig::Local {
            root: PathBuf::from(".folio/media"),
            public_base: "/media".to_string(),
        }
    }
}

/// Resolved Cloudinary credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl MediaConfig {
    pub fn resolve_cloudinary(&self) -> Result<Option<CloudinaryCredentials>> {
        let MediaConfig::Cloudinary {
            cloud_name,
            api_key_env,
            api_secret_env,
        } = self
        else {
            return Ok(None);
        };

        let api_key = std::env::var(api_key_env)
            .with_context(|| format!("{api_key_env} environment variable must be set"))?;
        let api_secret = std::env::var(api_secret_env)
            .with_context(|| format!("{api_secret_env} environment variable must be set"))?;

        Ok(Some(CloudinaryCredentials {
            cloud_name: cloud_name.clone(),
            api_key,
            api_secret,
        }))
    }
}

/// Names of the variables holding the bootstrap admin account
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AdminConfig {
    #[serde(default = "default_admin_name_env")]
    pub name_env: String,

    #[serde(default = "default_admin_email_env")]
    pub email_env: String,

    #[serde(default = "default_admin_password_env")]
    pub password_env: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            name_env: default_admin_name_env(),
            email_env: default_admin_email_env(),
            password_env: default_admin_password_env(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl AdminConfig {
    /// Both email and password must be set; the name defaults to `Admin User`.
    pub fn resolve_credentials(&self) -> Option<AdminCredentials> {
        let email = std::env::var(&self.email_env).ok()?;
        let password = std::env::var(&self.password_env).ok()?;
        if email.trim().is_empty() || password.is_empty() {
            return None;
        }
        let name = std::env::var(&self.name_env)
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| "Admin User".to_string());

        Some(AdminCredentials {
            name,
            email: email.trim().to_lowercase(),
            password,
        })
    }
}

fn default_admin_name_env() -> String {
    "ADMIN_NAME".to_string()
}

fn default_admin_email_env() -> String {
    "ADMIN_EMAIL".to_string()
}

fn default_admin_password_env() -> String {
    "ADMIN_PASSWORD".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.bind, "0.0.0.0:5000");
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.auth.token_ttl_days, 7);
        assert_eq!(config.auth.cookie_name, "token");
        assert!(matches!(config.media, MediaConfig::Local { .. }));
    }

    #[test]
    fn test_admin_credentials_from_env() {
        unsafe {
            std::env::set_var("TEST_FOLIO_ADMIN_EMAIL", " Owner@Example.com ");
            std::env::set_var("TEST_FOLIO_ADMIN_PASSWORD", "secret123");
        }

        let admin = AdminConfig {
            name_env: "TEST_FOLIO_ADMIN_NAME_UNSET".to_string(),
            email_env: "TEST_FOLIO_ADMIN_EMAIL".to_string(),
            password_env: "TEST_FOLIO_ADMIN_PASSWORD".to_string(),
        };
        let creds = admin.resolve_credentials().unwrap();
        assert_eq!(creds.name, "Admin User");
        assert_eq!(creds.email, "owner@example.com");
        assert_eq!(creds.password, "secret123");

        unsafe {
            std::env::remove_var("TEST_FOLIO_ADMIN_EMAIL");
            std::env::remove_var("TEST_FOLIO_ADMIN_PASSWORD");
        }
    }

    #[test]
    fn test_admin_credentials_missing() {
        let admin = AdminConfig {
            name_env: "NONEXISTENT_NAME".to_string(),
            email_env: "NONEXISTENT_EMAIL".to_string(),
            password_env: "NONEXISTENT_PASSWORD".to_string(),
        };
        assert_eq!(admin.resolve_credentials(), None);
    }

    #[test]
    fn test_secret_required_in_production() {
        let auth = AuthConfig {
            jwt_secret_env: "NONEXISTENT_JWT_SECRET".to_string(),
            ..AuthConfig::default()
        };
        assert!(auth.resolve_secret(Environment::Production).is_err());
        assert!(!auth.resolve_secret(Environment::Development).unwrap().is_empty());
    }

    #[test]
    fn test_cloudinary_credentials() {
        unsafe {
            std::env::set_var("TEST_CLOUDINARY_KEY", "key");
            std::env::set_var("TEST_CLOUDINARY_SECRET", "shh");
        }

        let media = MediaConfig::Cloudinary {
            cloud_name: "demo".to_string(),
            api_key_env: "TEST_CLOUDINARY_KEY".to_string(),
            api_secret_env: "TEST_CLOUDINARY_SECRET".to_string(),
        };
        let creds = media.resolve_cloudinary().unwrap().unwrap();
        assert_eq!(creds.cloud_name, "demo");
        assert_eq!(creds.api_secret, "shh");
        assert_eq!(MediaConfig::default().resolve_cloudinary().unwrap(), None);

        unsafe {
            std::env::remove_var("TEST_CLOUDINARY_KEY");
            std::env::remove_var("TEST_CLOUDINARY_SECRET");
        }
    }
}
