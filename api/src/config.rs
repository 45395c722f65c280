//! Server configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file (path in `FORMDESK_CONFIG`, default `formdesk.toml`), then
//! `FORMDESK_*` environment variables.

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "FORMDESK_CONFIG";
/// Config file used when [`CONFIG_PATH_ENV`] is unset
pub const DEFAULT_CONFIG_PATH: &str = "formdesk.toml";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,
    /// `memory` or a `sqlite:` URL
    pub database_url: String,
    /// HS256 signing secret; must not be empty
    pub jwt_secret: String,
    /// Token lifetime
    pub token_ttl_hours: i64,
    /// Allow any origin
    pub cors_permissive: bool,
    /// Super-admin created at startup when both are set
    pub bootstrap_admin_email: Option<String>,
    /// Password for [`bootstrap_admin_email`](Self::bootstrap_admin_email)
    pub bootstrap_admin_password: Option<String>,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Source could not be read or deserialized
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// Loaded but unusable
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ServerConfig {
    /// Load from the default file location and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::load_from(&path)
    }

    /// Load from `path` (optional file) and the environment
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = Config::builder()
            .set_default("bind_addr", "0.0.0.0:8080")?
            .set_default("database_url", "memory")?
            .set_default("jwt_secret", "")?
            .set_default("token_ttl_hours", 8)?
            .set_default("cors_permissive", true)?
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("FORMDESK").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "jwt_secret must be set (FORMDESK_JWT_SECRET)".into(),
            ));
        }
        if self.token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid("token_ttl_hours must be positive".into()));
        }
        Ok(())
    }

    /// Both bootstrap credentials, if configured
    pub fn bootstrap_admin(&self) -> Option<(&str, &str)> {
        match (&self.bootstrap_admin_email, &self.bootstrap_admin_password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((email.as_str(), password.as_str()))
            }
            _ => None,
        }
    }
}
