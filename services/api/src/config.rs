//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// When unset the service keeps everything in memory.
    pub database_url: Option<String>,
    pub log_level: Level,
    /// Registration closes once this many students exist.
    pub max_class_size: Option<u64>,
    /// Lower-cased emails allowed to register teachers.
    pub admin_emails: Vec<String>,
    /// JSON outline used to seed the in-memory course catalog.
    pub course_outline_path: Option<PathBuf>,
    pub cors_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            log_level: Level::INFO,
            max_class_size: None,
            admin_emails: Vec::new(),
            course_outline_path: None,
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        let defaults = Config::default();

        // --- Load Server and Database Settings ---
        let bind_address = match std::env::var("BIND_ADDRESS") {
            Ok(raw) => raw.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            Err(_) => defaults.bind_address,
        };

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Course Settings ---
        let max_class_size = match std::env::var("MAX_CLASS_SIZE") {
            Ok(raw) if !raw.trim().is_empty() => Some(raw.trim().parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("MAX_CLASS_SIZE".to_string(), e.to_string())
            })?),
            _ => None,
        };

        let admin_emails = std::env::var("ADMIN_EMAILS")
            .map(|raw| parse_email_list(&raw))
            .unwrap_or_default();

        let course_outline_path = std::env::var("COURSE_OUTLINE_PATH").ok().map(PathBuf::from);

        let cors_origin = std::env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            max_class_size,
            admin_emails,
            course_outline_path,
            cors_origin,
        })
    }

    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|admin| *admin == email)
    }
}

fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_list_is_trimmed_and_case_insensitive() {
        let config = Config {
            admin_emails: parse_email_list(" Root@Example.com, ,ops@example.com"),
            ..Config::default()
        };
        assert_eq!(config.admin_emails.len(), 2);
        assert!(config.is_admin("root@example.com"));
        assert!(config.is_admin("OPS@example.com "));
        assert!(!config.is_admin("student@example.com"));
    }
}
