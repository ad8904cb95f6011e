//! Server configuration loaded from environment variables.
//!
//! Values come from the process environment, optionally populated from a `.env`
//! file by `dotenvy` before [`ServerConfig::from_env`] runs.

use crate::errors::{Error, Result};
use std::path::PathBuf;
use tracing::{debug, info};

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Connection string for the database
    pub database_url: String,
    /// Secret used to sign and verify JWTs
    pub jwt_secret: String,
    /// TCP port to listen on
    pub port: u16,
    /// Origins allowed by CORS; empty means any origin
    pub allowed_origins: Vec<String>,
    /// Directory uploaded images are written to and served from
    pub upload_dir: PathBuf,
    /// Path of the TOML seed file
    pub seed_file: PathBuf,
    /// Admin account created at startup when both are set
    pub admin_credentials: Option<(String, String)>,
}

impl ServerConfig {
    /// Reads the configuration from the environment.
    ///
    /// # Errors
    /// Returns an error if `JWT_SECRET` is missing or `PORT` is not a valid port number.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| Error::Config {
            message: "JWT_SECRET must be set".to_string(),
        })?;
        if jwt_secret.trim().is_empty() {
            return Err(Error::Config {
                message: "JWT_SECRET cannot be empty".to_string(),
            });
        }

        let port = match std::env::var("PORT") {
            Ok(raw) => raw.trim().parse::<u16>().map_err(|e| Error::Config {
                message: format!("Invalid PORT value {raw:?}: {e}"),
            })?,
            Err(_) => {
                info!("PORT not set, using default: 5000");
                5000
            }
        };

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_default();

        let admin_credentials = match (
            std::env::var("ADMIN_EMAIL"),
            std::env::var("ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some((email, password)),
            _ => None,
        };

        let config = Self {
            database_url: super::database::get_database_url(),
            jwt_secret,
            port,
            allowed_origins,
            upload_dir: std::env::var("UPLOAD_DIR")
                .map_or_else(|_| PathBuf::from("uploads"), PathBuf::from),
            seed_file: std::env::var("SEED_FILE")
                .map_or_else(|_| PathBuf::from("seed.toml"), PathBuf::from),
            admin_credentials,
        };
        debug!(
            port = config.port,
            origins = config.allowed_origins.len(),
            "Loaded server configuration"
        );
        Ok(config)
    }
}

/// Splits a comma separated origin list, dropping blanks.
#[must_use]
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        let origins = parse_origins("http://localhost:5173, https://bistro.example ,,");
        assert_eq!(
            origins,
            vec![
                "http://localhost:5173".to_string(),
                "https://bistro.example".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_origins_empty() {
        assert!(parse_origins("  ").is_empty());
    }
}
