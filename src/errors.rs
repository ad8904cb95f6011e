//! Unified error type for the service, the HTTP layer and the client stores.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Missing or malformed input. Maps to HTTP 400.
    #[error("{message}")]
    Validation { message: String },

    /// Missing, invalid or expired credentials. Maps to HTTP 401.
    #[error("{message}")]
    Unauthorized { message: String },

    /// Role or ownership mismatch, or a blocked account. Maps to HTTP 403.
    #[error("{message}")]
    Forbidden { message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid order status: {status}")]
    InvalidStatus { status: String },

    /// The order exists but its current status does not allow the operation.
    #[error("Order {order_id} is {status} and can only be cancelled while pending")]
    InvalidState { order_id: i64, status: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// A non-success response received by the client library.
    #[error("Request failed ({status}): {message}")]
    Api { status: u16, message: String },
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
