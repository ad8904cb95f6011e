//! HTTP mapping of [`Error`] and extractors that reject with it.
//!
//! Every failure leaves the server as `{"error": "<message>"}`. Server-side
//! failures are logged and replaced with a generic message.

use crate::errors::Error;
use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

impl Error {
    /// HTTP status this error is reported with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::InvalidStatus { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidState { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

/// `axum::Json` whose rejection is an [`Error`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` whose rejection is an [`Error`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct ApiPath<T>(pub T);

/// `axum::extract::Query` whose rejection is an [`Error`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_client_errors_keep_their_message() {
        let response = Error::validation("No order items").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "No order items");

        let response = Error::not_found("Order", 7).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Order not found: 7");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (Error::unauthorized("x"), StatusCode::UNAUTHORIZED),
            (Error::forbidden("x"), StatusCode::FORBIDDEN),
            (
                Error::InvalidStatus {
                    status: "shipped".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::InvalidState {
                    order_id: 1,
                    status: "ready".to_string(),
                },
                StatusCode::CONFLICT,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.status_code(), status);
        }
    }

    #[tokio::test]
    async fn test_server_errors_are_masked() {
        let response =
            Error::Database(sea_orm::DbErr::Custom("disk on fire".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Internal server error");
    }
}
