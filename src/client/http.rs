//! Typed HTTP client for the REST API.

use super::orders::OrderFeed;
use crate::{
    core::{
        auth::{AuthResponse, LoginInput, RegisterInput},
        order::{CheckoutInput, OrderWithItems},
        stats::DashboardStats,
    },
    entities::{menu_item, order::OrderStatus, settings, user},
    errors::{Error, Result},
};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for one API base URL, optionally acting as a logged-in user.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://localhost:5000`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Sends `token` as a bearer token on every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// The bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string(),
            };
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        response.json().await.map_err(Into::into)
    }

    /// `POST /api/auth/register`.
    pub async fn register(&self, input: &RegisterInput) -> Result<AuthResponse> {
        self.send(self.client.post(self.url("/auth/register")).json(input))
            .await
    }

    /// `POST /api/auth/login`.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let input = LoginInput {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send(self.client.post(self.url("/auth/login")).json(&input))
            .await
    }

    /// `GET /api/auth/me`.
    pub async fn me(&self) -> Result<user::Model> {
        self.send(self.client.get(self.url("/auth/me"))).await
    }

    /// `GET /api/menu`.
    pub async fn menu(&self) -> Result<Vec<menu_item::Model>> {
        self.send(self.client.get(self.url("/menu"))).await
    }

    /// `GET /api/settings`.
    pub async fn settings(&self) -> Result<settings::Model> {
        self.send(self.client.get(self.url("/settings"))).await
    }
}

impl OrderFeed for ApiClient {
    async fn fetch_orders(&self) -> Result<Vec<OrderWithItems>> {
        self.send(self.client.get(self.url("/orders"))).await
    }

    async fn fetch_stats(&self) -> Result<DashboardStats> {
        self.send(self.client.get(self.url("/orders/stats"))).await
    }

    async fn create_order(&self, input: &CheckoutInput) -> Result<OrderWithItems> {
        self.send(self.client.post(self.url("/orders")).json(input))
            .await
    }

    async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> Result<OrderWithItems> {
        let url = self.url(&format!("/orders/{order_id}/status"));
        self.send(self.client.patch(url).json(&json!({ "status": status })))
            .await
    }

    async fn cancel_order(&self, order_id: i64) -> Result<OrderWithItems> {
        let url = self.url(&format!("/orders/{order_id}"));
        self.send(self.client.delete(url)).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        api::{AppState, router},
        config::seed::SettingsSeed,
        test_utils::*,
    };
    use std::sync::Arc;
    use tokio::net::TcpListener;

    /// Serves the real router on an ephemeral port.
    async fn spawn_server() -> Result<(String, AppState, tempfile::TempDir)> {
        let uploads = tempfile::tempdir()?;
        let state = AppState {
            db: Arc::new(setup_test_db().await?),
            keys: Arc::new(test_keys()),
            settings_defaults: Arc::new(SettingsSeed::default()),
            upload_dir: Arc::new(uploads.path().to_path_buf()),
        };
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        let app = router(state.clone(), &[]);
        tokio::spawn(async move { axum::serve(listener, app).await });
        Ok((format!("http://{address}"), state, uploads))
    }

    #[tokio::test]
    async fn test_client_round_trip() -> Result<()> {
        let (base_url, state, _uploads) = spawn_server().await?;
        let item = create_test_menu_item(&state.db, "Suya", 4_500).await?;

        let anonymous = ApiClient::new(&base_url);
        let registered = anonymous
            .register(&RegisterInput {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "secret123".to_string(),
                phone: None,
            })
            .await?;
        assert!(!registered.is_admin());
        assert_eq!(anonymous.menu().await?.len(), 1);

        let client = ApiClient::new(&base_url).with_token(registered.token);
        assert_eq!(client.me().await?.email, "ada@example.com");

        let placed = client.create_order(&checkout(&[(item.id, 2)])).await?;
        assert_eq!(placed.order.total, 11_000);
        assert_eq!(client.fetch_orders().await?.len(), 1);

        let cancelled = client.cancel_order(placed.order.id).await?;
        assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
        Ok(())
    }

    #[tokio::test]
    async fn test_client_surfaces_api_errors() -> Result<()> {
        let (base_url, _state, _uploads) = spawn_server().await?;

        let result = ApiClient::new(&base_url)
            .login("nobody@example.com", "whatever1")
            .await;
        match result {
            Err(Error::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid email or password");
            }
            other => panic!("expected an API error, got {other:?}"),
        }

        let result = ApiClient::new(&base_url).fetch_stats().await;
        assert!(matches!(result, Err(Error::Api { status: 401, .. })));
        Ok(())
    }
}
