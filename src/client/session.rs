//! The logged-in user and their token, persisted across restarts.

use super::storage::{Storage, load_json, save_json};
use crate::{core::auth::AuthResponse, errors::Result};
use std::sync::Arc;

/// Storage key of the session.
pub const SESSION_KEY: &str = "userInfo";

/// Logged-in user and token, persisted to [`Storage`].
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    current: Option<AuthResponse>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("user", &self.current.as_ref().map(|u| u.id))
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Restores any session saved in `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let current = load_json(storage.as_ref(), SESSION_KEY);
        Self { storage, current }
    }

    /// The current session, if logged in.
    #[must_use]
    pub const fn user(&self) -> Option<&AuthResponse> {
        self.current.as_ref()
    }

    /// Token to hand to [`ApiClient::with_token`](super::http::ApiClient::with_token).
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|u| u.token.as_str())
    }

    /// True for an admin session.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.current.as_ref().is_some_and(AuthResponse::is_admin)
    }

    /// Remembers a successful login or registration.
    pub fn login(&mut self, response: AuthResponse) -> Result<()> {
        save_json(self.storage.as_ref(), SESSION_KEY, &response)?;
        self.current = Some(response);
        Ok(())
    }

    /// Forgets the session here and in storage.
    pub fn logout(&mut self) -> Result<()> {
        self.current = None;
        self.storage.clear(SESSION_KEY)
    }
}
