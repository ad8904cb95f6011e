//! Bearer token extractors.

use super::AppState;
use crate::{
    core::auth,
    entities::user,
    errors::{Error, Result},
};
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The authenticated, unblocked caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token =
            bearer_token(parts).ok_or_else(|| Error::unauthorized("Not authorized, no token"))?;
        auth::authenticate(&state.db, &state.keys, token)
            .await
            .map(Self)
    }
}

/// An authenticated caller with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        auth::require_admin(&user)?;
        Ok(Self(user))
    }
}

/// The caller if a valid token was sent; anonymous otherwise.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<user::Model>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(None));
        };
        match auth::authenticate(&state.db, &state.keys, token).await {
            Ok(user) => Ok(Self(Some(user))),
            Err(Error::Unauthorized { .. } | Error::Forbidden { .. }) => {
                debug!("Ignoring unusable token on optional auth route");
                Ok(Self(None))
            }
            Err(e) => Err(e),
        }
    }
}
