//! `/api/auth` - registration, login, profile and address book.

use crate::{
    api::{
        AppState,
        error::{ApiJson, ApiPath},
        extract::AuthUser,
    },
    core::{
        auth::{self, AuthResponse, LoginInput, RegisterInput},
        user::{self, AddressInput, ProfileUpdate},
    },
    entities::{address, user as user_entity},
    errors::Result,
};
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

/// Creates a customer account and returns a session token.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let response = auth::register(&state.db, &state.keys, input).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Exchanges email and password for a session token.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<Json<AuthResponse>> {
    auth::login(&state.db, &state.keys, input).await.map(Json)
}

/// The authenticated caller.
pub async fn me(AuthUser(user): AuthUser) -> Json<user_entity::Model> {
    Json(user)
}

/// Updates the caller's name and phone.
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<user_entity::Model>> {
    user::update_profile(&state.db, user.id, update)
        .await
        .map(Json)
}

/// Body of `PUT /api/auth/password`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// Replaces the caller's password once the current one checks out.
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(change): ApiJson<PasswordChange>,
) -> Result<Json<Value>> {
    user::change_password(
        &state.db,
        user.id,
        &change.current_password,
        &change.new_password,
    )
    .await?;
    Ok(Json(json!({ "message": "Password updated" })))
}

/// The caller's saved addresses, default first.
pub async fn list_addresses(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<address::Model>>> {
    user::list_addresses(&state.db, user.id).await.map(Json)
}

/// Saves a new address for the caller.
pub async fn add_address(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(input): ApiJson<AddressInput>,
) -> Result<(StatusCode, Json<address::Model>)> {
    let address = user::add_address(&state.db, user.id, input).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// Edits one of the caller's addresses.
pub async fn update_address(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(address_id): ApiPath<i64>,
    ApiJson(input): ApiJson<AddressInput>,
) -> Result<Json<address::Model>> {
    user::update_address(&state.db, user.id, address_id, input)
        .await
        .map(Json)
}

/// Removes one of the caller's addresses.
pub async fn delete_address(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(address_id): ApiPath<i64>,
) -> Result<Json<Value>> {
    user::delete_address(&state.db, user.id, address_id).await?;
    Ok(Json(json!({ "message": "Address removed" })))
}

/// Makes an address the caller's only default.
pub async fn set_default_address(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(address_id): ApiPath<i64>,
) -> Result<Json<address::Model>> {
    user::set_default_address(&state.db, user.id, address_id)
        .await
        .map(Json)
}
