//! `/api/menu` - browsing, administration and reviews.

use crate::{
    api::{
        AppState,
        error::{ApiJson, ApiPath, ApiQuery},
        extract::{AdminUser, AuthUser},
    },
    core::{
        menu::{self, MenuFilter, MenuItemInput},
        review::{self, ReviewInput},
    },
    entities::{menu_item, review as review_entity},
    errors::{Error, Result},
};
use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

/// Public menu listing, filtered by the query string.
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<MenuFilter>,
) -> Result<Json<Vec<menu_item::Model>>> {
    menu::list_menu_items(&state.db, &filter).await.map(Json)
}

/// One dish by id.
pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<menu_item::Model>> {
    menu::get_menu_item(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("Menu item", id))
}

/// Admin only.
pub async fn create(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiJson(input): ApiJson<MenuItemInput>,
) -> Result<(StatusCode, Json<menu_item::Model>)> {
    let item = menu::create_menu_item(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Admin only. Rating and review count are left alone.
pub async fn update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<MenuItemInput>,
) -> Result<Json<menu_item::Model>> {
    menu::update_menu_item(&state.db, id, input).await.map(Json)
}

/// Admin only. Past orders keep their snapshot of the dish.
pub async fn delete(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>> {
    menu::delete_menu_item(&state.db, id).await?;
    Ok(Json(json!({ "message": "Menu item removed" })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityInput {
    #[serde(default)]
    is_available: Option<bool>,
}

/// Sets availability from `{"isAvailable": bool}`; an empty body flips it.
pub async fn set_availability(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(id): ApiPath<i64>,
    body: Bytes,
) -> Result<Json<menu_item::Model>> {
    let input: AvailabilityInput = if body.iter().all(u8::is_ascii_whitespace) {
        AvailabilityInput::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| Error::validation(format!("Invalid availability payload: {e}")))?
    };
    menu::set_availability(&state.db, id, input.is_available)
        .await
        .map(Json)
}

/// Reviews for a dish, newest first.
pub async fn list_reviews(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<review_entity::Model>>> {
    review::list_reviews(&state.db, id).await.map(Json)
}

/// Rates a dish once per customer.
pub async fn add_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ReviewInput>,
) -> Result<(StatusCode, Json<review_entity::Model>)> {
    let review = review::add_review(&state.db, id, &user, input.rating, input.comment).await?;
    Ok((StatusCode::CREATED, Json(review)))
}
