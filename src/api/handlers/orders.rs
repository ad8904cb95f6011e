//! `/api/orders` - checkout, order history, status updates and the dashboard.

use crate::{
    api::{
        AppState,
        error::{ApiJson, ApiPath},
        extract::{AdminUser, AuthUser},
    },
    core::{
        order::{self, CheckoutInput, OrderWithItems},
        stats::{self, DashboardStats},
    },
    errors::Result,
};
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

/// Every order for admins, otherwise the caller's own.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<OrderWithItems>>> {
    order::list_orders(&state.db, &user).await.map(Json)
}

/// Checks out a cart. Prices come from the menu, not the request.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(input): ApiJson<CheckoutInput>,
) -> Result<(StatusCode, Json<OrderWithItems>)> {
    let placed = order::create_order(&state.db, &user, input).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

/// One order, visible to its owner and to admins.
pub async fn get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<OrderWithItems>> {
    order::get_order(&state.db, id, &user).await.map(Json)
}

/// Body of `PATCH /api/orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// Admin status change. Role is checked inside the order workflow.
pub async fn set_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> Result<Json<OrderWithItems>> {
    order::set_status(&state.db, id, &update.status, &user)
        .await
        .map(Json)
}

/// Cancels a pending order.
pub async fn cancel(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<OrderWithItems>> {
    order::cancel_order(&state.db, id, &user).await.map(Json)
}

/// Admin dashboard figures.
pub async fn stats(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<DashboardStats>> {
    stats::compute_stats(&state.db).await.map(Json)
}
