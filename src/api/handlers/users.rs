//! `/api/users` - customer administration.

use crate::{
    api::{
        AppState,
        error::{ApiJson, ApiPath},
        extract::AdminUser,
    },
    core::user::{self, CustomerSummary},
    entities::user as user_entity,
    errors::Result,
};
use axum::{Json, extract::State};
use serde::Deserialize;

/// Admin listing of customers with their order totals.
pub async fn list(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<CustomerSummary>>> {
    user::list_customers(&state.db).await.map(Json)
}

/// Body of `PATCH /api/users/{id}/block`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockUpdate {
    pub is_blocked: bool,
}

/// Blocks or unblocks a customer.
pub async fn set_blocked(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<BlockUpdate>,
) -> Result<Json<user_entity::Model>> {
    user::set_blocked(&state.db, id, update.is_blocked)
        .await
        .map(Json)
}
