//! `/api/bookings` - table reservations.

use crate::{
    api::{
        AppState,
        error::{ApiJson, ApiPath, ApiQuery},
        extract::{AdminUser, AuthUser, MaybeUser},
    },
    core::booking::{self, BookingInput},
    entities::booking::{BookingStatus, Model as Booking},
    errors::Result,
};
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

/// Public. A logged-in caller is recorded as the booking's owner.
pub async fn create(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    ApiJson(input): ApiJson<BookingInput>,
) -> Result<(StatusCode, Json<Booking>)> {
    let booking = booking::create_booking(&state.db, input, user.map(|u| u.id)).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Optional `?status=` filter.
#[derive(Debug, Default, Deserialize)]
pub struct BookingQuery {
    #[serde(default)]
    pub status: Option<String>,
}

/// Admin listing of every booking.
pub async fn list(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiQuery(query): ApiQuery<BookingQuery>,
) -> Result<Json<Vec<Booking>>> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<BookingStatus>)
        .transpose()?;
    booking::list_bookings(&state.db, status).await.map(Json)
}

/// Bookings made by the caller.
pub async fn mine(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Booking>>> {
    booking::list_user_bookings(&state.db, user.id)
        .await
        .map(Json)
}

/// Body of `PATCH /api/bookings/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct BookingStatusUpdate {
    pub status: String,
}

/// Admin status change for a booking.
pub async fn set_status(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<BookingStatusUpdate>,
) -> Result<Json<Booking>> {
    let status: BookingStatus = update.status.parse()?;
    booking::update_booking_status(&state.db, id, status)
        .await
        .map(Json)
}
