//! Table reservations.
//!
//! Bookings are independent of orders. Anyone may book; a booking made while
//! logged in remembers the user so it shows up under "my bookings".

use crate::{
    entities::{
        Booking,
        booking::{self, BookingStatus},
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::info;

/// Largest party accepted for a single booking.
pub const MAX_GUESTS: i32 = 20;

/// Booking request as submitted by the reservation form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`, 24-hour
    pub time: String,
    pub guests: i32,
    #[serde(default)]
    pub special_requests: Option<String>,
}

struct ValidBooking {
    date: NaiveDate,
    time: NaiveTime,
}

impl BookingInput {
    fn validate(&self, today: NaiveDate) -> Result<ValidBooking> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("Name is required"));
        }
        if !self.email.contains('@') {
            return Err(Error::validation("A valid email is required"));
        }
        if self.phone.trim().is_empty() {
            return Err(Error::validation("Phone is required"));
        }
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| Error::validation("Date must be formatted as YYYY-MM-DD"))?;
        if date < today {
            return Err(Error::validation("Booking date cannot be in the past"));
        }
        let time = NaiveTime::parse_from_str(self.time.trim(), "%H:%M")
            .map_err(|_| Error::validation("Time must be formatted as HH:MM"))?;
        if !(1..=MAX_GUESTS).contains(&self.guests) {
            return Err(Error::validation(format!(
                "Guests must be between 1 and {MAX_GUESTS}"
            )));
        }
        Ok(ValidBooking { date, time })
    }
}

/// Records a new booking in status `Pending`.
///
/// # Errors
/// Returns `Validation` for a missing contact field, a malformed or past date,
/// a malformed time or a party size outside 1..=20.
pub async fn create_booking(
    db: &DatabaseConnection,
    input: BookingInput,
    user_id: Option<i64>,
) -> Result<booking::Model> {
    let valid = input.validate(Utc::now().date_naive())?;

    let booking = booking::ActiveModel {
        user_id: Set(user_id),
        name: Set(input.name.trim().to_string()),
        email: Set(input.email.trim().to_lowercase()),
        phone: Set(input.phone.trim().to_string()),
        date: Set(valid.date),
        time: Set(valid.time),
        guests: Set(input.guests),
        special_requests: Set(input
            .special_requests
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())),
        status: Set(BookingStatus::Pending),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        booking_id = booking.id,
        date = %booking.date,
        guests = booking.guests,
        "Booking created"
    );
    Ok(booking)
}

/// Lists all bookings, newest first, optionally only those in `status`.
pub async fn list_bookings(
    db: &DatabaseConnection,
    status: Option<BookingStatus>,
) -> Result<Vec<booking::Model>> {
    let mut query = Booking::find()
        .order_by_desc(booking::Column::CreatedAt)
        .order_by_desc(booking::Column::Id);
    if let Some(status) = status {
        query = query.filter(booking::Column::Status.eq(status));
    }
    query.all(db).await.map_err(Into::into)
}

/// Lists bookings made by a logged-in user, newest first.
pub async fn list_user_bookings(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<booking::Model>> {
    Booking::find()
        .filter(booking::Column::UserId.eq(user_id))
        .order_by_desc(booking::Column::CreatedAt)
        .order_by_desc(booking::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Changes a booking's status.
///
/// # Errors
/// Returns `NotFound` if the booking does not exist.
pub async fn update_booking_status(
    db: &DatabaseConnection,
    booking_id: i64,
    status: BookingStatus,
) -> Result<booking::Model> {
    let mut booking: booking::ActiveModel = Booking::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Booking", booking_id))?
        .into();
    booking.status = Set(status);
    let booking = booking.update(db).await?;

    info!(booking_id, status = ?status, "Booking status changed");
    Ok(booking)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use chrono::Duration;

    fn input(date: NaiveDate) -> BookingInput {
        BookingInput {
            name: "Ada Obi".to_string(),
            email: "Ada@Example.com".to_string(),
            phone: "+2348000000000".to_string(),
            date: date.format("%Y-%m-%d").to_string(),
            time: "19:30".to_string(),
            guests: 4,
            special_requests: Some("  window seat ".to_string()),
        }
    }

    fn tomorrow() -> NaiveDate {
        Utc::now().date_naive() + Duration::days(1)
    }

    #[test]
    fn test_validate_booking_input() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 10).unwrap();
        assert!(input(today).validate(today).is_ok());

        let yesterday = today - Duration::days(1);
        assert!(input(yesterday).validate(today).is_err());

        let mut bad = input(today);
        bad.date = "10/05/2026".to_string();
        assert!(bad.validate(today).is_err());

        let mut bad = input(today);
        bad.time = "7pm".to_string();
        assert!(bad.validate(today).is_err());

        for guests in [0, MAX_GUESTS + 1] {
            let mut bad = input(today);
            bad.guests = guests;
            assert!(bad.validate(today).is_err());
        }

        let mut bad = input(today);
        bad.email = "nobody".to_string();
        assert!(bad.validate(today).is_err());

        let mut bad = input(today);
        bad.phone = "  ".to_string();
        assert!(bad.validate(today).is_err());
    }

    #[tokio::test]
    async fn test_create_booking() -> Result<()> {
        let db = setup_test_db().await?;
        let booking = create_booking(&db, input(tomorrow()), None).await?;

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.email, "ada@example.com");
        assert_eq!(booking.time, NaiveTime::from_hms_opt(19, 30, 0).unwrap());
        assert_eq!(booking.special_requests.as_deref(), Some("window seat"));
        assert_eq!(booking.user_id, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_past_booking_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_booking(
            &db,
            input(Utc::now().date_naive() - Duration::days(1)),
            None,
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));
        assert!(list_bookings(&db, None).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_and_filter_bookings() -> Result<()> {
        let db = setup_test_db().await?;
        let ada = create_test_user(&db, "ada@example.com").await?;

        let first = create_booking(&db, input(tomorrow()), Some(ada.id)).await?;
        let second = create_booking(&db, input(tomorrow()), None).await?;
        update_booking_status(&db, first.id, BookingStatus::Confirmed).await?;

        let all = list_bookings(&db, None).await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);

        let confirmed = list_bookings(&db, Some(BookingStatus::Confirmed)).await?;
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].id, first.id);

        let mine = list_user_bookings(&db, ada.id).await?;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].status, BookingStatus::Confirmed);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_booking() -> Result<()> {
        let db = setup_test_db().await?;
        let result = update_booking_status(&db, 42, BookingStatus::Cancelled).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }
}
