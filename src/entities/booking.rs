//! Booking entity - Table reservations, independent of orders.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum BookingStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Confirmed")]
    Confirmed,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl std::str::FromStr for BookingStatus {
    type Err = crate::errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Confirmed" => Ok(Self::Confirmed),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(crate::errors::Error::validation(format!(
                "Invalid booking status: {other}"
            ))),
        }
    }
}

/// Booking database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Set when the booking was made by a logged-in user
    pub user_id: Option<i64>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: Date,
    pub time: Time,
    pub guests: i32,
    pub special_requests: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTimeUtc,
}

/// Bookings have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
