//! User entity - Customer and admin accounts.
//!
//! Passwords are stored as bcrypt hashes and never serialized. The address book
//! lives in its own table (see [`super::address`]).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role. Admins can manage the menu, orders, bookings, customers and settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular customer
    #[sea_orm(string_value = "user")]
    User,
    /// Back-office administrator
    #[sea_orm(string_value = "admin")]
    Admin,
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Login email, stored lowercased
    #[sea_orm(unique)]
    pub email: String,
    /// bcrypt hash of the password
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Optional contact phone number
    pub phone: Option<String>,
    /// Account role
    pub role: Role,
    /// Loyalty points balance. Stored but not accrued by any operation.
    pub loyalty_points: i32,
    /// Blocked accounts cannot log in or use existing tokens
    pub is_blocked: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
    /// When the account was last modified
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Whether this account has the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many saved addresses
    #[sea_orm(has_many = "super::address::Entity")]
    Addresses,
    /// One user has many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Addresses.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
