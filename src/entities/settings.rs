//! Settings entity - Singleton row of restaurant metadata.
//!
//! Created with defaults on first read; the row id is always [`SINGLETON_ID`].

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Primary key of the only settings row.
pub const SINGLETON_ID: i32 = 1;

/// String-to-string map stored as a JSON object column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct StringMap(pub BTreeMap<String, String>);

/// Settings database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "settings")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[serde(skip)]
    pub id: i32,
    pub restaurant_name: String,
    pub tagline: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    /// Day name to opening hours, e.g. `"monday" => "09:00-22:00"`
    #[sea_orm(column_type = "Json")]
    pub opening_hours: StringMap,
    /// Flat delivery fee advertised to customers, minor units
    pub delivery_fee: i64,
    /// Subtotal at or above which delivery is free, minor units
    pub free_delivery_threshold: i64,
    /// Tax rate as a fraction (0.075 = 7.5%)
    pub tax_rate: f64,
    /// ISO currency code
    pub currency: String,
    /// Social network name to profile URL
    #[sea_orm(column_type = "Json")]
    pub socials: StringMap,
    pub updated_at: DateTimeUtc,
}

/// `Settings` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
