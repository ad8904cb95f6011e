//! Menu item entity - Dishes and drinks offered by the restaurant.
//!
//! `rating` and `review_count` are derived from the reviews table and are only
//! written by the review workflow.

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Closed set of menu categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[sea_orm(string_value = "starters")]
    Starters,
    #[sea_orm(string_value = "mains")]
    Mains,
    #[sea_orm(string_value = "grills")]
    Grills,
    #[sea_orm(string_value = "sides")]
    Sides,
    #[sea_orm(string_value = "desserts")]
    Desserts,
    #[sea_orm(string_value = "drinks")]
    Drinks,
}

impl Category {
    /// Lowercase name as used in URLs and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starters => "starters",
            Self::Mains => "mains",
            Self::Grills => "grills",
            Self::Sides => "sides",
            Self::Desserts => "desserts",
            Self::Drinks => "drinks",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = crate::errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starters" => Ok(Self::Starters),
            "mains" => Ok(Self::Mains),
            "grills" => Ok(Self::Grills),
            "sides" => Ok(Self::Sides),
            "desserts" => Ok(Self::Desserts),
            "drinks" => Ok(Self::Drinks),
            other => Err(crate::errors::Error::validation(format!(
                "Unknown menu category: {other}"
            ))),
        }
    }
}

/// A list of strings stored as a JSON array column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct StringList(pub Vec<String>);

/// Menu item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menu_items")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the menu item
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Price in minor currency units
    pub price: i64,
    pub category: Category,
    /// Public URL of the item's picture
    pub image: Option<String>,
    /// Mean of all review ratings, 0 when unreviewed
    pub rating: f64,
    /// Number of reviews backing `rating`
    pub review_count: i32,
    /// Unavailable items are listed but cannot be ordered
    pub is_available: bool,
    pub is_featured: bool,
    /// Preparation time in minutes
    pub prep_time: i32,
    pub calories: Option<i32>,
    #[sea_orm(column_type = "Json")]
    pub ingredients: StringList,
    #[sea_orm(column_type = "Json")]
    pub allergens: StringList,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between MenuItem and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One menu item has many reviews
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
