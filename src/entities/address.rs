//! Address entity - A user's saved delivery addresses.
//!
//! At most one address per user carries `is_default = true`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Address database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "addresses")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the address
    pub user_id: i64,
    /// Short label such as "Home" or "Work"
    pub label: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: Option<String>,
    /// Whether this is the user's default delivery address
    pub is_default: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each address belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
