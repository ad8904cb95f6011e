//! Order item entity - Snapshot of a purchased menu item.
//!
//! Name, price, category and image are copied at checkout so historical orders
//! stay accurate after the menu changes. `menu_item_id` is a plain reference
//! without a foreign key, so deleting a menu item leaves order history intact.

use super::menu_item::Category;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub name: String,
    /// Unit price at order time, minor units
    pub price: i64,
    pub quantity: i32,
    pub category: Category,
    pub image: Option<String>,
}

impl Model {
    /// `price * quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id",
        on_delete = "Cascade"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
