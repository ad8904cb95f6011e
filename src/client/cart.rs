//! Shopping cart with a checkout preview.
//!
//! The preview uses the same delivery rule as the server, so the total shown
//! before checkout matches the order that gets created.

use super::storage::{Storage, load_json, save_json};
use crate::{
    core::order::{MAX_LINE_QUANTITY, OrderLineInput, delivery_fee_for},
    entities::menu_item::{self, Category},
    errors::Result,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Storage key of the cart.
pub const CART_KEY: &str = "cartItems";

/// A dish in the cart with the price it was added at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub menu_item_id: i64,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    pub category: Category,
    pub image: Option<String>,
}

impl CartLine {
    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }
}

/// Cart persisted to [`Storage`] after every change.
pub struct CartStore {
    storage: Arc<dyn Storage>,
    lines: Vec<CartLine>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Restores the cart saved in `storage`, if any.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let lines = load_json(storage.as_ref(), CART_KEY).unwrap_or_default();
        Self { storage, lines }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// True when nothing has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| i64::from(l.quantity)).sum()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> i64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Delivery fee the server will charge; nothing for an empty cart.
    #[must_use]
    pub fn delivery_fee(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            delivery_fee_for(self.subtotal())
        }
    }

    /// Subtotal plus delivery fee, as the server will charge it.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.subtotal() + self.delivery_fee()
    }

    /// Adds `quantity` of `item`, merging with an existing line.
    pub fn add(&mut self, item: &menu_item::Model, quantity: i32) -> Result<()> {
        if quantity <= 0 {
            return Ok(());
        }
        match self.lines.iter_mut().find(|l| l.menu_item_id == item.id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(quantity).min(MAX_LINE_QUANTITY);
            }
            None => self.lines.push(CartLine {
                menu_item_id: item.id,
                name: item.name.clone(),
                price: item.price,
                quantity: quantity.min(MAX_LINE_QUANTITY),
                category: item.category,
                image: item.image.clone(),
            }),
        }
        self.persist()
    }

    /// Sets a line's quantity; zero or less removes it.
    pub fn set_quantity(&mut self, menu_item_id: i64, quantity: i32) -> Result<()> {
        if quantity <= 0 {
            return self.remove(menu_item_id);
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.menu_item_id == menu_item_id) {
            line.quantity = quantity.min(MAX_LINE_QUANTITY);
        }
        self.persist()
    }

    /// Drops a line if present.
    pub fn remove(&mut self, menu_item_id: i64) -> Result<()> {
        self.lines.retain(|l| l.menu_item_id != menu_item_id);
        self.persist()
    }

    /// Empties the cart, typically after a successful checkout.
    pub fn clear(&mut self) -> Result<()> {
        self.lines.clear();
        self.storage.clear(CART_KEY)
    }

    /// Lines in the shape the checkout endpoint expects.
    #[must_use]
    pub fn checkout_lines(&self) -> Vec<OrderLineInput> {
        self.lines
            .iter()
            .map(|l| OrderLineInput {
                menu_item_id: l.menu_item_id,
                quantity: l.quantity,
            })
            .collect()
    }

    fn persist(&self) -> Result<()> {
        save_json(self.storage.as_ref(), CART_KEY, &self.lines)
    }
}
