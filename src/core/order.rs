//! Order business logic - checkout, status changes, cancellation and listing.
//!
//! Money rules applied at checkout:
//! - `subtotal` is the sum of `price * quantity` over the lines
//! - delivery is free from [`FREE_DELIVERY_THRESHOLD`], otherwise [`DELIVERY_FEE`]
//! - `total = subtotal + delivery_fee`; tax is recorded as 0 and never added
//!
//! Line name, price, category and image are copied from the live menu item at
//! checkout, so later menu edits never rewrite order history. Payment is not
//! processed: every order is recorded as paid.
//!
//! Admins may move an order to any status, in any order. The only guarded
//! transition is a customer cancelling their own order, which requires `pending`.

use crate::{
    entities::{
        MenuItem, Order, OrderItem,
        order::{self, ContactInfo, DeliveryAddress, OrderStatus, PaymentMethod, PaymentStatus},
        order_item, user,
    },
    errors::{Error, Result},
};
use sea_orm::{LoaderTrait, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Flat delivery fee charged below the free-delivery threshold, minor units.
pub const DELIVERY_FEE: i64 = 2_000;

/// Subtotal from which delivery is free, minor units.
pub const FREE_DELIVERY_THRESHOLD: i64 = 50_000;

/// How many of the most recent orders an admin listing returns.
pub const ADMIN_ORDER_LIMIT: u64 = 50;

/// Largest quantity accepted for a single line.
pub const MAX_LINE_QUANTITY: i32 = 99;

/// Most lines accepted in one checkout. Together with
/// [`crate::core::menu::MAX_PRICE`] this keeps every total well inside `i64`.
pub const MAX_ORDER_LINES: usize = 100;

/// One requested line at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    pub menu_item_id: i64,
    pub quantity: i32,
}

/// Checkout payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInput {
    pub items: Vec<OrderLineInput>,
    pub delivery_address: DeliveryAddress,
    pub contact_info: ContactInfo,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckoutInput {
    fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(Error::validation("No order items"));
        }
        if self.items.len() > MAX_ORDER_LINES {
            return Err(Error::validation(format!(
                "An order cannot have more than {MAX_ORDER_LINES} lines"
            )));
        }
        if let Some(line) = self
            .items
            .iter()
            .find(|line| line.quantity <= 0 || line.quantity > MAX_LINE_QUANTITY)
        {
            return Err(Error::validation(format!(
                "Quantity for menu item {} must be between 1 and {MAX_LINE_QUANTITY}",
                line.menu_item_id
            )));
        }
        if self.delivery_address.street.trim().is_empty()
            || self.delivery_address.city.trim().is_empty()
        {
            return Err(Error::validation("Delivery address is required"));
        }
        if self.contact_info.name.trim().is_empty() || self.contact_info.phone.trim().is_empty() {
            return Err(Error::validation("Contact name and phone are required"));
        }
        Ok(())
    }
}

/// Money breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    pub subtotal: i64,
    pub tax: i64,
    pub delivery_fee: i64,
    pub total: i64,
}

/// Delivery fee for a given subtotal.
#[must_use]
pub const fn delivery_fee_for(subtotal: i64) -> i64 {
    if subtotal >= FREE_DELIVERY_THRESHOLD {
        0
    } else {
        DELIVERY_FEE
    }
}

/// Prices a list of `(unit_price, quantity)` lines.
#[must_use]
pub fn price_lines(lines: &[(i64, i32)]) -> Pricing {
    let subtotal = lines
        .iter()
        .map(|(price, quantity)| price * i64::from(*quantity))
        .sum();
    let delivery_fee = delivery_fee_for(subtotal);
    Pricing {
        subtotal,
        tax: 0,
        delivery_fee,
        total: subtotal + delivery_fee,
    }
}

/// An order together with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Places an order for `user` in status `pending`, marked paid.
///
/// # Errors
/// Returns `Validation` if the payload is incomplete or a line references a
/// missing or unavailable menu item.
pub async fn create_order(
    db: &DatabaseConnection,
    user: &user::Model,
    input: CheckoutInput,
) -> Result<OrderWithItems> {
    input.validate()?;

    let txn = db.begin().await?;

    let mut snapshots = Vec::with_capacity(input.items.len());
    for line in &input.items {
        let item = MenuItem::find_by_id(line.menu_item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                Error::validation(format!("Menu item {} does not exist", line.menu_item_id))
            })?;
        if !item.is_available {
            return Err(Error::validation(format!(
                "{} is currently unavailable",
                item.name
            )));
        }
        snapshots.push((item, line.quantity));
    }

    let priced: Vec<(i64, i32)> = snapshots
        .iter()
        .map(|(item, quantity)| (item.price, *quantity))
        .collect();
    let pricing = price_lines(&priced);

    let now = chrono::Utc::now();
    let order = order::ActiveModel {
        user_id: Set(user.id),
        status: Set(OrderStatus::Pending),
        subtotal: Set(pricing.subtotal),
        tax: Set(pricing.tax),
        delivery_fee: Set(pricing.delivery_fee),
        total: Set(pricing.total),
        payment_method: Set(input.payment_method),
        payment_status: Set(PaymentStatus::Paid),
        delivery_address: Set(input.delivery_address),
        contact_info: Set(input.contact_info),
        notes: Set(input
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(snapshots.len());
    for (item, quantity) in snapshots {
        let line = order_item::ActiveModel {
            order_id: Set(order.id),
            menu_item_id: Set(item.id),
            name: Set(item.name),
            price: Set(item.price),
            quantity: Set(quantity),
            category: Set(item.category),
            image: Set(item.image),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(line);
    }

    txn.commit().await?;
    info!(
        order_id = order.id,
        user_id = user.id,
        total = order.total,
        "Order created"
    );
    Ok(OrderWithItems { order, items })
}

async fn find_order(db: &DatabaseConnection, order_id: i64) -> Result<order::Model> {
    Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Order", order_id))
}

async fn with_items(db: &DatabaseConnection, order: order::Model) -> Result<OrderWithItems> {
    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await?;
    Ok(OrderWithItems { order, items })
}

/// Attaches line items to a batch of orders, keeping the order of `orders`.
pub async fn attach_items(
    db: &DatabaseConnection,
    orders: Vec<order::Model>,
) -> Result<Vec<OrderWithItems>> {
    let items = orders.load_many(OrderItem, db).await?;
    Ok(orders
        .into_iter()
        .zip(items)
        .map(|(order, mut items)| {
            items.sort_by_key(|item| item.id);
            OrderWithItems { order, items }
        })
        .collect())
}

/// Sets an order's status. Admin only; any listed status is accepted from any other.
///
/// # Errors
/// Returns `Forbidden` for non-admins, `InvalidStatus` for an unknown status and
/// `NotFound` for a missing order.
pub async fn set_status(
    db: &DatabaseConnection,
    order_id: i64,
    new_status: &str,
    actor: &user::Model,
) -> Result<OrderWithItems> {
    crate::core::auth::require_admin(actor)?;
    let status: OrderStatus = new_status.parse()?;

    let existing = find_order(db, order_id).await?;
    let previous = existing.status;

    let mut order: order::ActiveModel = existing.into();
    order.status = Set(status);
    order.updated_at = Set(chrono::Utc::now());
    let order = order.update(db).await?;

    info!(order_id, from = %previous, to = %status, "Order status changed");
    with_items(db, order).await
}

/// Cancels an order on behalf of its owner (or an admin) while it is still pending.
///
/// # Errors
/// Returns `NotFound` for a missing order, `Forbidden` if `actor` is neither
/// the owner nor an admin, and `InvalidState` if the order is not pending.
pub async fn cancel_order(
    db: &DatabaseConnection,
    order_id: i64,
    actor: &user::Model,
) -> Result<OrderWithItems> {
    let existing = find_order(db, order_id).await?;
    if !actor.is_admin() && existing.user_id != actor.id {
        return Err(Error::forbidden("Not authorized to cancel this order"));
    }
    if existing.status != OrderStatus::Pending {
        return Err(Error::InvalidState {
            order_id,
            status: existing.status.to_string(),
        });
    }

    let mut order: order::ActiveModel = existing.into();
    order.status = Set(OrderStatus::Cancelled);
    order.updated_at = Set(chrono::Utc::now());
    let order = order.update(db).await?;

    info!(order_id, actor = actor.id, "Order cancelled");
    with_items(db, order).await
}

/// Lists orders visible to `actor`, newest first.
///
/// Customers see all of their own orders; admins see the
/// [`ADMIN_ORDER_LIMIT`] most recent orders of everyone.
pub async fn list_orders(
    db: &DatabaseConnection,
    actor: &user::Model,
) -> Result<Vec<OrderWithItems>> {
    let query = Order::find()
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id);
    let orders = if actor.is_admin() {
        query.limit(ADMIN_ORDER_LIMIT).all(db).await?
    } else {
        query
            .filter(order::Column::UserId.eq(actor.id))
            .all(db)
            .await?
    };
    attach_items(db, orders).await
}

/// Fetches one order for its owner or an admin.
///
/// # Errors
/// Returns `NotFound` for a missing order and `Forbidden` for anyone else's order.
pub async fn get_order(
    db: &DatabaseConnection,
    order_id: i64,
    actor: &user::Model,
) -> Result<OrderWithItems> {
    let order = find_order(db, order_id).await?;
    if !actor.is_admin() && order.user_id != actor.id {
        return Err(Error::forbidden("Not authorized to view this order"));
    }
    with_items(db, order).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_price_lines_below_threshold() {
        let pricing = price_lines(&[(10_000, 2)]);
        assert_eq!(pricing.subtotal, 20_000);
        assert_eq!(pricing.delivery_fee, 2_000);
        assert_eq!(pricing.total, 22_000);
        assert_eq!(pricing.tax, 0);
    }

    #[test]
    fn test_price_lines_free_delivery() {
        let pricing = price_lines(&[(30_000, 1), (15_000, 2)]);
        assert_eq!(pricing.subtotal, 60_000);
        assert_eq!(pricing.delivery_fee, 0);
        assert_eq!(pricing.total, 60_000);
    }

    #[test]
    fn test_delivery_fee_boundary() {
        assert_eq!(delivery_fee_for(FREE_DELIVERY_THRESHOLD - 1), DELIVERY_FEE);
        assert_eq!(delivery_fee_for(FREE_DELIVERY_THRESHOLD), 0);
        assert_eq!(delivery_fee_for(0), DELIVERY_FEE);
    }

    #[test]
    fn test_largest_allowed_order_prices_without_overflow() {
        let lines = vec![(crate::core::menu::MAX_PRICE, MAX_LINE_QUANTITY); MAX_ORDER_LINES];
        let pricing = price_lines(&lines);
        assert_eq!(pricing.subtotal, 100_000_000_000 * 99 * 100);
        assert_eq!(pricing.delivery_fee, 0);
    }

    #[test]
    fn test_total_is_subtotal_plus_fee() {
        for lines in [
            vec![(1, 1)],
            vec![(49_999, 1)],
            vec![(25_000, 2)],
            vec![(700, 3), (12_500, 4)],
        ] {
            let pricing = price_lines(&lines);
            assert_eq!(pricing.total, pricing.subtotal + pricing.delivery_fee);
            assert_eq!(
                pricing.delivery_fee == 0,
                pricing.subtotal >= FREE_DELIVERY_THRESHOLD
            );
        }
    }

    #[tokio::test]
    async fn test_create_order_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let user = sample_user(user::Role::User);

        let mut input = checkout(&[(1, 1)]);
        input.items.clear();
        assert!(matches!(
            create_order(&db, &user, input).await,
            Err(Error::Validation { message: _ })
        ));

        let input = checkout(&[(1, 0)]);
        assert!(matches!(
            create_order(&db, &user, input).await,
            Err(Error::Validation { message: _ })
        ));

        let too_many: Vec<(i64, i32)> = (1..=101).map(|id| (id, 1)).collect();
        assert!(matches!(
            create_order(&db, &user, checkout(&too_many)).await,
            Err(Error::Validation { message: _ })
        ));

        let mut input = checkout(&[(1, 1)]);
        input.delivery_address.street = " ".to_string();
        assert!(matches!(
            create_order(&db, &user, input).await,
            Err(Error::Validation { message: _ })
        ));

        let mut input = checkout(&[(1, 1)]);
        input.contact_info.phone = String::new();
        assert!(matches!(
            create_order(&db, &user, input).await,
            Err(Error::Validation { message: _ })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_snapshots_lines() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "ada@example.com").await?;
        let item = create_test_menu_item(&db, "Peppered Chicken", 10_000).await?;

        let placed = place_test_order(&db, &user, &[(item.id, 2)]).await?;
        assert_eq!(placed.order.subtotal, 20_000);
        assert_eq!(placed.order.delivery_fee, 2_000);
        assert_eq!(placed.order.total, 22_000);
        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(placed.order.payment_status, PaymentStatus::Paid);
        assert_eq!(placed.items.len(), 1);
        assert_eq!(placed.items[0].name, "Peppered Chicken");
        assert_eq!(placed.items[0].line_total(), 20_000);

        // Editing the menu later leaves the order untouched
        let mut edit: crate::entities::menu_item::ActiveModel = item.into();
        edit.price = Set(99_999);
        edit.name = Set("Renamed".to_string());
        edit.update(&db).await?;

        let reloaded = get_order(&db, placed.order.id, &user).await?;
        assert_eq!(reloaded.items[0].price, 10_000);
        assert_eq!(reloaded.items[0].name, "Peppered Chicken");
        assert_eq!(reloaded.order.total, 22_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_free_delivery() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "ada@example.com").await?;
        let platter = create_test_menu_item(&db, "Platter", 40_000).await?;
        let wine = create_test_menu_item(&db, "Wine", 20_000).await?;

        let placed = place_test_order(&db, &user, &[(platter.id, 1), (wine.id, 1)]).await?;
        assert_eq!(placed.order.subtotal, 60_000);
        assert_eq!(placed.order.delivery_fee, 0);
        assert_eq!(placed.order.total, 60_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_rejects_unavailable_item() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "ada@example.com").await?;
        let item = create_test_menu_item(&db, "Suya", 4_500).await?;
        crate::core::menu::set_availability(&db, item.id, Some(false)).await?;

        let result = create_order(&db, &user, checkout(&[(item.id, 1)])).await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        let result = create_order(&db, &user, checkout(&[(4_242, 1)])).await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        // Nothing was written
        assert!(list_orders(&db, &user).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_can_jump_statuses() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db).await?;
        let user = create_test_user(&db, "ada@example.com").await?;
        let item = create_test_menu_item(&db, "Suya", 4_500).await?;
        let placed = place_test_order(&db, &user, &[(item.id, 1)]).await?;

        // pending -> ready skips confirmed/preparing; accepted as-is
        let ready = set_status(&db, placed.order.id, "ready", &admin).await?;
        assert_eq!(ready.order.status, OrderStatus::Ready);
        assert_eq!(ready.items.len(), 1);

        // Terminal statuses are not enforced for admins either
        set_status(&db, placed.order.id, "delivered", &admin).await?;
        let reopened = set_status(&db, placed.order.id, "preparing", &admin).await?;
        assert_eq!(reopened.order.status, OrderStatus::Preparing);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_status_rules() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db).await?;
        let user = create_test_user(&db, "ada@example.com").await?;
        let item = create_test_menu_item(&db, "Suya", 4_500).await?;
        let placed = place_test_order(&db, &user, &[(item.id, 1)]).await?;

        let result = set_status(&db, placed.order.id, "ready", &user).await;
        assert!(matches!(result, Err(Error::Forbidden { message: _ })));

        let result = set_status(&db, placed.order.id, "shipped", &admin).await;
        assert!(matches!(result, Err(Error::InvalidStatus { status: _ })));

        let result = set_status(&db, 999, "ready", &admin).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_only_while_pending() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db).await?;
        let user = create_test_user(&db, "ada@example.com").await?;
        let item = create_test_menu_item(&db, "Suya", 4_500).await?;

        let pending = place_test_order(&db, &user, &[(item.id, 1)]).await?;
        let cancelled = cancel_order(&db, pending.order.id, &user).await?;
        assert_eq!(cancelled.order.status, OrderStatus::Cancelled);

        let confirmed = place_test_order(&db, &user, &[(item.id, 1)]).await?;
        set_status(&db, confirmed.order.id, "confirmed", &admin).await?;
        let result = cancel_order(&db, confirmed.order.id, &user).await;
        assert!(matches!(result, Err(Error::InvalidState { .. })));

        // Already-cancelled orders are not pending either
        let result = cancel_order(&db, pending.order.id, &user).await;
        assert!(matches!(result, Err(Error::InvalidState { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_requires_owner_or_admin() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db).await?;
        let ada = create_test_user(&db, "ada@example.com").await?;
        let bob = create_test_user(&db, "bob@example.com").await?;
        let item = create_test_menu_item(&db, "Suya", 4_500).await?;
        let placed = place_test_order(&db, &ada, &[(item.id, 1)]).await?;

        let result = cancel_order(&db, placed.order.id, &bob).await;
        assert!(matches!(result, Err(Error::Forbidden { message: _ })));

        let cancelled = cancel_order(&db, placed.order.id, &admin).await?;
        assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
        Ok(())
    }

    #[tokio::test]
    async fn test_customers_only_see_their_own_orders() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db).await?;
        let ada = create_test_user(&db, "ada@example.com").await?;
        let bob = create_test_user(&db, "bob@example.com").await?;
        let item = create_test_menu_item(&db, "Suya", 4_500).await?;

        let adas = place_test_order(&db, &ada, &[(item.id, 1)]).await?;
        place_test_order(&db, &bob, &[(item.id, 2)]).await?;

        let visible = list_orders(&db, &ada).await?;
        assert_eq!(visible.len(), 1);
        assert!(visible.iter().all(|o| o.order.user_id == ada.id));

        let result = get_order(&db, adas.order.id, &bob).await;
        assert!(matches!(result, Err(Error::Forbidden { message: _ })));

        assert_eq!(list_orders(&db, &admin).await?.len(), 2);
        assert_eq!(get_order(&db, adas.order.id, &admin).await?.order.id, adas.order.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_listing_is_capped() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db).await?;
        let user = create_test_user(&db, "ada@example.com").await?;
        let item = create_test_menu_item(&db, "Puff Puff", 500).await?;

        let mut last = None;
        for _ in 0..(ADMIN_ORDER_LIMIT + 3) {
            last = Some(place_test_order(&db, &user, &[(item.id, 1)]).await?);
        }

        let listed = list_orders(&db, &admin).await?;
        assert_eq!(listed.len() as u64, ADMIN_ORDER_LIMIT);
        assert_eq!(listed[0].order.id, last.unwrap().order.id);
        assert!(listed.iter().all(|o| o.items.len() == 1));

        // The owner still sees everything
        assert_eq!(
            list_orders(&db, &user).await?.len() as u64,
            ADMIN_ORDER_LIMIT + 3
        );
        Ok(())
    }
}
