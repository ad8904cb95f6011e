//! User business logic - profiles, address books and customer administration.

use crate::{
    entities::{Address, Order, User, address, order, user},
    errors::{Error, Result},
};
use sea_orm::sea_query::Expr;
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Retrieves a user by id.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Profile fields a user may change about themselves.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Updates name and/or phone. Absent fields are left unchanged; an empty phone clears it.
pub async fn update_profile(
    db: &DatabaseConnection,
    user_id: i64,
    update: ProfileUpdate,
) -> Result<user::Model> {
    let mut user: user::ActiveModel = get_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?
        .into();

    if let Some(name) = update.name {
        if name.trim().is_empty() {
            return Err(Error::validation("Name cannot be empty"));
        }
        user.name = Set(name.trim().to_string());
    }
    if let Some(phone) = update.phone {
        let phone = phone.trim().to_string();
        user.phone = Set((!phone.is_empty()).then_some(phone));
    }
    user.updated_at = Set(chrono::Utc::now());

    user.update(db).await.map_err(Into::into)
}

/// Replaces the password after checking the current one.
///
/// # Errors
/// Returns `Unauthorized` if `current` does not match and `Validation` if `new` is too short.
pub async fn change_password(
    db: &DatabaseConnection,
    user_id: i64,
    current: &str,
    new: &str,
) -> Result<()> {
    crate::core::auth::validate_password(new)?;
    let existing = get_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;
    if !crate::core::auth::verify_password(current, &existing.password_hash)? {
        return Err(Error::unauthorized("Current password is incorrect"));
    }

    let mut user: user::ActiveModel = existing.into();
    user.password_hash = Set(crate::core::auth::hash_password(new)?);
    user.updated_at = Set(chrono::Utc::now());
    user.update(db).await?;
    Ok(())
}

/// Address book entry payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    #[serde(default)]
    pub label: String,
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressInput {
    fn validate(&self) -> Result<()> {
        if self.street.trim().is_empty() || self.city.trim().is_empty() {
            return Err(Error::validation("Street and city are required"));
        }
        Ok(())
    }

    fn label(&self) -> String {
        let label = self.label.trim();
        if label.is_empty() {
            "Home".to_string()
        } else {
            label.to_string()
        }
    }
}

/// Lists a user's addresses, default first.
pub async fn list_addresses(db: &DatabaseConnection, user_id: i64) -> Result<Vec<address::Model>> {
    Address::find()
        .filter(address::Column::UserId.eq(user_id))
        .order_by_desc(address::Column::IsDefault)
        .order_by_asc(address::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn clear_default<C>(db: &C, user_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    Address::update_many()
        .col_expr(address::Column::IsDefault, Expr::value(false))
        .filter(address::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Adds an address. The first address a user saves becomes the default.
pub async fn add_address(
    db: &DatabaseConnection,
    user_id: i64,
    input: AddressInput,
) -> Result<address::Model> {
    input.validate()?;
    let txn = db.begin().await?;

    let has_addresses = Address::find()
        .filter(address::Column::UserId.eq(user_id))
        .count(&txn)
        .await?
        > 0;
    let is_default = input.is_default || !has_addresses;
    if is_default {
        clear_default(&txn, user_id).await?;
    }

    let model = address::ActiveModel {
        user_id: Set(user_id),
        label: Set(input.label()),
        street: Set(input.street.trim().to_string()),
        city: Set(input.city.trim().to_string()),
        state: Set(input.state.trim().to_string()),
        postal_code: Set(input.postal_code),
        is_default: Set(is_default),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(model)
}

async fn find_owned_address<C>(db: &C, user_id: i64, address_id: i64) -> Result<address::Model>
where
    C: ConnectionTrait,
{
    Address::find_by_id(address_id)
        .filter(address::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Address", address_id))
}

/// Replaces an address's fields.
pub async fn update_address(
    db: &DatabaseConnection,
    user_id: i64,
    address_id: i64,
    input: AddressInput,
) -> Result<address::Model> {
    input.validate()?;
    let txn = db.begin().await?;
    let existing = find_owned_address(&txn, user_id, address_id).await?;

    let is_default = input.is_default || existing.is_default;
    if input.is_default && !existing.is_default {
        clear_default(&txn, user_id).await?;
    }

    let mut model: address::ActiveModel = existing.into();
    model.label = Set(input.label());
    model.street = Set(input.street.trim().to_string());
    model.city = Set(input.city.trim().to_string());
    model.state = Set(input.state.trim().to_string());
    model.postal_code = Set(input.postal_code);
    model.is_default = Set(is_default);
    let updated = model.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

/// Deletes an address. If it was the default, the oldest remaining one takes over.
pub async fn delete_address(db: &DatabaseConnection, user_id: i64, address_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let existing = find_owned_address(&txn, user_id, address_id).await?;
    let was_default = existing.is_default;
    existing.delete(&txn).await?;

    if was_default {
        let next = Address::find()
            .filter(address::Column::UserId.eq(user_id))
            .order_by_asc(address::Column::Id)
            .one(&txn)
            .await?;
        if let Some(next) = next {
            let mut next: address::ActiveModel = next.into();
            next.is_default = Set(true);
            next.update(&txn).await?;
        }
    }

    txn.commit().await?;
    Ok(())
}

/// Makes `address_id` the only default address of the user.
pub async fn set_default_address(
    db: &DatabaseConnection,
    user_id: i64,
    address_id: i64,
) -> Result<address::Model> {
    let txn = db.begin().await?;
    let existing = find_owned_address(&txn, user_id, address_id).await?;
    clear_default(&txn, user_id).await?;

    let mut model: address::ActiveModel = existing.into();
    model.is_default = Set(true);
    let updated = model.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

/// A customer row on the admin customers page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    #[serde(flatten)]
    pub user: user::Model,
    pub order_count: u64,
    /// Sum of totals over the customer's non-cancelled orders
    pub total_spent: i64,
}

/// Lists customers (role `user`), newest first, with order counts and spend.
pub async fn list_customers(db: &DatabaseConnection) -> Result<Vec<CustomerSummary>> {
    let customers = User::find()
        .filter(user::Column::Role.eq(user::Role::User))
        .order_by_desc(user::Column::CreatedAt)
        .all(db)
        .await?;
    let orders = Order::find().all(db).await?;

    let mut per_user: HashMap<i64, (u64, i64)> = HashMap::new();
    for order in &orders {
        let entry = per_user.entry(order.user_id).or_default();
        entry.0 += 1;
        if order.status != order::OrderStatus::Cancelled {
            entry.1 += order.total;
        }
    }

    Ok(customers
        .into_iter()
        .map(|user| {
            let (order_count, total_spent) = per_user.get(&user.id).copied().unwrap_or_default();
            CustomerSummary {
                user,
                order_count,
                total_spent,
            }
        })
        .collect())
}

/// Blocks or unblocks a customer. Admin accounts cannot be blocked.
pub async fn set_blocked(
    db: &DatabaseConnection,
    user_id: i64,
    blocked: bool,
) -> Result<user::Model> {
    let existing = get_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;
    if existing.is_admin() {
        return Err(Error::validation("Admin accounts cannot be blocked"));
    }

    let mut model: user::ActiveModel = existing.into();
    model.is_blocked = Set(blocked);
    model.updated_at = Set(chrono::Utc::now());
    let updated = model.update(db).await?;
    info!(user_id, blocked, "Updated customer block flag");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn home(street: &str) -> AddressInput {
        AddressInput {
            label: String::new(),
            street: street.to_string(),
            city: "Lagos".to_string(),
            state: "LA".to_string(),
            postal_code: None,
            is_default: false,
        }
    }

    #[tokio::test]
    async fn test_update_profile() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "ada@example.com").await?;

        let updated = update_profile(
            &db,
            user.id,
            ProfileUpdate {
                name: Some(" Ada L. ".to_string()),
                phone: Some("0800 000 0000".to_string()),
            },
        )
        .await?;
        assert_eq!(updated.name, "Ada L.");
        assert_eq!(updated.phone.as_deref(), Some("0800 000 0000"));

        let cleared = update_profile(
            &db,
            user.id,
            ProfileUpdate {
                name: None,
                phone: Some(String::new()),
            },
        )
        .await?;
        assert_eq!(cleared.name, "Ada L.");
        assert!(cleared.phone.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_change_password_requires_current() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "ada@example.com").await?;

        let result = change_password(&db, user.id, "wrong", "newpass123").await;
        assert!(matches!(result, Err(Error::Unauthorized { message: _ })));

        change_password(&db, user.id, TEST_PASSWORD, "newpass123").await?;
        let reloaded = get_user_by_id(&db, user.id).await?.unwrap();
        assert!(crate::core::auth::verify_password("newpass123", &reloaded.password_hash)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_first_address_becomes_default() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "ada@example.com").await?;

        let first = add_address(&db, user.id, home("1 Marina")).await?;
        let second = add_address(&db, user.id, home("2 Broad St")).await?;
        assert!(first.is_default);
        assert!(!second.is_default);
        assert_eq!(first.label, "Home");
        Ok(())
    }

    #[tokio::test]
    async fn test_set_default_address_is_exclusive() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "ada@example.com").await?;
        let first = add_address(&db, user.id, home("1 Marina")).await?;
        let second = add_address(&db, user.id, home("2 Broad St")).await?;

        set_default_address(&db, user.id, second.id).await?;

        let addresses = list_addresses(&db, user.id).await?;
        let defaults: Vec<i64> = addresses
            .iter()
            .filter(|a| a.is_default)
            .map(|a| a.id)
            .collect();
        assert_eq!(defaults, vec![second.id]);
        assert_eq!(addresses[1].id, first.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_default_address_promotes_next() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "ada@example.com").await?;
        let first = add_address(&db, user.id, home("1 Marina")).await?;
        let second = add_address(&db, user.id, home("2 Broad St")).await?;

        delete_address(&db, user.id, first.id).await?;

        let addresses = list_addresses(&db, user.id).await?;
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].id, second.id);
        assert!(addresses[0].is_default);
        Ok(())
    }

    #[tokio::test]
    async fn test_addresses_are_private() -> Result<()> {
        let db = setup_test_db().await?;
        let ada = create_test_user(&db, "ada@example.com").await?;
        let bob = create_test_user(&db, "bob@example.com").await?;
        let address = add_address(&db, ada.id, home("1 Marina")).await?;

        let result = delete_address(&db, bob.id, address.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_add_address_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "ada@example.com").await?;
        let result = add_address(&db, user.id, home("  ")).await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_customers_summarizes_orders() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db).await?;
        let ada = create_test_user(&db, "ada@example.com").await?;
        let item = create_test_menu_item(&db, "Suya", 10_000).await?;

        place_test_order(&db, &ada, &[(item.id, 2)]).await?;
        let cancelled = place_test_order(&db, &ada, &[(item.id, 1)]).await?;
        crate::core::order::cancel_order(&db, cancelled.order.id, &ada).await?;

        let customers = list_customers(&db).await?;
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].user.id, ada.id);
        assert_eq!(customers[0].order_count, 2);
        assert_eq!(customers[0].total_spent, 22_000);
        assert!(customers.iter().all(|c| c.user.id != admin.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_cannot_be_blocked() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db).await?;
        let result = set_blocked(&db, admin.id, true).await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));
        Ok(())
    }
}
