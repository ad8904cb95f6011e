//! Shared test utilities.
//!
//! Helpers for setting up an in-memory database and creating users, menu
//! items and orders with sensible defaults.

use crate::{
    core::{
        auth::{self, AuthKeys, RegisterInput},
        menu::{self, MenuItemInput},
        order::{self, CheckoutInput, OrderLineInput, OrderWithItems},
    },
    entities::{
        menu_item::{self, Category},
        order::{ContactInfo, DeliveryAddress, PaymentMethod},
        user::{self, Role},
    },
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;

/// Password of every user created by these helpers.
pub const TEST_PASSWORD: &str = "password123";

/// Secret used to sign tokens in tests.
pub const TEST_JWT_SECRET: &str = "test-secret";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

#[must_use]
pub fn test_keys() -> AuthKeys {
    AuthKeys::new(TEST_JWT_SECRET)
}

/// Registers a customer named after the local part of `email`.
///
/// # Defaults
/// * `name`: "Test {local part}"
/// * `password`: [`TEST_PASSWORD`]
pub async fn create_test_user(db: &DatabaseConnection, email: &str) -> Result<user::Model> {
    let local = email.split('@').next().unwrap_or(email);
    let response = auth::register(
        db,
        &test_keys(),
        RegisterInput {
            name: format!("Test {local}"),
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            phone: None,
        },
    )
    .await?;
    crate::core::user::get_user_by_id(db, response.id)
        .await?
        .ok_or_else(|| Error::not_found("User", response.id))
}

/// Creates the admin account `admin@example.com`.
pub async fn create_test_admin(db: &DatabaseConnection) -> Result<user::Model> {
    auth::ensure_admin(db, "Test Admin", "admin@example.com", TEST_PASSWORD)
        .await?
        .ok_or_else(|| Error::validation("Test admin already exists"))
}

/// An unsaved user model, for code paths that never touch the database.
#[must_use]
pub fn sample_user(role: Role) -> user::Model {
    let now = chrono::Utc::now();
    user::Model {
        id: 1,
        name: "Sample".to_string(),
        email: "sample@example.com".to_string(),
        password_hash: String::new(),
        phone: None,
        role,
        loyalty_points: 0,
        is_blocked: false,
        created_at: now,
        updated_at: now,
    }
}

/// Creates an available main course with the given name and price.
pub async fn create_test_menu_item(
    db: &DatabaseConnection,
    name: &str,
    price: i64,
) -> Result<menu_item::Model> {
    create_test_menu_item_in(db, name, price, Category::Mains).await
}

/// Creates an available menu item in `category`.
pub async fn create_test_menu_item_in(
    db: &DatabaseConnection,
    name: &str,
    price: i64,
    category: Category,
) -> Result<menu_item::Model> {
    menu::create_menu_item(
        db,
        MenuItemInput {
            name: name.to_string(),
            description: format!("{name} made fresh"),
            price,
            category,
            image: None,
            is_available: true,
            is_featured: false,
            prep_time: 15,
            calories: None,
            ingredients: Vec::new(),
            allergens: Vec::new(),
        },
    )
    .await
}

/// Builds a complete checkout payload for `(menu_item_id, quantity)` lines.
#[must_use]
pub fn checkout(lines: &[(i64, i32)]) -> CheckoutInput {
    CheckoutInput {
        items: lines
            .iter()
            .map(|&(menu_item_id, quantity)| OrderLineInput {
                menu_item_id,
                quantity,
            })
            .collect(),
        delivery_address: DeliveryAddress {
            street: "12 Marina Road".to_string(),
            city: "Lagos".to_string(),
            state: "Lagos".to_string(),
            postal_code: None,
        },
        contact_info: ContactInfo {
            name: "Test Customer".to_string(),
            phone: "+2348000000000".to_string(),
            email: None,
        },
        payment_method: PaymentMethod::Card,
        notes: None,
    }
}

/// Places an order for `user` with [`checkout`] defaults.
pub async fn place_test_order(
    db: &DatabaseConnection,
    user: &user::Model,
    lines: &[(i64, i32)],
) -> Result<OrderWithItems> {
    order::create_order(db, user, checkout(lines)).await
}
