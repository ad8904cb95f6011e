//! Menu business logic - browsing, administration and seeding of menu items.
//!
//! Deleting a menu item removes it (and its reviews) for good; order history is
//! unaffected because order lines carry their own snapshot of the item.

use crate::{
    config::seed::MenuItemSeed,
    entities::{MenuItem, menu_item},
    errors::{Error, Result},
};
use sea_orm::{Condition, PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::info;

/// Highest accepted price, minor units.
pub const MAX_PRICE: i64 = 100_000_000_000;

/// Optional filters for [`list_menu_items`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuFilter {
    #[serde(default)]
    pub category: Option<menu_item::Category>,
    /// Case-insensitive match against name or description
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub available: Option<bool>,
}

/// Lists menu items matching `filter`, ordered by name.
pub async fn list_menu_items(
    db: &DatabaseConnection,
    filter: &MenuFilter,
) -> Result<Vec<menu_item::Model>> {
    let mut condition = Condition::all();
    if let Some(category) = filter.category {
        condition = condition.add(menu_item::Column::Category.eq(category));
    }
    if let Some(featured) = filter.featured {
        condition = condition.add(menu_item::Column::IsFeatured.eq(featured));
    }
    if let Some(available) = filter.available {
        condition = condition.add(menu_item::Column::IsAvailable.eq(available));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(menu_item::Column::Name.contains(search))
                .add(menu_item::Column::Description.contains(search)),
        );
    }

    MenuItem::find()
        .filter(condition)
        .order_by_asc(menu_item::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific menu item by its unique ID.
pub async fn get_menu_item(
    db: &DatabaseConnection,
    menu_item_id: i64,
) -> Result<Option<menu_item::Model>> {
    MenuItem::find_by_id(menu_item_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Create/replace payload for a menu item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub category: menu_item::Category,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_prep_time")]
    pub prep_time: i32,
    #[serde(default)]
    pub calories: Option<i32>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
}

const fn default_true() -> bool {
    true
}

const fn default_prep_time() -> i32 {
    15
}

impl MenuItemInput {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("Menu item name cannot be empty"));
        }
        if self.price < 0 {
            return Err(Error::validation("Price cannot be negative"));
        }
        if self.price > MAX_PRICE {
            return Err(Error::validation(format!(
                "Price cannot exceed {MAX_PRICE}"
            )));
        }
        if self.prep_time < 0 {
            return Err(Error::validation("Prep time cannot be negative"));
        }
        if self.calories.is_some_and(|c| c < 0) {
            return Err(Error::validation("Calories cannot be negative"));
        }
        Ok(())
    }
}

impl From<&MenuItemSeed> for MenuItemInput {
    fn from(seed: &MenuItemSeed) -> Self {
        Self {
            name: seed.name.clone(),
            description: seed.description.clone(),
            price: seed.price,
            category: seed.category,
            image: seed.image.clone(),
            is_available: true,
            is_featured: seed.is_featured,
            prep_time: seed.prep_time,
            calories: seed.calories,
            ingredients: seed.ingredients.clone(),
            allergens: seed.allergens.clone(),
        }
    }
}

fn clean_list(values: Vec<String>) -> menu_item::StringList {
    menu_item::StringList(
        values
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect(),
    )
}

/// Creates a menu item. Rating starts at 0 with no reviews.
pub async fn create_menu_item(
    db: &DatabaseConnection,
    input: MenuItemInput,
) -> Result<menu_item::Model> {
    input.validate()?;
    let now = chrono::Utc::now();

    let item = menu_item::ActiveModel {
        name: Set(input.name.trim().to_string()),
        description: Set(input.description.trim().to_string()),
        price: Set(input.price),
        category: Set(input.category),
        image: Set(input.image),
        rating: Set(0.0),
        review_count: Set(0),
        is_available: Set(input.is_available),
        is_featured: Set(input.is_featured),
        prep_time: Set(input.prep_time),
        calories: Set(input.calories),
        ingredients: Set(clean_list(input.ingredients)),
        allergens: Set(clean_list(input.allergens)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let item = item.insert(db).await?;
    info!(menu_item_id = item.id, "Created menu item {}", item.name);
    Ok(item)
}

/// Replaces the editable fields of a menu item. Rating and review count are untouched.
pub async fn update_menu_item(
    db: &DatabaseConnection,
    menu_item_id: i64,
    input: MenuItemInput,
) -> Result<menu_item::Model> {
    input.validate()?;
    let mut item: menu_item::ActiveModel = get_menu_item(db, menu_item_id)
        .await?
        .ok_or_else(|| Error::not_found("Menu item", menu_item_id))?
        .into();

    item.name = Set(input.name.trim().to_string());
    item.description = Set(input.description.trim().to_string());
    item.price = Set(input.price);
    item.category = Set(input.category);
    item.image = Set(input.image);
    item.is_available = Set(input.is_available);
    item.is_featured = Set(input.is_featured);
    item.prep_time = Set(input.prep_time);
    item.calories = Set(input.calories);
    item.ingredients = Set(clean_list(input.ingredients));
    item.allergens = Set(clean_list(input.allergens));
    item.updated_at = Set(chrono::Utc::now());

    item.update(db).await.map_err(Into::into)
}

/// Deletes a menu item and its reviews.
pub async fn delete_menu_item(db: &DatabaseConnection, menu_item_id: i64) -> Result<()> {
    let result = MenuItem::delete_by_id(menu_item_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("Menu item", menu_item_id));
    }
    info!(menu_item_id, "Deleted menu item");
    Ok(())
}

/// Sets availability to `available`, or flips it when `None`.
pub async fn set_availability(
    db: &DatabaseConnection,
    menu_item_id: i64,
    available: Option<bool>,
) -> Result<menu_item::Model> {
    let existing = get_menu_item(db, menu_item_id)
        .await?
        .ok_or_else(|| Error::not_found("Menu item", menu_item_id))?;
    let next = available.unwrap_or(!existing.is_available);

    let mut item: menu_item::ActiveModel = existing.into();
    item.is_available = Set(next);
    item.updated_at = Set(chrono::Utc::now());
    item.update(db).await.map_err(Into::into)
}

/// Inserts the seed menu when the menu table is empty. Returns the number of items inserted.
pub async fn seed_menu(db: &DatabaseConnection, seed: &[MenuItemSeed]) -> Result<usize> {
    if seed.is_empty() || MenuItem::find().count(db).await? > 0 {
        return Ok(0);
    }
    for entry in seed {
        create_menu_item(db, MenuItemInput::from(entry)).await?;
    }
    info!("Seeded {} menu items", seed.len());
    Ok(seed.len())
}
