//! Seed data loading from seed.toml
//!
//! The seed file provides the defaults used when the settings row is first
//! created and an optional starter menu inserted into an empty menu table.
//! A missing file is not an error: built-in defaults are used instead.

use crate::entities::menu_item::Category;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Configuration structure representing the entire seed.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    /// Defaults for the settings singleton
    #[serde(default)]
    pub settings: SettingsSeed,
    /// Menu items inserted when the menu is empty
    #[serde(default)]
    pub menu: Vec<MenuItemSeed>,
}

/// Defaults for a freshly created settings row
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettingsSeed {
    pub restaurant_name: String,
    pub tagline: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub opening_hours: BTreeMap<String, String>,
    pub delivery_fee: i64,
    pub free_delivery_threshold: i64,
    pub tax_rate: f64,
    pub currency: String,
    pub socials: BTreeMap<String, String>,
}

impl Default for SettingsSeed {
    fn default() -> Self {
        let opening_hours = [
            "monday",
            "tuesday",
            "wednesday",
            "thursday",
            "friday",
            "saturday",
            "sunday",
        ]
        .into_iter()
        .map(|day| (day.to_string(), "10:00-22:00".to_string()))
        .collect();

        Self {
            restaurant_name: "Bistro".to_string(),
            tagline: "Fresh food, delivered".to_string(),
            email: "hello@bistro.local".to_string(),
            phone: String::new(),
            address: String::new(),
            opening_hours,
            delivery_fee: crate::core::order::DELIVERY_FEE,
            free_delivery_threshold: crate::core::order::FREE_DELIVERY_THRESHOLD,
            tax_rate: 0.0,
            currency: "NGN".to_string(),
            socials: BTreeMap::new(),
        }
    }
}

/// A single starter menu entry
#[derive(Debug, Clone, Deserialize)]
pub struct MenuItemSeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub category: Category,
    #[serde(default)]
    pub image: Option<String>,
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

const fn default_prep_time() -> i32 {
    15
}

/// Parses seed data from TOML text.
///
/// # Errors
/// Returns an error if the TOML syntax is invalid or a field has the wrong type.
pub fn parse_seed(contents: &str) -> Result<Seed> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse seed file: {e}"),
    })
}

/// Loads seed data from a TOML file, falling back to defaults when it does not exist.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_seed<P: AsRef<Path>>(path: P) -> Result<Seed> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        tracing::info!("No seed file at {:?}, using built-in defaults", path_ref);
        return Ok(Seed::default());
    }
    tracing::debug!("Attempting to load seed data from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read seed file {path_ref:?}: {e}"),
    })?;
    parse_seed(&contents)
}
