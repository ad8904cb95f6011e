//! Restaurant settings singleton.

use crate::{
    config::seed::SettingsSeed,
    entities::{
        Settings,
        settings::{self, SINGLETON_ID, StringMap},
    },
    errors::{Error, Result},
};
use sea_orm::{Set, sea_query::OnConflict, prelude::*};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::info;

/// Partial update of the settings row; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub restaurant_name: Option<String>,
    pub tagline: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub opening_hours: Option<BTreeMap<String, String>>,
    pub delivery_fee: Option<i64>,
    pub free_delivery_threshold: Option<i64>,
    pub tax_rate: Option<f64>,
    pub currency: Option<String>,
    pub socials: Option<BTreeMap<String, String>>,
}

impl SettingsPatch {
    fn validate(&self) -> Result<()> {
        if self.delivery_fee.is_some_and(|fee| fee < 0) {
            return Err(Error::validation("Delivery fee cannot be negative"));
        }
        if self.free_delivery_threshold.is_some_and(|t| t < 0) {
            return Err(Error::validation(
                "Free delivery threshold cannot be negative",
            ));
        }
        if self.tax_rate.is_some_and(|rate| !rate.is_finite() || rate < 0.0) {
            return Err(Error::validation("Tax rate cannot be negative"));
        }
        if self
            .restaurant_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(Error::validation("Restaurant name cannot be empty"));
        }
        Ok(())
    }
}

fn defaults_row(defaults: &SettingsSeed) -> settings::ActiveModel {
    settings::ActiveModel {
        id: Set(SINGLETON_ID),
        restaurant_name: Set(defaults.restaurant_name.clone()),
        tagline: Set(defaults.tagline.clone()),
        email: Set(defaults.email.clone()),
        phone: Set(defaults.phone.clone()),
        address: Set(defaults.address.clone()),
        opening_hours: Set(StringMap(defaults.opening_hours.clone())),
        delivery_fee: Set(defaults.delivery_fee),
        free_delivery_threshold: Set(defaults.free_delivery_threshold),
        tax_rate: Set(defaults.tax_rate),
        currency: Set(defaults.currency.clone()),
        socials: Set(StringMap(defaults.socials.clone())),
        updated_at: Set(chrono::Utc::now()),
    }
}

/// Returns the settings row, creating it from `defaults` on first read.
///
/// Concurrent first reads race on the fixed primary key; the insert ignores
/// the conflict so exactly one row is ever created.
pub async fn get_settings(
    db: &DatabaseConnection,
    defaults: &SettingsSeed,
) -> Result<settings::Model> {
    if let Some(existing) = Settings::find_by_id(SINGLETON_ID).one(db).await? {
        return Ok(existing);
    }

    let inserted = Settings::insert(defaults_row(defaults))
        .on_conflict(
            OnConflict::column(settings::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    if inserted > 0 {
        info!("Created settings with defaults");
    }

    Settings::find_by_id(SINGLETON_ID)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Settings", SINGLETON_ID))
}

/// Applies a partial update to the settings row.
///
/// # Errors
/// Returns `Validation` for negative fees or tax rates or an empty restaurant name.
pub async fn update_settings(
    db: &DatabaseConnection,
    defaults: &SettingsSeed,
    patch: SettingsPatch,
) -> Result<settings::Model> {
    patch.validate()?;
    let mut row: settings::ActiveModel = get_settings(db, defaults).await?.into();

    if let Some(name) = patch.restaurant_name {
        row.restaurant_name = Set(name.trim().to_string());
    }
    if let Some(tagline) = patch.tagline {
        row.tagline = Set(tagline);
    }
    if let Some(email) = patch.email {
        row.email = Set(email.trim().to_string());
    }
    if let Some(phone) = patch.phone {
        row.phone = Set(phone.trim().to_string());
    }
    if let Some(address) = patch.address {
        row.address = Set(address);
    }
    if let Some(hours) = patch.opening_hours {
        row.opening_hours = Set(StringMap(hours));
    }
    if let Some(fee) = patch.delivery_fee {
        row.delivery_fee = Set(fee);
    }
    if let Some(threshold) = patch.free_delivery_threshold {
        row.free_delivery_threshold = Set(threshold);
    }
    if let Some(rate) = patch.tax_rate {
        row.tax_rate = Set(rate);
    }
    if let Some(currency) = patch.currency {
        row.currency = Set(currency.trim().to_uppercase());
    }
    if let Some(socials) = patch.socials {
        row.socials = Set(StringMap(socials));
    }
    row.updated_at = Set(chrono::Utc::now());

    let updated = row.update(db).await?;
    info!(restaurant = %updated.restaurant_name, "Settings updated");
    Ok(updated)
}
