//! `/api/settings` - restaurant settings.

use crate::{
    api::{AppState, error::ApiJson, extract::AdminUser},
    core::settings::{self, SettingsPatch},
    entities::settings::Model as Settings,
    errors::Result,
};
use axum::{Json, extract::State};

/// Public restaurant settings.
pub async fn get(State(state): State<AppState>) -> Result<Json<Settings>> {
    settings::get_settings(&state.db, &state.settings_defaults)
        .await
        .map(Json)
}

/// Admin only. Missing fields keep their current value.
pub async fn update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiJson(patch): ApiJson<SettingsPatch>,
) -> Result<Json<Settings>> {
    settings::update_settings(&state.db, &state.settings_defaults, patch)
        .await
        .map(Json)
}
