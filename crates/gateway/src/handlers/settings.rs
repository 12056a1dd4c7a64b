//! Settings handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::AppState;
use wishbox_common::{
    db::{Repository, SettingView},
    errors::{AppError, Result},
    settings::SettingsService,
};

/// Setting response
#[derive(Serialize)]
pub struct SettingResponse {
    pub name: String,
    pub value: Option<String>,
}

impl From<SettingView> for SettingResponse {
    fn from(view: SettingView) -> Self {
        Self {
            name: view.name,
            value: view.value,
        }
    }
}

fn settings_service(state: &AppState) -> SettingsService {
    SettingsService::new(Repository::new(state.db.clone()), state.cache.clone())
}

/// List all settings as a name-to-value mapping
pub async fn list_settings(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, Option<String>>>> {
    let settings = settings_service(&state).list().await?;
    Ok(Json(settings))
}

/// Get one setting by name
pub async fn get_setting(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SettingResponse>> {
    let setting = settings_service(&state)
        .get(&name)
        .await?
        .ok_or(AppError::SettingNotFound { name })?;

    Ok(Json(setting.into()))
}
