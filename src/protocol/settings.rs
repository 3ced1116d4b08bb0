use std::path::PathBuf;

use serde_json::{json, Value};

use crate::error::{C3poError, C3poResult};
use crate::model::settings::Settings;
use crate::services::settings as service;

fn settings_path(payload: &Value) -> PathBuf {
    payload
        .get("settings_path")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(service::default_settings_path)
}

/// Loaded settings with the request's `settings` object merged over them.
pub fn resolve(payload: &Value) -> C3poResult<Settings> {
    let loaded = service::load_settings_from(&settings_path(payload))?;
    match payload.get("settings") {
        Some(overrides) => service::apply_overrides(&loaded, overrides),
        None => Ok(loaded),
    }
}

fn save(payload: &Value) -> C3poResult<Value> {
    let path = settings_path(payload);
    let value = payload
        .get("settings")
        .ok_or_else(|| C3poError::Config("payload.settings is required".into()))?;

    let loaded = service::load_settings_from(&path)?;
    let settings = service::apply_overrides(&loaded, value)?;
    service::save_settings_to(&path, &settings)?;

    Ok(json!({
        "path": path.display().to_string(),
        "settings": settings
    }))
}

pub fn handle(cmd: &str, payload: &Value) -> Option<C3poResult<Value>> {
    match cmd {
        "settings.load" => Some(resolve(payload).map(|settings| {
            json!({
                "path": settings_path(payload).display().to_string(),
                "settings": settings
            })
        })),

        "settings.save" => Some(save(payload)),

        _ => None,
    }
}
