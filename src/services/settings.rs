use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{C3poError, C3poResult};
use crate::model::settings::Settings;
use crate::services::staging::write_atomic;

const SETTINGS_FILE: &str = "settings.json";

fn settings_base_dir() -> PathBuf {
    if let Ok(home) = std::env::var("C3PO_HOME") {
        if !home.trim().is_empty() {
            return PathBuf::from(home);
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".c3po");
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".c3po")
}

pub fn default_settings_path() -> PathBuf {
    settings_base_dir().join(SETTINGS_FILE)
}

pub fn validate(settings: &Settings) -> C3poResult<()> {
    if settings.languages.is_empty() {
        return Err(C3poError::Config("languages must not be empty".into()));
    }
    if settings.languages.iter().any(|l| l.trim().is_empty()) {
        return Err(C3poError::Config("language codes must not be blank".into()));
    }
    if settings.locale_root.trim().is_empty() {
        return Err(C3poError::Config("locale_root must not be empty".into()));
    }
    Ok(())
}

/// Loads settings from `path`; a missing file is created with the defaults.
pub fn load_settings_from(path: &Path) -> C3poResult<Settings> {
    if !path.exists() {
        let settings = Settings::default();
        save_settings_to(path, &settings)?;
        tracing::info!(path = %path.display(), "wrote default settings");
        return Ok(settings);
    }

    let data = fs::read_to_string(path).map_err(|e| C3poError::io(path, e))?;
    let settings: Settings = serde_json::from_str(&data)
        .map_err(|e| C3poError::Config(format!("{}: {e}", path.display())))?;
    validate(&settings)?;
    Ok(settings)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> C3poResult<()> {
    validate(settings)?;
    let json = serde_json::to_string_pretty(settings)?;
    write_atomic(path, json.as_bytes())
}

fn merge_values(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (k, v) in overrides {
                match base.get_mut(k) {
                    Some(existing) => merge_values(existing, v),
                    None => {
                        base.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (base, v) => *base = v.clone(),
    }
}

/// Returns `settings` with a JSON object of per-request overrides merged in.
/// Nested objects merge key by key; anything else replaces the loaded value.
pub fn apply_overrides(settings: &Settings, overrides: &Value) -> C3poResult<Settings> {
    match overrides {
        Value::Null => return Ok(settings.clone()),
        Value::Object(_) => {}
        _ => return Err(C3poError::Config("overrides must be a JSON object".into())),
    }

    let mut value = serde_json::to_value(settings)?;
    merge_values(&mut value, overrides);
    let merged: Settings =
        serde_json::from_value(value).map_err(|e| C3poError::Config(e.to_string()))?;
    validate(&merged)?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(path.exists());
        assert_eq!(load_settings_from(&path).unwrap(), settings);
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        let settings = Settings {
            languages: vec!["en".into(), "de".into()],
            header: None,
            ..Settings::default()
        };

        save_settings_to(&path, &settings).unwrap();
        assert_eq!(load_settings_from(&path).unwrap(), settings);
    }

    #[test]
    fn overrides_merge_nested_objects() {
        let base = Settings::default();
        let merged = apply_overrides(
            &base,
            &json!({
                "languages": ["en", "fr"],
                "remote": { "kind": "directory", "directory": "/srv/share" }
            }),
        )
        .unwrap();

        assert_eq!(merged.languages, vec!["en", "fr"]);
        assert_eq!(merged.remote.directory, "/srv/share");
        assert_eq!(merged.remote.max_retries, base.remote.max_retries);
        assert_eq!(merged.po_files_path, base.po_files_path);
    }

    #[test]
    fn empty_language_list_is_rejected() {
        let err = apply_overrides(&Settings::default(), &json!({ "languages": [] })).unwrap_err();
        assert!(matches!(err, C3poError::Config(_)));
        assert!(apply_overrides(&Settings::default(), &json!("nope")).is_err());
    }
}
