// Loads settings once at startup and saves them after every mutation.
// The blob lives under a single fixed key, shaped like the browser's local storage entry.
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::model::AmbientSettings;
use crate::error::Result;

pub const SETTINGS_KEY: &str = "chayakada-audio-settings";

/// Stand-in for browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

// <data_dir>/<key>.json
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?; // create the data dir if needed
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

// Clones share the same map, so a test can keep a handle and inspect what was written.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    #[cfg(test)]
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        store.entries.borrow_mut().insert(key.to_string(), value.to_string());
        store
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadedSettings {
    pub settings: AmbientSettings,
    /// Only `Some` when the blob carried the flag.
    pub realistic_mode: Option<bool>,
}

#[derive(Serialize)]
struct PersistedSettings<'a> {
    #[serde(flatten)]
    settings: &'a AmbientSettings,
    #[serde(rename = "realisticMode")]
    realistic_mode: bool,
}

pub struct SettingsStore {
    backend: Box<dyn KeyValueStore>,
    key: String,
}

impl SettingsStore {
    pub fn new(backend: Box<dyn KeyValueStore>) -> Self {
        Self { backend, key: SETTINGS_KEY.to_string() }
    }

    /// Never fails: anything unreadable falls back to the defaults.
    pub fn load(&self) -> LoadedSettings {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return LoadedSettings::default(),
            Err(e) => {
                warn!("could not read persisted settings: {e}");
                return LoadedSettings::default();
            }
        };
        let blob: Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("persisted settings are not JSON, using defaults: {e}");
                return LoadedSettings::default();
            }
        };
        let loaded = merge_over_defaults(&blob);
        debug!(?loaded, "settings loaded");
        loaded
    }

    pub fn save(&mut self, settings: &AmbientSettings, realistic_mode: bool) -> Result<()> {
        let json = serde_json::to_string(&PersistedSettings { settings, realistic_mode })?;
        self.backend.set(&self.key, &json)
    }
}

fn merge_over_defaults(blob: &Value) -> LoadedSettings {
    let Value::Object(blob) = blob else {
        warn!("persisted settings are not an object, using defaults");
        return LoadedSettings::default();
    };
    let defaults = AmbientSettings::default();
    let section = |name: &str| blob.get(name);
    let settings = AmbientSettings {
        rain: merge_section(&defaults.rain, section("rain"), "rain"),
        thunder: merge_section(&defaults.thunder, section("thunder"), "thunder"),
        lightning: merge_section(&defaults.lightning, section("lightning"), "lightning"),
        crowd: merge_section(&defaults.crowd, section("crowd"), "crowd"),
        music: merge_section(&defaults.music, section("music"), "music"),
    };
    LoadedSettings {
        settings,
        realistic_mode: blob.get("realisticMode").and_then(Value::as_bool),
    }
}

// Overlays the persisted fields one at a time, so one unreadable field only
// costs that field. Fields we don't know are dropped.
fn merge_section<T>(defaults: &T, patch: Option<&Value>, section: &str) -> T
where
    T: Serialize + DeserializeOwned + Clone,
{
    let Some(patch) = patch else {
        return defaults.clone();
    };
    let Value::Object(patch) = patch else {
        warn!(section, "persisted section is not an object, keeping defaults");
        return defaults.clone();
    };
    let mut merged: Map<String, Value> = match serde_json::to_value(defaults) {
        Ok(Value::Object(map)) => map,
        _ => return defaults.clone(),
    };
    for (field, value) in patch {
        if !merged.contains_key(field) {
            continue;
        }
        let mut candidate = merged.clone();
        candidate.insert(field.clone(), value.clone());
        if serde_json::from_value::<T>(Value::Object(candidate.clone())).is_ok() {
            merged = candidate;
        } else {
            warn!(section, field = field.as_str(), "ignoring unreadable persisted field");
        }
    }
    serde_json::from_value(Value::Object(merged)).unwrap_or_else(|_| defaults.clone())
}
