//! User shortcut customization persistence.
//!
//! The engine does not own a storage mechanism. Customizations are read
//! from and written to an injected [`SettingsStore`]; the engine's only
//! obligation is to apply them at startup via plain unregister/register
//! calls. Format: a map from original spec string to either
//! `{"disabled": true}` or `{"replacement": "...", "options": {...}}`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ResultExt;

use super::registry::{BindingOptions, RegistryError};

/// Store key under which the customization document lives.
pub const CUSTOMIZATIONS_KEY: &str = "debug-shortcuts-customizations";

/// Minimal key-value storage capability, injected by the embedder.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// Error that can occur when loading, saving, or applying customizations.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid customization for '{spec}': {source}")]
    Customization {
        spec: String,
        #[source]
        source: RegistryError,
    },
}

/// One persisted user customization for a shortcut.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customization {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<BindingOptions>,
}

impl Customization {
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Default::default()
        }
    }

    pub fn replacement(spec: impl Into<String>) -> Self {
        Self {
            replacement: Some(spec.into()),
            ..Default::default()
        }
    }
}

/// The full customization document: original spec -> customization.
///
/// `BTreeMap` keeps application order deterministic.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortcutCustomizations {
    customizations: BTreeMap<String, Customization>,
}

impl ShortcutCustomizations {
    /// Load the document from a store. An absent key is an empty document.
    pub fn load(store: &dyn SettingsStore) -> Result<Self, PersistenceError> {
        match store.get(CUSTOMIZATIONS_KEY) {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Self::default()),
        }
    }

    /// Save the document to a store as pretty-printed JSON.
    pub fn save(&self, store: &mut dyn SettingsStore) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string_pretty(self)?;
        store.set(CUSTOMIZATIONS_KEY, &raw)
    }

    pub fn set(&mut self, spec: impl Into<String>, customization: Customization) {
        self.customizations.insert(spec.into(), customization);
    }

    pub fn remove(&mut self, spec: &str) {
        self.customizations.remove(spec);
    }

    pub fn get(&self, spec: &str) -> Option<&Customization> {
        self.customizations.get(spec)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Customization)> {
        self.customizations.iter()
    }

    pub fn len(&self) -> usize {
        self.customizations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customizations.is_empty()
    }
}

/// File-backed store for embedders without their own key-value storage.
/// Each key becomes one JSON document under the store directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default store location (~/.debug-console/).
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_default()
            .join(".debug-console")
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(Self::default_dir())
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        if !path.exists() {
            return None;
        }
        fs::read_to_string(&path).warn_on_err()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path_for(key).parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// Convenience for tests and short-lived embedders.
pub fn load_from_dir(dir: &Path) -> Result<ShortcutCustomizations, PersistenceError> {
    ShortcutCustomizations::load(&JsonFileStore::new(dir))
}
