use crate::module::ModularBundle;
use anyhow::Context;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use std::any::{TypeId, type_name};
use std::env;
use std::sync::Arc;

/// Key/value settings visible to modules while they declare bindings.
#[derive(Clone, Debug, Default)]
pub struct Presets {
    values: Arc<DashMap<String, String>>,
}

impl Presets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every environment variable starting with `prefix`, keyed by the
    /// remainder of its name in lower case (`APP_DB_URL` -> `db_url` for
    /// prefix `APP_`).
    pub fn from_env(prefix: &str) -> Self {
        Self::from_vars(env::vars(), prefix)
    }

    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>, prefix: &str) -> Self {
        let presets = Self::default();
        for (key, value) in vars {
            if let Some(key) = key.strip_prefix(prefix) {
                presets.set(&key.to_lowercase(), &value);
            }
        }
        presets
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// Parses the setting `key` as JSON, or as a plain string when it is not
    /// valid JSON.
    pub fn value<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        let parsed = serde_json::from_str(&raw)
            .or_else(|_| serde_json::from_value(serde_json::Value::String(raw.clone())))
            .with_context(|| format!("preset {key}={raw:?} is not a {}", type_name::<T>()))?;
        Ok(Some(parsed))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The chosen options of modular bundles.
#[derive(Clone, Debug, Default)]
pub struct Options {
    chosen: Arc<DashMap<TypeId, Vec<String>>>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn choose<M: ModularBundle>(&self, options: &[M]) -> &Self {
        let names = options.iter().map(|option| option.name().to_string());
        self.chosen
            .entry(TypeId::of::<M>())
            .or_default()
            .extend(names);
        self
    }

    /// Chooses options by name from a comma separated list, e.g. `"mysql, redis"`.
    pub fn choose_named<M: ModularBundle>(&self, names: &str) -> &Self {
        let names = names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        self.chosen
            .entry(TypeId::of::<M>())
            .or_default()
            .extend(names);
        self
    }

    /// Names chosen for `M`, in the order they were chosen.
    pub fn chosen<M: ModularBundle>(&self) -> Vec<String> {
        self.chosen
            .get(&TypeId::of::<M>())
            .map(|names| names.clone())
            .unwrap_or_default()
    }
}

/// Everything a bootstrap may consult.
#[derive(Clone, Debug, Default)]
pub struct Globals {
    pub presets: Presets,
    pub options: Options,
}

impl Globals {
    pub fn from_env(prefix: &str) -> Self {
        Self {
            presets: Presets::from_env(prefix),
            options: Options::default(),
        }
    }
}
