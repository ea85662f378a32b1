//! Plugin registration table.
//!
//! The engine keeps one table per process. Plugins add a constructor under a
//! fixed name; the engine builds them with the settings from its
//! configuration.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::analyzer::LinterPlugin;
use crate::error::PluginError;
use crate::Result;

/// Builds a plugin from its settings block.
pub type PluginConstructor = fn(&Value) -> Result<Box<dyn LinterPlugin>>;

/// Named plugin constructors, iterated in name order.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, PluginConstructor>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, constructor: PluginConstructor) -> Result<()> {
        if self.plugins.contains_key(name) {
            return Err(PluginError::DuplicatePlugin {
                name: name.to_string(),
            });
        }
        debug!(plugin = name, "Registered plugin");
        self.plugins.insert(name.to_string(), constructor);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    /// Construct the plugin registered under `name`.
    pub fn build(&self, name: &str, settings: &Value) -> Result<Box<dyn LinterPlugin>> {
        let constructor = self
            .plugins
            .get(name)
            .ok_or_else(|| PluginError::UnknownPlugin {
                name: name.to_string(),
            })?;
        constructor(settings)
    }

    /// Construct every registered plugin with empty settings.
    pub fn build_all(&self) -> Result<Vec<Box<dyn LinterPlugin>>> {
        self.plugins
            .values()
            .map(|constructor| constructor(&Value::Null))
            .collect()
    }
}
