//! Plugin registration.

use std::sync::Arc;

use lint_plugin_api::{
    Analyzer, AnalyzerDescriptor, LinterPlugin, LoadMode, PluginError, PluginRegistry, Result,
};
use serde_json::Value;
use tracing::debug;

use crate::matcher::ParamCase;

/// Name the plugin registers under.
pub const PLUGIN_NAME: &str = "paramcase";

const ANALYZERS: [AnalyzerDescriptor; 1] = [ParamCase::DESCRIPTOR];

/// Exposes [`ParamCase`] to the engine.
///
/// The analyzer never looks at types, so the plugin always asks for
/// [`LoadMode::SyntaxOnly`] and the engine can skip semantic loading.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParamCasePlugin;

impl ParamCasePlugin {
    /// Constructor handed to the registry. Accepts no settings: an empty or
    /// object block is ignored, anything else is rejected.
    pub fn from_settings(settings: &Value) -> Result<Box<dyn LinterPlugin>> {
        match settings {
            Value::Null => {}
            Value::Object(map) => {
                if !map.is_empty() {
                    debug!(plugin = PLUGIN_NAME, "Ignoring plugin settings");
                }
            }
            other => {
                return Err(PluginError::InvalidSettings {
                    name: PLUGIN_NAME.to_string(),
                    reason: format!("expected a settings object, got {other}"),
                })
            }
        }
        Ok(Box::new(ParamCasePlugin))
    }
}

impl LinterPlugin for ParamCasePlugin {
    fn build_analyzers(&self) -> Result<Vec<Arc<dyn Analyzer>>> {
        Ok(vec![Arc::new(ParamCase)])
    }

    fn analyzers(&self) -> Vec<AnalyzerDescriptor> {
        ANALYZERS.to_vec()
    }

    fn load_mode(&self) -> LoadMode {
        LoadMode::SyntaxOnly
    }
}

/// Add the plugin to an engine's registry.
pub fn register(registry: &mut PluginRegistry) -> Result<()> {
    registry.register(PLUGIN_NAME, ParamCasePlugin::from_settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_mode_is_syntax_only() {
        assert_eq!(ParamCasePlugin.load_mode(), LoadMode::SyntaxOnly);
    }

    #[test]
    fn test_analyzers_match_built_analyzers() {
        let listed = ParamCasePlugin.analyzers();
        let built = ParamCasePlugin.build_analyzers().unwrap();
        assert_eq!(listed.len(), built.len());
        assert_eq!(listed[0], built[0].descriptor());
        assert_eq!(listed[0].name, "paramcase");
    }

    #[test]
    fn test_settings_handling() {
        assert!(ParamCasePlugin::from_settings(&Value::Null).is_ok());
        assert!(ParamCasePlugin::from_settings(&json!({"unused": true})).is_ok());
        let err = ParamCasePlugin::from_settings(&json!(3)).err().unwrap();
        assert!(matches!(err, PluginError::InvalidSettings { .. }));
    }

    #[test]
    fn test_register_under_fixed_name() {
        let mut registry = PluginRegistry::new();
        register(&mut registry).unwrap();
        assert!(registry.contains(PLUGIN_NAME));
        assert!(register(&mut registry).is_err());
    }
}
