//! Error types for the plugin contract

use thiserror::Error;

use crate::analyzer::LoadMode;

/// Errors raised while registering, constructing or driving plugins
#[derive(Error, Debug)]
pub enum PluginError {
    /// A plugin with this name is already registered
    #[error("plugin already registered: {name}")]
    DuplicatePlugin { name: String },

    /// No plugin is registered under this name
    #[error("unknown plugin: {name}")]
    UnknownPlugin { name: String },

    /// The plugin rejected its settings
    #[error("invalid settings for plugin {name}: {reason}")]
    InvalidSettings { name: String, reason: String },

    /// The driver cannot provide what the plugin asks for
    #[error("plugin {name} requires load mode {mode}, the syntax driver only provides syntax")]
    UnsupportedLoadMode { name: String, mode: LoadMode },

    /// IO error while reading sources
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
