//! paramcase: parameter names must start with a lowercase letter
//!
//! Flags every identifier bound by a function, method, closure or
//! function-pointer parameter whose first character is not a Unicode
//! lowercase letter. The `_` placeholder is exempt.
//!
//! The crate is loaded into a custom lint executable through
//! [`register`], which adds [`ParamCasePlugin`] to the engine's
//! [`lint_plugin_api::PluginRegistry`] under [`PLUGIN_NAME`].

mod matcher;
mod plugin;

pub use matcher::{check_file, starts_lowercase, ParamCase};
pub use plugin::{register, ParamCasePlugin, PLUGIN_NAME};
