//! Build manifest rendering.
//!
//! The manifest tells the engine's build step which engine version to build
//! and which plugin module to compile in. The plugin is referenced either by
//! version or by local path, never both.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::artifact::write_atomic;
use crate::config::DEFAULT_EXECUTABLE_NAME;
use crate::Result;

/// Where the build step gets the plugin from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginSource {
    /// A registry version of the plugin module.
    Version(String),
    /// A checkout on the local filesystem.
    LocalPath(PathBuf),
}

impl PluginSource {
    /// Pick the variant from the raw flag pair.
    pub fn from_parts(version_or_path: &str, is_local_path: bool) -> Self {
        if is_local_path {
            PluginSource::LocalPath(PathBuf::from(version_or_path))
        } else {
            PluginSource::Version(version_or_path.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildManifest {
    pub engine_version: String,
    pub module_path: String,
    pub plugin: PluginSource,
    /// Executable the build step should produce.
    pub name: String,
    /// Directory, relative to the manifest, to put it in.
    pub destination: String,
}

impl BuildManifest {
    pub fn new(engine_version: &str, module_path: &str, plugin: PluginSource) -> Self {
        BuildManifest {
            engine_version: engine_version.to_string(),
            module_path: module_path.to_string(),
            plugin,
            name: DEFAULT_EXECUTABLE_NAME.to_string(),
            destination: ".".to_string(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Render as TOML text. Same input, same output.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("# Generated by lintforge. Do not edit.\n");
        push_field(&mut out, "version", &self.engine_version);
        push_field(&mut out, "name", &self.name);
        push_field(&mut out, "destination", &self.destination);
        out.push('\n');
        out.push_str("[[plugins]]\n");
        push_field(&mut out, "module", &self.module_path);
        push_field(&mut out, "import", &self.module_path);
        match &self.plugin {
            PluginSource::Version(version) => push_field(&mut out, "version", version),
            PluginSource::LocalPath(path) => {
                push_field(&mut out, "path", &path.display().to_string())
            }
        }
        out
    }

    /// Render and write to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        write_manifest(path, &self.render())?;
        debug!(path = %path.display(), plugin = ?self.plugin, "Wrote build manifest");
        Ok(())
    }
}

fn push_field(out: &mut String, key: &str, value: &str) {
    let quoted = toml::Value::String(value.to_string()).to_string();
    out.push_str(key);
    out.push_str(" = ");
    out.push_str(&quoted);
    out.push('\n');
}

/// Write already-rendered manifest text to `path`.
pub fn write_manifest(path: &Path, text: &str) -> Result<()> {
    write_atomic(path, text.as_bytes())
}

/// Render a manifest from the four raw inputs.
pub fn render(
    engine_version: &str,
    module_path: &str,
    plugin_version_or_path: &str,
    is_local_path: bool,
) -> String {
    let plugin = PluginSource::from_parts(plugin_version_or_path, is_local_path);
    BuildManifest::new(engine_version, module_path, plugin).render()
}
