//! Runtime configuration.
//!
//! Defaults come from environment variables so CI can point lintforge at a
//! private registry or a different engine without extra flags.

use serde::{Deserialize, Serialize};

/// Default module proxy.
pub const DEFAULT_PROXY_URL: &str = "https://proxy.golang.org/";

/// Default engine binary that performs the `custom` build step.
pub const DEFAULT_ENGINE: &str = "lint-engine";

/// File name of the executable the build step produces.
pub const DEFAULT_EXECUTABLE_NAME: &str = "custom-lint";

/// File name of the rendered build manifest.
pub const DEFAULT_MANIFEST_FILE: &str = ".custom-lint.toml";

/// Registry access settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Proxy base URL; always ends with `/`
    pub proxy_url: String,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        let proxy = std::env::var("LINTFORGE_PROXY").unwrap_or_else(|_| DEFAULT_PROXY_URL.to_string());
        RegistryConfig {
            proxy_url: normalize_proxy(&proxy),
            user_agent: format!("lintforge/{}", crate::VERSION),
        }
    }
}

impl RegistryConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Use a specific proxy
    pub fn with_proxy(mut self, proxy_url: &str) -> Self {
        self.proxy_url = normalize_proxy(proxy_url);
        self
    }
}

fn normalize_proxy(url: &str) -> String {
    let url = url.trim();
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Build step settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Engine program and leading arguments; `custom --manifest <path>` is appended
    pub engine_command: Vec<String>,
    /// Name of the executable the build step leaves in the work area
    pub executable_name: String,
    /// Name of the manifest file inside the work area
    pub manifest_file: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        let engine = std::env::var("LINTFORGE_ENGINE").unwrap_or_else(|_| DEFAULT_ENGINE.to_string());
        BuildConfig {
            engine_command: split_command(&engine),
            executable_name: DEFAULT_EXECUTABLE_NAME.to_string(),
            manifest_file: DEFAULT_MANIFEST_FILE.to_string(),
        }
    }
}

impl BuildConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Use a specific engine command line, split on whitespace
    pub fn with_engine(mut self, engine: &str) -> Self {
        self.engine_command = split_command(engine);
        self
    }

    /// Use an engine command given as separate arguments
    pub fn with_engine_command(mut self, command: Vec<String>) -> Self {
        self.engine_command = command;
        self
    }

    pub fn with_executable_name(mut self, name: &str) -> Self {
        self.executable_name = name.to_string();
        self
    }
}

fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_config_default() {
        let config = RegistryConfig::default();
        assert!(config.proxy_url.ends_with('/'));
        assert!(config.user_agent.starts_with("lintforge/"));
    }

    #[test]
    fn test_registry_config_with_proxy() {
        let config = RegistryConfig::default().with_proxy("https://proxy.example.com");
        assert_eq!(config.proxy_url, "https://proxy.example.com/");

        let config = RegistryConfig::default().with_proxy("https://proxy.example.com/mods/");
        assert_eq!(config.proxy_url, "https://proxy.example.com/mods/");
    }

    #[test]
    fn test_build_config_default() {
        let config = BuildConfig::default();
        assert!(!config.engine_command.is_empty());
        assert_eq!(config.executable_name, DEFAULT_EXECUTABLE_NAME);
        assert_eq!(config.manifest_file, DEFAULT_MANIFEST_FILE);
    }

    #[test]
    fn test_build_config_with_engine() {
        let config = BuildConfig::default().with_engine("cargo run -p engine --");
        assert_eq!(config.engine_command, vec!["cargo", "run", "-p", "engine", "--"]);
    }
}
