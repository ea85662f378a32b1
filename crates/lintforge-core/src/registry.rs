//! Module registry client and version resolution.
//!
//! The registry speaks the module proxy protocol:
//!
//! - `GET {proxy}{module}/@latest` → `{"Version": .., "Time": ..}`
//! - `GET {proxy}{module}/@v/{version}.info` → same shape
//! - `GET {proxy}{module}/@v/{version}.zip` → archive bytes
//!
//! Module paths and versions are case-encoded in URLs (`A` → `!a`). Nothing here retries
//! or caches; every call is one request.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::error::ForgeError;
use crate::version::{DependencyRef, ResolvedVersion, VersionSpec, LATEST};
use crate::Result;

/// Read access to a module registry.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Newest version of `name`.
    async fn latest(&self, name: &str) -> Result<ResolvedVersion>;

    /// Metadata for one exact version.
    async fn info(&self, name: &str, version: &str) -> Result<ResolvedVersion>;

    /// The full archive of one exact version.
    async fn archive(&self, name: &str, version: &str) -> Result<Vec<u8>>;
}

/// Case-encode a module path: each uppercase letter becomes `!` plus its
/// lowercase form.
pub fn escape_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// HTTP implementation of [`RegistryClient`].
pub struct HttpRegistry {
    config: RegistryConfig,
    http_client: reqwest::Client,
}

impl HttpRegistry {
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(HttpRegistry {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(RegistryConfig::from_env())
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn url(&self, name: &str, suffix: &str) -> String {
        format!("{}{}/{}", self.config.proxy_url, escape_path(name), suffix)
    }

    async fn get(&self, url: &str, name: &str, version: &str) -> Result<Vec<u8>> {
        debug!(url, "GET");
        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(ForgeError::NotFound {
                name: name.to_string(),
                version: version.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ForgeError::Network {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn get_info(&self, url: &str, name: &str, version: &str) -> Result<ResolvedVersion> {
        let body = self.get(url, name, version).await?;
        parse_info(url, &body)
    }
}

/// Decode a `.info` / `@latest` body.
fn parse_info(url: &str, body: &[u8]) -> Result<ResolvedVersion> {
    let resolved: ResolvedVersion =
        serde_json::from_slice(body).map_err(|e| ForgeError::MalformedResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    if resolved.version.is_empty() {
        return Err(ForgeError::MalformedResponse {
            url: url.to_string(),
            reason: "empty Version field".to_string(),
        });
    }
    Ok(resolved)
}

#[async_trait]
impl RegistryClient for HttpRegistry {
    async fn latest(&self, name: &str) -> Result<ResolvedVersion> {
        let url = self.url(name, "@latest");
        self.get_info(&url, name, LATEST).await
    }

    async fn info(&self, name: &str, version: &str) -> Result<ResolvedVersion> {
        let url = self.url(name, &format!("@v/{}.info", escape_path(version)));
        self.get_info(&url, name, version).await
    }

    async fn archive(&self, name: &str, version: &str) -> Result<Vec<u8>> {
        let url = self.url(name, &format!("@v/{}.zip", escape_path(version)));
        self.get(&url, name, version).await
    }
}

/// Turns a [`DependencyRef`] into one concrete version.
pub struct VersionResolver {
    client: Arc<dyn RegistryClient>,
}

impl VersionResolver {
    pub fn new(client: Arc<dyn RegistryClient>) -> Self {
        VersionResolver { client }
    }

    /// Resolve against the registry. `latest` is asked for on every call;
    /// an exact version must come back unchanged.
    pub async fn resolve(&self, dependency: &DependencyRef) -> Result<ResolvedVersion> {
        let resolved = match &dependency.version {
            VersionSpec::Latest => self.client.latest(&dependency.name).await?,
            VersionSpec::Exact(requested) => {
                let resolved = self.client.info(&dependency.name, requested).await?;
                if &resolved.version != requested {
                    return Err(ForgeError::VersionMismatch {
                        requested: requested.clone(),
                        returned: resolved.version,
                    });
                }
                resolved
            }
        };

        info!(
            dependency = %dependency.name,
            requested = %dependency.version,
            version = %resolved.version,
            time = %resolved.time,
            "Resolved version"
        );
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::MemoryRegistry;

    #[test]
    fn test_escape_path() {
        assert_eq!(escape_path("example.org/lint"), "example.org/lint");
        assert_eq!(
            escape_path("github.com/Azure/SDK"),
            "github.com/!azure/!s!d!k"
        );
    }

    #[test]
    fn test_urls() {
        let registry =
            HttpRegistry::new(RegistryConfig::default().with_proxy("https://proxy.example")).unwrap();
        assert_eq!(
            registry.url("example.org/Policy", "@latest"),
            "https://proxy.example/example.org/!policy/@latest"
        );
        assert_eq!(
            registry.url("example.org/x", "@v/v1.0.0.zip"),
            "https://proxy.example/example.org/x/@v/v1.0.0.zip"
        );
    }

    #[test]
    fn test_versions_escaped_like_paths() {
        assert_eq!(escape_path("v1.0.0-RC1"), "v1.0.0-!r!c1");
        assert_eq!(escape_path("v2.0.0+Build.7"), "v2.0.0+!build.7");
        assert_eq!(escape_path("v1.0.0"), "v1.0.0");
    }

    #[test]
    fn test_parse_info_rejects_garbage() {
        let err = parse_info("u", b"<html>").unwrap_err();
        assert!(matches!(err, ForgeError::MalformedResponse { .. }));

        let err = parse_info("u", br#"{"Version":""}"#).unwrap_err();
        assert!(matches!(err, ForgeError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_resolve_latest_is_not_cached() {
        let registry = Arc::new(MemoryRegistry::new());
        registry.publish("d", "v1.0.0", "2024-01-01T00:00:00Z", Vec::new());
        let resolver = VersionResolver::new(registry.clone());
        let dep = DependencyRef::new("d", "latest").unwrap();

        let first = resolver.resolve(&dep).await.unwrap();
        registry.publish("d", "v1.1.0", "2024-02-01T00:00:00Z", Vec::new());
        let second = resolver.resolve(&dep).await.unwrap();

        assert_eq!(first.version, "v1.0.0");
        assert_eq!(second.version, "v1.1.0");
        assert_eq!(registry.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_exact() {
        let registry = Arc::new(MemoryRegistry::new());
        registry.publish("d", "v1.2.3", "2024-01-01T00:00:00Z", Vec::new());
        let resolver = VersionResolver::new(registry);

        let dep = DependencyRef::new("d", "v1.2.3").unwrap();
        let resolved = resolver.resolve(&dep).await.unwrap();
        assert_eq!(resolved.version, "v1.2.3");
    }

    #[tokio::test]
    async fn test_resolve_exact_mismatch_is_malformed() {
        let registry = Arc::new(MemoryRegistry::new());
        registry.override_info("d", "v1.2.3", ResolvedVersion::new("v1.2.4", ""));
        let resolver = VersionResolver::new(registry);

        let dep = DependencyRef::new("d", "v1.2.3").unwrap();
        let err = resolver.resolve(&dep).await.unwrap_err();
        assert!(err.is_malformed_response());
    }

    #[tokio::test]
    async fn test_resolve_unknown_version() {
        let registry = Arc::new(MemoryRegistry::new());
        let resolver = VersionResolver::new(registry);

        let dep = DependencyRef::new("d", "v9.9.9").unwrap();
        let err = resolver.resolve(&dep).await.unwrap_err();
        assert!(matches!(err, ForgeError::NotFound { .. }));
    }
}
