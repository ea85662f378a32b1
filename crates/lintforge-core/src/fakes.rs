//! In-memory registry for tests and offline runs.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ForgeError;
use crate::registry::RegistryClient;
use crate::version::{ResolvedVersion, LATEST};
use crate::Result;

#[derive(Debug, Default)]
struct ModuleState {
    latest: Option<String>,
    versions: HashMap<String, ResolvedVersion>,
    info_overrides: HashMap<String, ResolvedVersion>,
    archives: HashMap<String, Vec<u8>>,
}

/// Registry backed by a `HashMap<module, ModuleState>`. Records every
/// request it serves.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    modules: Mutex<HashMap<String, ModuleState>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a version and make it the latest.
    pub fn publish(&self, name: &str, version: &str, time: &str, archive: Vec<u8>) {
        let mut modules = self.modules.lock().unwrap();
        let module = modules.entry(name.to_string()).or_default();
        module.latest = Some(version.to_string());
        module
            .versions
            .insert(version.to_string(), ResolvedVersion::new(version, time));
        module.archives.insert(version.to_string(), archive);
    }

    /// Answer `.info` requests for `requested` with `response`, whatever it says.
    pub fn override_info(&self, name: &str, requested: &str, response: ResolvedVersion) {
        let mut modules = self.modules.lock().unwrap();
        modules
            .entry(name.to_string())
            .or_default()
            .info_overrides
            .insert(requested.to_string(), response);
    }

    /// Requests served so far, as `"{kind} {module}@{version}"`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, kind: &str, name: &str, version: &str) {
        self.requests
            .lock()
            .unwrap()
            .push(format!("{kind} {name}@{version}"));
    }

    fn not_found(name: &str, version: &str) -> ForgeError {
        ForgeError::NotFound {
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

#[async_trait]
impl RegistryClient for MemoryRegistry {
    async fn latest(&self, name: &str) -> Result<ResolvedVersion> {
        self.record("latest", name, LATEST);
        let modules = self.modules.lock().unwrap();
        modules
            .get(name)
            .and_then(|m| m.latest.as_ref().and_then(|v| m.versions.get(v)))
            .cloned()
            .ok_or_else(|| Self::not_found(name, LATEST))
    }

    async fn info(&self, name: &str, version: &str) -> Result<ResolvedVersion> {
        self.record("info", name, version);
        let modules = self.modules.lock().unwrap();
        let module = modules
            .get(name)
            .ok_or_else(|| Self::not_found(name, version))?;
        module
            .info_overrides
            .get(version)
            .or_else(|| module.versions.get(version))
            .cloned()
            .ok_or_else(|| Self::not_found(name, version))
    }

    async fn archive(&self, name: &str, version: &str) -> Result<Vec<u8>> {
        self.record("archive", name, version);
        let modules = self.modules.lock().unwrap();
        modules
            .get(name)
            .and_then(|m| m.archives.get(version))
            .cloned()
            .ok_or_else(|| Self::not_found(name, version))
    }
}

/// Build a zip archive in memory from `(entry path, contents)` pairs.
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (path, contents) in entries {
        writer
            .start_file(*path, options)
            .map_err(|e| ForgeError::Io(std::io::Error::other(e)))?;
        writer.write_all(contents)?;
    }
    let cursor = writer
        .finish()
        .map_err(|e| ForgeError::Io(std::io::Error::other(e)))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_registry_latest_follows_publish() {
        let registry = MemoryRegistry::new();
        registry.publish("m", "v1.0.0", "t1", Vec::new());
        assert_eq!(registry.latest("m").await.unwrap().version, "v1.0.0");

        registry.publish("m", "v2.0.0", "t2", Vec::new());
        assert_eq!(registry.latest("m").await.unwrap().version, "v2.0.0");
        assert_eq!(registry.info("m", "v1.0.0").await.unwrap().time, "t1");
    }

    #[tokio::test]
    async fn test_memory_registry_missing() {
        let registry = MemoryRegistry::new();
        assert!(matches!(
            registry.latest("m").await,
            Err(ForgeError::NotFound { .. })
        ));
        assert!(matches!(
            registry.archive("m", "v1.0.0").await,
            Err(ForgeError::NotFound { .. })
        ));
        assert_eq!(registry.requests(), vec!["latest m@latest", "archive m@v1.0.0"]);
    }

    #[test]
    fn test_zip_archive_readable() {
        let bytes = zip_archive(&[("m@v1.0.0/a.txt", b"hello")]).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);
    }
}
