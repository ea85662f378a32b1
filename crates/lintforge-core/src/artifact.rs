//! Archive fetch and single-file extraction.
//!
//! A version's archive is fetched whole, held in memory and read through a
//! random-access zip reader. Entries are laid out as
//! `{module}@{version}/{path}`.

use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::ForgeError;
use crate::registry::RegistryClient;
use crate::Result;

/// Path of `relative` inside the archive of `name@version`.
pub fn entry_path(name: &str, version: &str, relative: &str) -> String {
    format!("{}@{}/{}", name, version, relative.trim_start_matches('/'))
}

/// A parsed, immutable module archive.
pub struct Archive {
    name: String,
    version: String,
    digest: String,
    zip: ZipArchive<Cursor<Vec<u8>>>,
}

impl Archive {
    /// Parse fetched bytes. Fails with `ArchiveCorrupt` if they are not a zip.
    pub fn parse(name: &str, version: &str, bytes: Vec<u8>) -> Result<Self> {
        let digest = hex::encode(Sha256::digest(&bytes));
        let zip = ZipArchive::new(Cursor::new(bytes)).map_err(|e| ForgeError::ArchiveCorrupt {
            name: name.to_string(),
            version: version.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Archive {
            name: name.to_string(),
            version: version.to_string(),
            digest,
            zip,
        })
    }

    /// SHA-256 of the raw archive bytes.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn len(&self) -> usize {
        self.zip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zip.len() == 0
    }

    /// Read the entry for `relative`.
    pub fn read(&mut self, relative: &str) -> Result<Vec<u8>> {
        let entry = entry_path(&self.name, &self.version, relative);
        let corrupt = |reason: String| ForgeError::ArchiveCorrupt {
            name: self.name.clone(),
            version: self.version.clone(),
            reason,
        };

        let mut file = match self.zip.by_name(&entry) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Err(ForgeError::FileNotFound { entry }),
            Err(e) => return Err(corrupt(e.to_string())),
        };
        let mut contents = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut contents)
            .map_err(|e| corrupt(format!("{entry}: {e}")))?;
        Ok(contents)
    }
}

/// Write `bytes` to `destination` all at once or not at all.
///
/// The data goes to a temporary file beside the destination, is synced, and
/// is then renamed into place. On any failure the temporary file is removed
/// and an existing destination is left as it was.
pub fn write_atomic(destination: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(destination).map_err(|e| ForgeError::Io(e.error))?;
    Ok(())
}

/// Fetches archives and pulls single files out of them.
pub struct ArtifactFetcher {
    client: Arc<dyn RegistryClient>,
}

impl ArtifactFetcher {
    pub fn new(client: Arc<dyn RegistryClient>) -> Self {
        ArtifactFetcher { client }
    }

    /// Fetch and parse the archive of `name@version`.
    pub async fn fetch_archive(&self, name: &str, version: &str) -> Result<Archive> {
        let bytes = self.client.archive(name, version).await?;
        let size = bytes.len();
        let archive = Archive::parse(name, version, bytes)?;
        debug!(
            dependency = name,
            version,
            size,
            entries = archive.len(),
            digest = archive.digest(),
            "Fetched archive"
        );
        Ok(archive)
    }

    /// Contents of `relative` inside the archive of `name@version`.
    pub async fn fetch_file(&self, name: &str, version: &str, relative: &str) -> Result<Vec<u8>> {
        let mut archive = self.fetch_archive(name, version).await?;
        archive.read(relative)
    }

    /// Fetch `relative` and write it verbatim to `destination`, replacing
    /// whatever is there. Returns the number of bytes written.
    pub async fn download_file(
        &self,
        name: &str,
        version: &str,
        relative: &str,
        destination: &Path,
    ) -> Result<usize> {
        let contents = self.fetch_file(name, version, relative).await?;
        write_atomic(destination, &contents)?;
        info!(
            entry = %entry_path(name, version, relative),
            destination = %destination.display(),
            bytes = contents.len(),
            "Extracted file"
        );
        Ok(contents.len())
    }
}
