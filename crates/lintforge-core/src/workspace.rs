//! Scratch directory for one run.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::Result;

/// A private temporary directory holding the manifest, the policy file and
/// the built executable. Removed when dropped.
#[derive(Debug)]
pub struct WorkArea {
    dir: TempDir,
}

impl WorkArea {
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("lintforge-").tempdir()?;
        debug!(path = %dir.path().display(), "Created work area");
        Ok(WorkArea { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Remove the directory now and report failures, instead of on drop.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!(path = %path.display(), "Removed work area");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_area_removed_on_drop() {
        let area = WorkArea::create().unwrap();
        let path = area.path().to_path_buf();
        std::fs::write(area.join("policy.yml"), "rules: []").unwrap();
        assert!(path.is_dir());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("lintforge-"));

        drop(area);
        assert!(!path.exists());
    }

    #[test]
    fn test_work_area_close() {
        let area = WorkArea::create().unwrap();
        let path = area.path().to_path_buf();
        area.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_work_areas_are_distinct() {
        let a = WorkArea::create().unwrap();
        let b = WorkArea::create().unwrap();
        assert_ne!(a.path(), b.path());
    }
}
