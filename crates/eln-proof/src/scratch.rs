//! Per-attempt scratch directory

use crate::error::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory owned by one workflow run
///
/// Holds the request, response and document files that external tools read.
/// The directory and everything in it is removed when the value is dropped,
/// on success and on every error path.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new_in(root: impl AsRef<Path>) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("eln-proof-")
            .tempdir_in(root)?;
        tracing::trace!(path = %dir.path().display(), "created scratch directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file into the directory and return its path
    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let written = {
            let scratch = ScratchDir::new_in(root.path()).unwrap();
            let path = scratch.write("request.tsq", b"\x30\x00").unwrap();
            assert!(path.exists());
            path
        };
        assert!(!written.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
