use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Scoped scratch directory that holds extracted archive content.
///
/// Owned by the caller and injected into extraction. The directory and
/// everything in it is removed when the value is dropped or `close`d, on
/// every exit path.
#[derive(Debug)]
pub struct WorkArea {
    dir: TempDir,
}

impl WorkArea {
    /// Create a work area in the system temporary directory.
    pub fn new() -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("sealcheck-").tempdir()?;
        debug!("created work area {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Create a work area below `parent`, e.g. a volume with room for a large
    /// archive.
    pub fn new_in(parent: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("sealcheck-")
            .tempdir_in(parent)?;
        debug!("created work area {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory that extracted archive content is written to.
    pub fn content_dir(&self) -> PathBuf {
        self.dir.path().join("content")
    }

    /// Remove the work area now and report failures instead of ignoring them.
    pub fn close(self) -> std::io::Result<()> {
        let path = self.dir.path().to_owned();
        self.dir.close().inspect_err(|e| {
            warn!("failed to remove work area {}: {e}", path.display());
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_area_removed_on_drop() {
        let path = {
            let area = WorkArea::new().unwrap();
            std::fs::create_dir_all(area.content_dir()).unwrap();
            std::fs::write(area.content_dir().join("f.txt"), b"x").unwrap();
            area.path().to_owned()
        };
        assert!(!path.exists());
    }

    #[test]
    fn work_area_close_removes_directory() {
        let parent = tempfile::tempdir().unwrap();
        let area = WorkArea::new_in(parent.path()).unwrap();
        let path = area.path().to_owned();
        assert!(path.starts_with(parent.path()));
        area.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn work_area_new_in_missing_parent_fails() {
        let parent = tempfile::tempdir().unwrap();
        assert!(WorkArea::new_in(parent.path().join("absent")).is_err());
    }
}
