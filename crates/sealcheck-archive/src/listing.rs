use crate::ArchiveError;
use sealcheck_manifest::RelativeKey;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A regular file found below the effective archive root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchivedFile {
    pub key: RelativeKey,
    #[serde(skip)]
    pub path: PathBuf,
    pub size: u64,
}

/// Recursively list regular files below `root`, sorted by key.
///
/// Symlinks and special files are skipped with a warning.
pub fn list_files(root: &Path) -> Result<Vec<ArchivedFile>, ArchiveError> {
    let mut files = Vec::new();
    if root.is_dir() {
        collect_files(root, root, &mut files)?;
    }
    files.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(files)
}

fn collect_files(
    root: &Path,
    current: &Path,
    out: &mut Vec<ArchivedFile>,
) -> Result<(), ArchiveError> {
    for entry in fs::read_dir(current)? {
        let entry = entry?;
        let full = entry.path();
        let meta = full.symlink_metadata()?;

        if meta.is_dir() {
            collect_files(root, &full, out)?;
            continue;
        }
        if !meta.is_file() {
            warn!("skipping non-regular file: {}", full.display());
            continue;
        }

        let rel = full
            .strip_prefix(root)
            .map_err(|e| ArchiveError::Io(std::io::Error::other(format!("path strip: {e}"))))?;
        let Some(key) = RelativeKey::from_relative_path(rel) else {
            warn!("skipping file without a usable key: {}", full.display());
            continue;
        };
        out.push(ArchivedFile {
            key,
            path: full,
            size: meta.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_nested_files_with_keys() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("mail/2024")).unwrap();
        fs::write(dir.path().join("mail/2024/inbox.pst"), b"12345").unwrap();
        fs::write(dir.path().join("notes.txt"), b"n").unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();

        let files = list_files(dir.path()).unwrap();
        let keys: Vec<_> = files.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["mail/2024/inbox.pst", "notes.txt"]);
        assert_eq!(files[0].size, 5);
        assert_eq!(files[0].path, dir.path().join("mail/2024/inbox.pst"));
    }

    #[test]
    fn missing_root_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_files(&dir.path().join("absent")).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("real.txt"), b"r").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
            .unwrap();

        let files = list_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].key, "real.txt");
    }
}
