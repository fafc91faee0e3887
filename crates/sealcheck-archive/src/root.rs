use crate::ArchiveError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One entry directly below the archive's true root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopLevelEntry {
    pub name: String,
    pub is_dir: bool,
}

impl TopLevelEntry {
    /// Build from an archive listing name, where a trailing `/` marks a
    /// directory (e.g. `Evidence/`).
    pub fn from_listing_name(name: &str) -> Self {
        let trimmed = name.trim_end_matches(['/', '\\']);
        Self {
            name: trimmed.to_owned(),
            is_dir: trimmed.len() != name.len(),
        }
    }
}

/// The directory that file keys are computed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveRoot {
    #[serde(skip)]
    pub path: PathBuf,
    /// Name of the single wrapping folder when one was detected.
    pub wrapper: Option<String>,
}

/// Name of the wrapping folder, if the top level holds exactly one entry and
/// that entry is a directory.
pub fn wrapping_folder(entries: &[TopLevelEntry]) -> Option<&str> {
    match entries {
        [only] if only.is_dir => Some(&only.name),
        _ => None,
    }
}

/// List the entries directly below `dir`, sorted by name.
pub fn top_level_entries(dir: &Path) -> Result<Vec<TopLevelEntry>, ArchiveError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        entries.push(TopLevelEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: entry.file_type()?.is_dir(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Decide the effective root of extracted content: the single wrapping
/// folder when present, otherwise `extracted_root` itself.
pub fn detect_archive_root(extracted_root: &Path) -> Result<ArchiveRoot, ArchiveError> {
    let entries = top_level_entries(extracted_root)?;
    let root = match wrapping_folder(&entries) {
        Some(name) => {
            debug!("archive wraps its content in '{name}/'; using it as root");
            ArchiveRoot {
                path: extracted_root.join(name),
                wrapper: Some(name.to_owned()),
            }
        }
        None => {
            debug!(
                "archive has {} top-level entries; using true root",
                entries.len()
            );
            ArchiveRoot {
                path: extracted_root.to_owned(),
                wrapper: None,
            }
        }
    };
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(names: &[&str]) -> Vec<TopLevelEntry> {
        names
            .iter()
            .map(|n| TopLevelEntry::from_listing_name(n))
            .collect()
    }

    #[test]
    fn single_directory_is_wrapper() {
        assert_eq!(wrapping_folder(&listing(&["Evidence/"])), Some("Evidence"));
    }

    #[test]
    fn loose_files_keep_true_root() {
        assert_eq!(wrapping_folder(&listing(&["a.txt", "b.txt"])), None);
    }

    #[test]
    fn single_file_keeps_true_root() {
        assert_eq!(wrapping_folder(&listing(&["only.txt"])), None);
    }

    #[test]
    fn multiple_directories_keep_true_root() {
        assert_eq!(wrapping_folder(&listing(&["A/", "B/"])), None);
    }

    #[test]
    fn empty_listing_keeps_true_root() {
        assert_eq!(wrapping_folder(&[]), None);
    }

    #[test]
    fn detects_wrapper_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Evidence/sub")).unwrap();
        fs::write(dir.path().join("Evidence/sub/a.txt"), b"a").unwrap();

        let root = detect_archive_root(dir.path()).unwrap();
        assert_eq!(root.wrapper.as_deref(), Some("Evidence"));
        assert_eq!(root.path, dir.path().join("Evidence"));
    }

    #[test]
    fn directory_next_to_file_is_not_a_wrapper() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Evidence")).unwrap();
        fs::write(dir.path().join("readme.txt"), b"r").unwrap();

        let root = detect_archive_root(dir.path()).unwrap();
        assert_eq!(root.wrapper, None);
        assert_eq!(root.path, dir.path());
    }

    #[test]
    fn top_level_entries_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), b"").unwrap();
        fs::write(dir.path().join("a.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("c")).unwrap();

        let entries = top_level_entries(dir.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.txt", "c"]);
        assert!(entries[2].is_dir);
    }

    #[test]
    fn serializes_wrapper_only() {
        let root = ArchiveRoot {
            path: PathBuf::from("/tmp/x/Evidence"),
            wrapper: Some("Evidence".to_owned()),
        };
        let json = serde_json::to_string(&root).unwrap();
        assert_eq!(json, r#"{"wrapper":"Evidence"}"#);
    }
}
