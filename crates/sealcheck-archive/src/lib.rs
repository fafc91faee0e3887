//! Archive side of a sealcheck verification run.
//!
//! This crate provides the caller-owned `WorkArea` that scopes extracted
//! content, `extract_archive` for zip, tar, and gzip-compressed tar archives,
//! wrapping-folder detection (`detect_archive_root`), recursive file listing
//! into `RelativeKey`s (`list_files`), and the `FileDigester` seam with its
//! streaming SHA-256 implementation.

pub mod digest;
pub mod extract;
pub mod listing;
pub mod root;
pub mod work_area;

pub use digest::{sha256_hex, sha256_reader, FileDigester, Sha256Digester};
pub use extract::{extract_archive, ArchiveFormat, ExtractedArchive};
pub use listing::{list_files, ArchivedFile};
pub use root::{detect_archive_root, top_level_entries, wrapping_folder, ArchiveRoot, TopLevelEntry};
pub use work_area::WorkArea;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to open archive {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("archive {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
    #[error("unsupported archive format: '{0}' (expected .zip, .tar, .tar.gz or .tgz)")]
    UnsupportedFormat(String),
    #[error("archive entry '{0}' would extract outside the work area")]
    UnsafeEntry(String),
    #[error("archive I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    pub(crate) fn corrupt(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        Self::Corrupt {
            path: path.to_owned(),
            reason: reason.to_string(),
        }
    }
}
