//! Hash manifest parsing, base directory inference, and key normalization for sealcheck.
//!
//! This crate defines the manifest side of a verification run: line-oriented
//! manifest parsing (`parse_manifest_str`, `parse_manifest_file`) with explicit
//! diagnostics for skipped lines, common base directory inference
//! (`infer_base_directory`, `resolve_base_directory`), segment-aware path
//! normalization into `RelativeKey`s (`relative_key`), and the `Digest` and
//! `RelativeKey` newtypes shared with the archive side.

pub mod base_dir;
pub mod normalize;
pub mod parse;
pub mod types;

pub use base_dir::{infer_base_directory, resolve_base_directory, BaseDirectory};
pub use normalize::{relative_key, NormalizeError};
pub use parse::{
    decode_manifest_bytes, parse_manifest_file, parse_manifest_str, ManifestEntry,
    ParsedManifest, SkipReason, SkippedLine, ALGORITHM_TAG,
};
pub use types::{Digest, InvalidDigest, RelativeKey, DIGEST_HEX_LEN, KEY_SEPARATOR};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Unreadable(#[from] std::io::Error),
    #[error("failed to decode manifest: {0}")]
    Encoding(String),
    #[error(
        "cannot infer a base directory from {entries} manifest path(s); pass one explicitly"
    )]
    BaseDirectoryRequired { entries: usize },
    #[error("manifest lists '{key}' twice with different digests (lines {first_line} and {second_line})")]
    ConflictingDuplicate {
        key: String,
        first_line: usize,
        second_line: usize,
    },
}

/// Split a path on `/` and `\`, treating runs of separators as one.
///
/// Leading and trailing separators produce no segments.
pub fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\']).filter(|s| !s.is_empty())
}
