use crate::base_dir::BaseDirectory;
use crate::split_segments;
use crate::types::RelativeKey;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("path '{path}' is not under base directory '{base}'")]
    PathNotUnderBaseDirectory { path: String, base: String },
}

/// Strip `base` from `absolute_path` and return the canonical key.
///
/// The prefix check is segment-wise and exact: every base segment must equal
/// the corresponding path segment, and at least one segment must remain.
pub fn relative_key(absolute_path: &str, base: &BaseDirectory) -> Result<RelativeKey, NormalizeError> {
    let not_under = || NormalizeError::PathNotUnderBaseDirectory {
        path: absolute_path.to_owned(),
        base: base.to_string(),
    };

    let mut segments = split_segments(absolute_path);
    for expected in base.segments() {
        match segments.next() {
            Some(actual) if actual == expected.as_str() => {}
            _ => return Err(not_under()),
        }
    }

    RelativeKey::from_segments(segments).ok_or_else(not_under)
}
