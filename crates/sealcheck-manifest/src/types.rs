//! Newtype wrappers for digests and relative keys.
//!
//! Both serialize as plain strings. Constructors validate or canonicalize their
//! input, so a value of either type is always in canonical form.

use serde::Serialize;
use std::fmt;
use std::ops::Deref;
use thiserror::Error;

/// Number of hex characters in a SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Separator used inside every [`RelativeKey`].
pub const KEY_SEPARATOR: char = '/';

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_newtype!(
    /// Lowercase 64-character hex SHA-256 digest.
    ///
    /// Parsing is case-insensitive; equality is therefore case-insensitive with
    /// respect to the original text.
    Digest
);

string_newtype!(
    /// Canonical `/`-separated path of a file below its root, with no leading
    /// separator and no empty segments. The join key between manifest and archive.
    RelativeKey
);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid digest '{0}': expected {DIGEST_HEX_LEN} hex characters")]
pub struct InvalidDigest(pub String);

impl Digest {
    pub fn parse(s: &str) -> Result<Self, InvalidDigest> {
        let trimmed = s.trim();
        if trimmed.len() != DIGEST_HEX_LEN || !trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidDigest(s.to_owned()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }
}

impl std::str::FromStr for Digest {
    type Err = InvalidDigest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl RelativeKey {
    /// Build a key from path segments. Empty segments are dropped; returns
    /// `None` when nothing remains.
    pub fn from_segments<'a, I>(segments: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let joined = segments
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        if joined.is_empty() {
            None
        } else {
            Some(Self(joined))
        }
    }

    /// Build a key from a path that is already relative to its root, e.g. a
    /// file path below the effective archive root after `strip_prefix`.
    ///
    /// Only normal components contribute; `.` and root components are ignored.
    /// Returns `None` for a path with a `..` component or with no normal
    /// components at all.
    pub fn from_relative_path(path: &std::path::Path) -> Option<Self> {
        use std::path::Component;

        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::ParentDir => return None,
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        Self::from_segments(parts.iter().map(String::as_str))
    }

    /// Parse a key written in either separator style, e.g. from test fixtures
    /// or user input. Leading separators and runs of separators collapse.
    pub fn parse(s: &str) -> Option<Self> {
        Self::from_segments(crate::split_segments(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn digest_is_lowercased() {
        let d = Digest::parse(&"AB".repeat(32)).unwrap();
        assert_eq!(d.as_str(), "ab".repeat(32));
    }

    #[test]
    fn digest_parse_is_case_insensitive() {
        let upper = Digest::parse(&format!("{}ABCD", "C0FFEE".repeat(10))).unwrap();
        let lower = Digest::parse(&format!("{}abcd", "c0ffee".repeat(10))).unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn digest_rejects_wrong_length() {
        assert!(Digest::parse(&"a".repeat(63)).is_err());
        assert!(Digest::parse(&"a".repeat(65)).is_err());
        assert!(Digest::parse("").is_err());
    }

    #[test]
    fn digest_rejects_non_hex() {
        let bad = format!("{}zz", "a".repeat(62));
        let err = Digest::parse(&bad).unwrap_err();
        assert!(err.to_string().contains("64 hex characters"));
    }

    #[test]
    fn digest_serializes_as_plain_string() {
        let d: Digest = "f".repeat(64).parse().unwrap();
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"{}\"", "f".repeat(64)));
    }

    #[test]
    fn key_from_segments_skips_empty() {
        let key = RelativeKey::from_segments(["", "a", "", "b.txt"]).unwrap();
        assert_eq!(key, "a/b.txt");
        assert!(RelativeKey::from_segments(["", ""]).is_none());
    }

    #[test]
    fn key_from_relative_path() {
        let key = RelativeKey::from_relative_path(Path::new("sub/dir/./file.bin")).unwrap();
        assert_eq!(key.as_str(), "sub/dir/file.bin");
    }

    #[test]
    fn key_from_relative_path_rejects_parent_components() {
        assert!(RelativeKey::from_relative_path(Path::new("../escape.txt")).is_none());
        assert!(RelativeKey::from_relative_path(Path::new("")).is_none());
    }

    #[test]
    fn key_parse_unifies_separators() {
        let key = RelativeKey::parse(r"\\dir\\sub/file name.txt").unwrap();
        assert_eq!(key, "dir/sub/file name.txt");
        assert!(!key.starts_with(KEY_SEPARATOR));
    }
}
