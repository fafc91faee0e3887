use sealcheck_manifest::{
    relative_key, BaseDirectory, Digest, ManifestEntry, ManifestError, RelativeKey,
};
use serde::Serialize;
use std::collections::btree_map::{self, BTreeMap, Entry};
use tracing::{debug, warn};

/// Expected digest per relative key, built once from the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedMap {
    entries: BTreeMap<RelativeKey, Digest>,
}

impl ExpectedMap {
    pub fn get(&self, key: &RelativeKey) -> Option<&Digest> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &RelativeKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, RelativeKey, Digest> {
        self.entries.iter()
    }
}

impl FromIterator<(RelativeKey, Digest)> for ExpectedMap {
    fn from_iter<T: IntoIterator<Item = (RelativeKey, Digest)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Manifest entry that could not be placed under the base directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedEntry {
    pub line: usize,
    pub absolute_path: String,
    pub reason: String,
}

/// Manifest entry repeating an earlier key with the same digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateEntry {
    pub key: RelativeKey,
    pub first_line: usize,
    pub line: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ExpectedBuild {
    pub map: ExpectedMap,
    pub rejected: Vec<RejectedEntry>,
    pub duplicates: Vec<DuplicateEntry>,
}

/// Normalize every manifest entry against `base` and collect the expected map.
///
/// Entries outside the base directory are rejected individually. A repeated
/// key with the same digest is kept once and reported as a duplicate; a
/// repeated key with a different digest fails the whole build.
pub fn build_expected_map(
    entries: &[ManifestEntry],
    base: &BaseDirectory,
) -> Result<ExpectedBuild, ManifestError> {
    let mut build = ExpectedBuild::default();
    let mut first_lines: BTreeMap<RelativeKey, usize> = BTreeMap::new();

    for entry in entries {
        let key = match relative_key(&entry.absolute_path, base) {
            Ok(key) => key,
            Err(e) => {
                warn!("line {}: {e}", entry.line);
                build.rejected.push(RejectedEntry {
                    line: entry.line,
                    absolute_path: entry.absolute_path.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match build.map.entries.entry(key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(entry.digest.clone());
                first_lines.insert(key, entry.line);
            }
            Entry::Occupied(slot) => {
                let first_line = first_lines.get(&key).copied().unwrap_or_default();
                if *slot.get() != entry.digest {
                    return Err(ManifestError::ConflictingDuplicate {
                        key: key.into_inner(),
                        first_line,
                        second_line: entry.line,
                    });
                }
                debug!("line {}: duplicate of line {first_line} for {key}", entry.line);
                build.duplicates.push(DuplicateEntry {
                    key,
                    first_line,
                    line: entry.line,
                });
            }
        }
    }

    debug!(
        "expected map: {} keys, {} rejected, {} duplicates",
        build.map.len(),
        build.rejected.len(),
        build.duplicates.len()
    );
    Ok(build)
}
