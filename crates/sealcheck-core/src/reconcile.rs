use crate::digest_pool::ActualEntry;
use crate::expected::ExpectedMap;
use sealcheck_manifest::{Digest, RelativeKey};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Classification of one relative key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Matched {
        digest: Digest,
    },
    Mismatched {
        expected: Digest,
        actual: Digest,
    },
    ManifestOnly {
        expected: Digest,
    },
    ArchiveOnly {
        actual: Digest,
    },
    /// The archived file exists but could not be digested.
    Unreadable {
        expected: Option<Digest>,
        error: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutcomeKind {
    Matched,
    Mismatched,
    ManifestOnly,
    ArchiveOnly,
    Unreadable,
}

impl OutcomeKind {
    pub const ALL: [OutcomeKind; 5] = [
        OutcomeKind::Matched,
        OutcomeKind::Mismatched,
        OutcomeKind::ManifestOnly,
        OutcomeKind::ArchiveOnly,
        OutcomeKind::Unreadable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeKind::Matched => "matched",
            OutcomeKind::Mismatched => "mismatched",
            OutcomeKind::ManifestOnly => "manifest_only",
            OutcomeKind::ArchiveOnly => "archive_only",
            OutcomeKind::Unreadable => "unreadable",
        }
    }
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Matched { .. } => OutcomeKind::Matched,
            Outcome::Mismatched { .. } => OutcomeKind::Mismatched,
            Outcome::ManifestOnly { .. } => OutcomeKind::ManifestOnly,
            Outcome::ArchiveOnly { .. } => OutcomeKind::ArchiveOnly,
            Outcome::Unreadable { .. } => OutcomeKind::Unreadable,
        }
    }
}

/// Count of outcomes per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub manifest_only: usize,
    pub archive_only: usize,
    pub unreadable: usize,
}

/// Outcome for every key of the expected map and the archive, ordered by key.
///
/// Serializes as a list of `{ "key": .., "status": .., .. }` records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationResult {
    outcomes: BTreeMap<RelativeKey, Outcome>,
}

impl ReconciliationResult {
    pub fn get(&self, key: &RelativeKey) -> Option<&Outcome> {
        self.outcomes.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RelativeKey, &Outcome)> {
        self.outcomes.iter()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn keys_of(&self, kind: OutcomeKind) -> Vec<&RelativeKey> {
        self.iter()
            .filter(|(_, o)| o.kind() == kind)
            .map(|(k, _)| k)
            .collect()
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.outcomes.len(),
            ..Summary::default()
        };
        for outcome in self.outcomes.values() {
            let slot = match outcome.kind() {
                OutcomeKind::Matched => &mut summary.matched,
                OutcomeKind::Mismatched => &mut summary.mismatched,
                OutcomeKind::ManifestOnly => &mut summary.manifest_only,
                OutcomeKind::ArchiveOnly => &mut summary.archive_only,
                OutcomeKind::Unreadable => &mut summary.unreadable,
            };
            *slot += 1;
        }
        summary
    }

    /// Every key matched. An empty result counts as clean.
    pub fn is_clean(&self) -> bool {
        self.outcomes
            .values()
            .all(|o| o.kind() == OutcomeKind::Matched)
    }

    /// blake3 hex digest of the canonical JSON form of the outcomes.
    ///
    /// Identical inputs always produce the same fingerprint, so two
    /// verification runs can be compared by this value alone.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let canonical = serde_json::to_string(self)?;
        Ok(blake3::hash(canonical.as_bytes()).to_hex().to_string())
    }
}

#[derive(Serialize)]
struct OutcomeRecord<'a> {
    key: &'a RelativeKey,
    #[serde(flatten)]
    outcome: &'a Outcome,
}

impl Serialize for ReconciliationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            self.outcomes
                .iter()
                .map(|(key, outcome)| OutcomeRecord { key, outcome }),
        )
    }
}

/// Classify every key in `expected` ∪ `actual` exactly once.
pub fn reconcile(expected: &ExpectedMap, actual: &[ActualEntry]) -> ReconciliationResult {
    let mut outcomes = BTreeMap::new();

    for entry in actual {
        let wanted = expected.get(&entry.key);
        let outcome = match (&entry.digest, wanted) {
            (Err(error), wanted) => Outcome::Unreadable {
                expected: wanted.cloned(),
                error: error.clone(),
            },
            (Ok(actual), None) => Outcome::ArchiveOnly {
                actual: actual.clone(),
            },
            (Ok(actual), Some(wanted)) if actual == wanted => Outcome::Matched {
                digest: actual.clone(),
            },
            (Ok(actual), Some(wanted)) => Outcome::Mismatched {
                expected: wanted.clone(),
                actual: actual.clone(),
            },
        };
        outcomes.insert(entry.key.clone(), outcome);
    }

    for (key, digest) in expected.iter() {
        outcomes
            .entry(key.clone())
            .or_insert_with(|| Outcome::ManifestOnly {
                expected: digest.clone(),
            });
    }

    ReconciliationResult { outcomes }
}
