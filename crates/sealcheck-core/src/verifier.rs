use crate::concurrency::shutdown_flag;
use crate::config::VerifyConfig;
use crate::digest_pool::digest_files;
use crate::expected::{build_expected_map, DuplicateEntry, RejectedEntry};
use crate::reconcile::{reconcile, ReconciliationResult, Summary};
use crate::CoreError;
use sealcheck_archive::{
    detect_archive_root, extract_archive, list_files, ArchiveFormat, ArchiveRoot, ArchivedFile,
    FileDigester, Sha256Digester, WorkArea,
};
use sealcheck_manifest::{
    parse_manifest_file, resolve_base_directory, BaseDirectory, ParsedManifest, SkippedLine,
};
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Base directory of the manifest paths; inferred when `None`.
    pub base_directory: Option<String>,
    /// Number of digest workers, at least 1.
    pub jobs: usize,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            base_directory: None,
            jobs: default_jobs(),
        }
    }
}

impl VerifyOptions {
    pub fn from_config(config: &VerifyConfig) -> Self {
        Self {
            base_directory: config.base_directory.clone(),
            jobs: config.jobs.unwrap_or_else(default_jobs).max(1),
        }
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// Progress notifications emitted during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extracting,
    Digesting { done: usize, total: usize },
    Reconciling,
}

/// Full outcome of a verification run, ready for display or JSON export.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub manifest: String,
    pub archive: String,
    pub generated_at: String,
    pub base_directory: BaseDirectory,
    pub base_directory_inferred: bool,
    pub archive_format: ArchiveFormat,
    pub archive_root: ArchiveRoot,
    pub manifest_entries: usize,
    pub archived_files: usize,
    pub skipped_lines: Vec<SkippedLine>,
    pub duplicates: Vec<DuplicateEntry>,
    pub rejected: Vec<RejectedEntry>,
    pub summary: Summary,
    pub outcomes: ReconciliationResult,
    pub fingerprint: String,
}

impl VerifyReport {
    /// No rejected manifest entries and every key matched.
    pub fn is_verified(&self) -> bool {
        self.rejected.is_empty() && self.outcomes.is_clean()
    }
}

/// Runs manifest-versus-archive verification.
///
/// Owns the digest implementation and the cancellation flag; the extraction
/// work area is supplied by the caller for each run.
pub struct Verifier {
    options: VerifyOptions,
    digester: Box<dyn FileDigester + Send>,
    cancel: &'static AtomicBool,
    observer: Option<Box<dyn Fn(Stage) + Send + Sync>>,
}

impl Verifier {
    pub fn new(options: VerifyOptions) -> Self {
        Self {
            options,
            digester: Box::new(Sha256Digester),
            cancel: shutdown_flag(),
            observer: None,
        }
    }

    #[must_use]
    pub fn with_digester(mut self, digester: impl FileDigester + Send + 'static) -> Self {
        self.digester = Box::new(digester);
        self
    }

    #[must_use]
    pub fn with_cancel_flag(mut self, flag: &'static AtomicBool) -> Self {
        self.cancel = flag;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl Fn(Stage) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn options(&self) -> &VerifyOptions {
        &self.options
    }

    fn notify(&self, stage: Stage) {
        if let Some(observer) = &self.observer {
            observer(stage);
        }
    }

    /// Parse `manifest`, extract `archive` into `area`, and reconcile.
    pub fn verify(
        &self,
        manifest: &Path,
        archive: &Path,
        area: &WorkArea,
    ) -> Result<VerifyReport, CoreError> {
        let parsed = parse_manifest_file(manifest)?;
        self.verify_parsed(&parsed, manifest, archive, area)
    }

    /// Verify an already parsed manifest. `manifest` is used for reporting only.
    pub fn verify_parsed(
        &self,
        parsed: &ParsedManifest,
        manifest: &Path,
        archive: &Path,
        area: &WorkArea,
    ) -> Result<VerifyReport, CoreError> {
        let base = resolve_base_directory(&parsed.entries, self.options.base_directory.as_deref())?;
        let expected = build_expected_map(&parsed.entries, &base)?;

        self.notify(Stage::Extracting);
        let extracted = extract_archive(archive, area)?;
        let root = detect_archive_root(&extracted.root)?;
        let files = list_files(&root.path)?;

        let total = files.len();
        self.notify(Stage::Digesting { done: 0, total });
        let actual = digest_files(
            &files,
            self.digester.as_ref(),
            self.options.jobs,
            self.cancel,
            &|done: usize| self.notify(Stage::Digesting { done, total }),
        )?;

        self.notify(Stage::Reconciling);
        let outcomes = reconcile(&expected.map, &actual);
        let summary = outcomes.summary();
        let fingerprint = outcomes.fingerprint()?;

        info!(
            "reconciled {} keys: {} matched, {} mismatched, {} manifest-only, {} archive-only, {} unreadable",
            summary.total,
            summary.matched,
            summary.mismatched,
            summary.manifest_only,
            summary.archive_only,
            summary.unreadable
        );

        Ok(VerifyReport {
            manifest: manifest.display().to_string(),
            archive: archive.display().to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            base_directory: base,
            base_directory_inferred: self.options.base_directory.is_none(),
            archive_format: extracted.format,
            archive_root: root,
            manifest_entries: parsed.entries.len(),
            archived_files: total,
            skipped_lines: parsed.skipped.clone(),
            duplicates: expected.duplicates,
            rejected: expected.rejected,
            summary,
            outcomes,
            fingerprint,
        })
    }
}

/// Effective root and file listing of an archive, without digesting.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveListing {
    pub archive: String,
    pub format: ArchiveFormat,
    pub root: ArchiveRoot,
    pub files: Vec<ArchivedFile>,
}

pub fn inspect_archive(archive: &Path, area: &WorkArea) -> Result<ArchiveListing, CoreError> {
    let extracted = extract_archive(archive, area)?;
    let root = detect_archive_root(&extracted.root)?;
    let files = list_files(&root.path)?;
    Ok(ArchiveListing {
        archive: archive.display().to_string(),
        format: extracted.format,
        root,
        files,
    })
}
