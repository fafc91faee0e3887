//! Reconciliation engine and verification orchestration for sealcheck.
//!
//! This crate ties the manifest and archive layers together: it builds the
//! expected digest map (`build_expected_map`), digests archived files on a
//! bounded worker pool (`digest_files`), classifies every relative key
//! (`reconcile`), and runs the whole flow through the `Verifier`. It also
//! holds the TOML run configuration and Ctrl-C handling.

pub mod concurrency;
pub mod config;
pub mod digest_pool;
pub mod expected;
pub mod reconcile;
pub mod verifier;

pub use concurrency::{install_signal_handler, shutdown_flag};
pub use config::{ConfigError, VerifyConfig, DEFAULT_CONFIG_FILE};
pub use digest_pool::{digest_files, ActualEntry};
pub use expected::{build_expected_map, DuplicateEntry, ExpectedBuild, ExpectedMap, RejectedEntry};
pub use reconcile::{reconcile, Outcome, OutcomeKind, ReconciliationResult, Summary};
pub use verifier::{
    inspect_archive, ArchiveListing, Stage, Verifier, VerifyOptions, VerifyReport,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Manifest(#[from] sealcheck_manifest::ManifestError),
    #[error("archive error: {0}")]
    Archive(#[from] sealcheck_archive::ArchiveError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("interrupted before all archived files were digested")]
    Interrupted,
}
