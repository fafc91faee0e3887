use crate::CoreError;
use sealcheck_archive::{ArchivedFile, FileDigester};
use sealcheck_manifest::{Digest, RelativeKey};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Digest result for one archived file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualEntry {
    pub key: RelativeKey,
    pub size: u64,
    /// Computed digest, or the read error when the file could not be digested.
    pub digest: Result<Digest, String>,
}

/// Digest every file on up to `jobs` scoped worker threads.
///
/// Workers claim files through a shared cursor, so each file is digested
/// exactly once. `progress` receives the number of finished files after each
/// one. Results are sorted by key and do not depend on `jobs`. When `cancel`
/// becomes true, workers stop claiming files and the call returns
/// `CoreError::Interrupted`.
pub fn digest_files(
    files: &[ArchivedFile],
    digester: &dyn FileDigester,
    jobs: usize,
    cancel: &AtomicBool,
    progress: &(dyn Fn(usize) + Sync),
) -> Result<Vec<ActualEntry>, CoreError> {
    let workers = jobs.clamp(1, files.len().max(1));
    debug!("digesting {} files on {workers} workers", files.len());

    let cursor = AtomicUsize::new(0);
    let finished = AtomicUsize::new(0);
    let (cursor, finished) = (&cursor, &finished);

    let mut results: Vec<ActualEntry> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move || {
                    let mut local = Vec::new();
                    while !cancel.load(Ordering::SeqCst) {
                        let idx = cursor.fetch_add(1, Ordering::Relaxed);
                        let Some(file) = files.get(idx) else {
                            break;
                        };
                        local.push(digest_one(file, digester));
                        progress(finished.fetch_add(1, Ordering::Relaxed) + 1);
                    }
                    local
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    });

    if cancel.load(Ordering::SeqCst) {
        return Err(CoreError::Interrupted);
    }

    results.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(results)
}

fn digest_one(file: &ArchivedFile, digester: &dyn FileDigester) -> ActualEntry {
    let digest = digester.digest_file(&file.path).map_err(|e| {
        warn!("cannot digest {}: {e}", file.key);
        e.to_string()
    });
    ActualEntry {
        key: file.key.clone(),
        size: file.size,
        digest,
    }
}
