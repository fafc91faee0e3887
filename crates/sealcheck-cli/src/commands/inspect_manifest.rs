use super::{json_pretty, EXIT_MANIFEST_ERROR, EXIT_SUCCESS};
use sealcheck_core::{build_expected_map, CoreError, DuplicateEntry, RejectedEntry};
use sealcheck_manifest::{
    parse_manifest_file, resolve_base_directory, BaseDirectory, Digest, RelativeKey, SkippedLine,
};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ManifestInspection<'a> {
    manifest: String,
    entries: usize,
    base_directory: &'a BaseDirectory,
    base_directory_inferred: bool,
    skipped_lines: &'a [SkippedLine],
    duplicates: &'a [DuplicateEntry],
    rejected: &'a [RejectedEntry],
    keys: Vec<KeyRecord<'a>>,
}

#[derive(Serialize)]
struct KeyRecord<'a> {
    key: &'a RelativeKey,
    digest: &'a Digest,
}

pub fn run(manifest: &Path, base_dir: Option<&str>, json: bool) -> Result<u8, String> {
    let parsed = parse_manifest_file(manifest).map_err(|e| CoreError::from(e).to_string())?;
    let base = resolve_base_directory(&parsed.entries, base_dir)
        .map_err(|e| CoreError::from(e).to_string())?;
    let build =
        build_expected_map(&parsed.entries, &base).map_err(|e| CoreError::from(e).to_string())?;

    if json {
        let payload = ManifestInspection {
            manifest: manifest.display().to_string(),
            entries: parsed.entries.len(),
            base_directory: &base,
            base_directory_inferred: base_dir.is_none(),
            skipped_lines: &parsed.skipped,
            duplicates: &build.duplicates,
            rejected: &build.rejected,
            keys: build
                .map
                .iter()
                .map(|(key, digest)| KeyRecord { key, digest })
                .collect(),
        };
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("manifest:   {}", manifest.display());
        println!(
            "entries:    {} ({} skipped lines)",
            parsed.entries.len(),
            parsed.skipped.len()
        );
        println!(
            "base dir:   {}{}",
            base,
            if base_dir.is_none() { " (inferred)" } else { "" }
        );
        for skipped in parsed.malformed() {
            println!(
                "  skipped line {}: {} ({})",
                skipped.line,
                skipped.reason.as_str(),
                skipped.content
            );
        }
        for dup in &build.duplicates {
            println!(
                "  duplicate line {}: {} (first on line {})",
                dup.line, dup.key, dup.first_line
            );
        }
        for rejected in &build.rejected {
            println!("  rejected line {}: {}", rejected.line, rejected.reason);
        }
        println!();
        for (key, digest) in build.map.iter() {
            println!("  {digest}  {key}");
        }
    }

    if build.rejected.is_empty() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_MANIFEST_ERROR)
    }
}
