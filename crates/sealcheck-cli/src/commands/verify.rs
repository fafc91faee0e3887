use super::{
    json_pretty, open_work_area, outcome_label, outcome_marker, spin_fail, spin_ok, spinner,
    EXIT_SUCCESS, EXIT_VERIFICATION_FAILED,
};
use sealcheck_core::{Outcome, Stage, Verifier, VerifyOptions, VerifyReport};
use std::path::Path;

pub fn run(
    manifest: &Path,
    archive: &Path,
    options: VerifyOptions,
    work_dir: Option<&Path>,
    show_matched: bool,
    json: bool,
) -> Result<u8, String> {
    let area = open_work_area(work_dir)?;
    let mut verifier = Verifier::new(options);

    let pb = if json {
        None
    } else {
        let pb = spinner("extracting archive...");
        let observer = pb.clone();
        verifier = verifier.with_observer(move |stage| match stage {
            Stage::Extracting => observer.set_message("extracting archive..."),
            Stage::Digesting { done, total } => {
                observer.set_message(format!("digesting files {done}/{total}..."));
            }
            Stage::Reconciling => observer.set_message("reconciling..."),
        });
        Some(pb)
    };

    let result = verifier.verify(manifest, archive, &area);
    // close() logs its own failure; the report is still valid.
    let _ = area.close();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            if let Some(pb) = &pb {
                spin_fail(pb, "verification aborted");
            }
            return Err(e.to_string());
        }
    };

    if let Some(pb) = &pb {
        if report.is_verified() {
            spin_ok(pb, "archive verified");
        } else {
            spin_fail(pb, "archive does not match manifest");
        }
    }

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        print_report(&report, show_matched);
    }

    if report.is_verified() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_VERIFICATION_FAILED)
    }
}

fn print_report(report: &VerifyReport, show_matched: bool) {
    let root = match &report.archive_root.wrapper {
        Some(name) => format!("wrapped in '{name}/'"),
        None => "true root".to_owned(),
    };
    println!(
        "manifest:     {} ({} entries)",
        report.manifest, report.manifest_entries
    );
    println!(
        "archive:      {} ({}, {root}, {} files)",
        report.archive,
        report.archive_format.as_str(),
        report.archived_files
    );
    println!(
        "base dir:     {}{}",
        report.base_directory,
        if report.base_directory_inferred {
            " (inferred)"
        } else {
            ""
        }
    );

    let malformed: Vec<_> = report
        .skipped_lines
        .iter()
        .filter(|s| s.reason.is_malformed())
        .collect();
    if !malformed.is_empty() {
        println!();
        println!("skipped manifest lines:");
        for skipped in malformed {
            println!(
                "  line {}: {} ({})",
                skipped.line,
                skipped.reason.as_str(),
                skipped.content
            );
        }
    }

    if !report.duplicates.is_empty() {
        println!();
        println!("duplicate manifest entries:");
        for dup in &report.duplicates {
            println!("  line {}: {} (first on line {})", dup.line, dup.key, dup.first_line);
        }
    }

    if !report.rejected.is_empty() {
        println!();
        println!("rejected manifest entries:");
        for rejected in &report.rejected {
            println!("  line {}: {}", rejected.line, rejected.reason);
        }
    }

    println!();
    for (key, outcome) in report.outcomes.iter() {
        let kind = outcome.kind();
        let marker = outcome_marker(kind);
        match outcome {
            Outcome::Matched { .. } if !show_matched => {}
            Outcome::Matched { .. } | Outcome::ManifestOnly { .. } | Outcome::ArchiveOnly { .. } => {
                println!("  {marker} {key}  {}", outcome_label(kind));
            }
            Outcome::Mismatched { expected, actual } => {
                println!("  {marker} {key}  {}", outcome_label(kind));
                println!("      expected {expected}");
                println!("      actual   {actual}");
            }
            Outcome::Unreadable { error, .. } => {
                println!("  {marker} {key}  {}: {error}", outcome_label(kind));
            }
        }
    }

    let s = &report.summary;
    println!(
        "\n{} keys: {} matched, {} mismatched, {} missing from archive, {} not in manifest, {} unreadable",
        s.total, s.matched, s.mismatched, s.manifest_only, s.archive_only, s.unreadable
    );
    println!("fingerprint:  {}", report.fingerprint);
}
