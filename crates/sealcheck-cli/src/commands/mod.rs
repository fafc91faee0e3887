pub mod completions;
pub mod inspect_archive;
pub mod inspect_manifest;
pub mod man_pages;
pub mod verify;

use indicatif::{ProgressBar, ProgressStyle};
use sealcheck_archive::WorkArea;
use sealcheck_core::OutcomeKind;
use std::path::Path;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_ARCHIVE_ERROR: u8 = 3;
pub const EXIT_VERIFICATION_FAILED: u8 = 4;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn outcome_marker(kind: OutcomeKind) -> String {
    use console::Style;
    match kind {
        OutcomeKind::Matched => Style::new().green().apply_to("✓").to_string(),
        OutcomeKind::Mismatched => Style::new().red().bold().apply_to("✗").to_string(),
        OutcomeKind::ManifestOnly => Style::new().yellow().apply_to("-").to_string(),
        OutcomeKind::ArchiveOnly => Style::new().cyan().apply_to("+").to_string(),
        OutcomeKind::Unreadable => Style::new().magenta().bold().apply_to("!").to_string(),
    }
}

pub fn outcome_label(kind: OutcomeKind) -> &'static str {
    match kind {
        OutcomeKind::Matched => "matched",
        OutcomeKind::Mismatched => "mismatched",
        OutcomeKind::ManifestOnly => "missing from archive",
        OutcomeKind::ArchiveOnly => "not in manifest",
        OutcomeKind::Unreadable => "unreadable",
    }
}

/// Create the extraction work area, under `parent` when given.
pub fn open_work_area(parent: Option<&Path>) -> Result<WorkArea, String> {
    let area = match parent {
        Some(dir) => WorkArea::new_in(dir),
        None => WorkArea::new(),
    };
    area.map_err(|e| format!("failed to create work area: {e}"))
}
