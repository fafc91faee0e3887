use crate::work_area::WorkArea;
use crate::ArchiveError;
use flate2::read::MultiGzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
}

impl ArchiveFormat {
    /// Detect the format from the file name (case-insensitive extension).
    pub fn from_path(path: &Path) -> Result<Self, ArchiveError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if name.ends_with(".zip") {
            Ok(Self::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Ok(Self::TarGz)
        } else if name.ends_with(".tar") {
            Ok(Self::Tar)
        } else {
            Err(ArchiveError::UnsupportedFormat(
                path.to_string_lossy().into_owned(),
            ))
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
        }
    }
}

/// Extracted archive content inside a [`WorkArea`].
#[derive(Debug, Clone)]
pub struct ExtractedArchive {
    /// Directory holding the archive's true root.
    pub root: PathBuf,
    pub format: ArchiveFormat,
    pub files_written: usize,
}

/// Extract `archive` into the work area's content directory.
///
/// Only regular files and directories are materialized; links and special
/// entries are skipped with a warning. Entry names may use `/` or `\`; any
/// name with a `..` segment aborts extraction with `UnsafeEntry`.
pub fn extract_archive(archive: &Path, area: &WorkArea) -> Result<ExtractedArchive, ArchiveError> {
    let format = ArchiveFormat::from_path(archive)?;
    let dest = area.content_dir();
    fs::create_dir_all(&dest)?;

    let file = File::open(archive).map_err(|source| ArchiveError::Unreadable {
        path: archive.to_owned(),
        source,
    })?;

    let files_written = match format {
        ArchiveFormat::Zip => extract_zip(file, archive, &dest)?,
        ArchiveFormat::Tar => extract_tar(BufReader::new(file), archive, &dest)?,
        ArchiveFormat::TarGz => {
            extract_tar(MultiGzDecoder::new(BufReader::new(file)), archive, &dest)?
        }
    };

    info!(
        "extracted {files_written} files from {} ({format:?})",
        archive.display()
    );
    Ok(ExtractedArchive {
        root: dest,
        format,
        files_written,
    })
}

fn extract_zip(file: File, archive: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    let mut zip = zip::ZipArchive::new(file).map_err(|e| ArchiveError::corrupt(archive, e))?;
    let mut written = 0;

    for idx in 0..zip.len() {
        let mut entry = zip
            .by_index(idx)
            .map_err(|e| ArchiveError::corrupt(archive, e))?;
        let name = entry.name().to_owned();
        let Some(rel) = safe_relative_path(&name)? else {
            continue;
        };
        if entry.is_symlink() {
            warn!("skipping symlink entry: {name}");
            continue;
        }
        let out = dest.join(&rel);

        if entry.is_dir() || name.ends_with('/') || name.ends_with('\\') {
            fs::create_dir_all(&out)?;
            continue;
        }
        write_entry(&mut entry, &out).map_err(|e| match e {
            EntryWriteError::Read(e) => ArchiveError::corrupt(archive, format!("{name}: {e}")),
            EntryWriteError::Write(e) => ArchiveError::Io(e),
        })?;
        written += 1;
    }
    Ok(written)
}

fn extract_tar<R: Read>(reader: R, archive: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    let mut ar = tar::Archive::new(reader);
    let mut written = 0;

    for entry in ar.entries().map_err(|e| ArchiveError::corrupt(archive, e))? {
        let mut entry = entry.map_err(|e| ArchiveError::corrupt(archive, e))?;
        let name = entry
            .path()
            .map_err(|e| ArchiveError::corrupt(archive, e))?
            .to_string_lossy()
            .into_owned();
        let Some(rel) = safe_relative_path(&name)? else {
            continue;
        };
        let out = dest.join(&rel);

        let kind = entry.header().entry_type();
        if kind.is_dir() {
            fs::create_dir_all(&out)?;
        } else if kind.is_file() {
            write_entry(&mut entry, &out).map_err(|e| match e {
                EntryWriteError::Read(e) => ArchiveError::corrupt(archive, format!("{name}: {e}")),
                EntryWriteError::Write(e) => ArchiveError::Io(e),
            })?;
            written += 1;
        } else {
            warn!("skipping unsupported entry type {kind:?}: {name}");
        }
    }
    Ok(written)
}

enum EntryWriteError {
    Read(io::Error),
    Write(io::Error),
}

/// Stream one entry to `out`, keeping read (archive) failures apart from
/// write (work area) failures.
fn write_entry(reader: &mut impl Read, out: &Path) -> Result<(), EntryWriteError> {
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent).map_err(EntryWriteError::Write)?;
    }
    let mut file = File::create(out).map_err(EntryWriteError::Write)?;
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf).map_err(EntryWriteError::Read)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(EntryWriteError::Write)?;
    }
    Ok(())
}

/// Turn an entry name into a path below the extraction directory.
///
/// Returns `Ok(None)` for names with no usable segment (e.g. `./`).
fn safe_relative_path(name: &str) -> Result<Option<PathBuf>, ArchiveError> {
    let mut rel = PathBuf::new();
    for segment in name.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => return Err(ArchiveError::UnsafeEntry(name.to_owned())),
            s if s.contains('\0') => return Err(ArchiveError::UnsafeEntry(name.to_owned())),
            s => rel.push(s),
        }
    }
    if rel.as_os_str().is_empty() {
        debug!("skipping entry without a path: {name:?}");
        return Ok(None);
    }
    Ok(Some(rel))
}
