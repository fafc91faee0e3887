use crate::parse::ManifestEntry;
use crate::{split_segments, ManifestError};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// Directory prefix shared by manifest paths, held as path segments.
///
/// The leading separator run and the separator style of the path it came from
/// are kept for display only; comparisons use the segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseDirectory {
    segments: Vec<String>,
    leading: String,
    separator: Option<char>,
}

impl BaseDirectory {
    /// Parse a caller-supplied base directory. Either separator is accepted.
    pub fn parse(path: &str) -> Self {
        Self::from_parts(path, split_segments(path).map(str::to_owned).collect())
    }

    fn from_parts(origin: &str, segments: Vec<String>) -> Self {
        let leading: String = origin
            .chars()
            .take_while(|c| *c == '/' || *c == '\\')
            .collect();
        let separator = origin.chars().find(|c| *c == '/' || *c == '\\');
        Self {
            segments,
            leading,
            separator,
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for BaseDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = self.separator.unwrap_or('/').to_string();
        write!(f, "{}{}", self.leading, self.segments.join(&sep))
    }
}

impl Serialize for BaseDirectory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Longest run of leading segments common to every path.
///
/// Segments are compared exactly (case-sensitive). With no paths the result is
/// empty. With a single path the result is that whole path, which is why
/// [`resolve_base_directory`] refuses to infer from fewer than two paths.
pub fn infer_base_directory<'a, I>(paths: I) -> BaseDirectory
where
    I: IntoIterator<Item = &'a str>,
{
    let mut paths = paths.into_iter();
    let Some(first) = paths.next() else {
        return BaseDirectory::default();
    };

    let mut common: Vec<&str> = split_segments(first).collect();
    for path in paths {
        if common.is_empty() {
            break;
        }
        let shared = split_segments(path)
            .zip(common.iter())
            .take_while(|(candidate, kept)| candidate == *kept)
            .count();
        common.truncate(shared);
    }

    BaseDirectory::from_parts(first, common.into_iter().map(str::to_owned).collect())
}

/// Use the explicit base directory when given, otherwise infer one from the
/// manifest entries.
///
/// Inference needs at least two distinct paths; with fewer there is no way to
/// tell the directory part from the file name, so the caller must supply it.
pub fn resolve_base_directory(
    entries: &[ManifestEntry],
    explicit: Option<&str>,
) -> Result<BaseDirectory, ManifestError> {
    if let Some(path) = explicit {
        let base = BaseDirectory::parse(path);
        debug!("using explicit base directory {base}");
        return Ok(base);
    }

    let distinct: BTreeSet<&str> = entries.iter().map(|e| e.absolute_path.as_str()).collect();
    if distinct.len() < 2 {
        return Err(ManifestError::BaseDirectoryRequired {
            entries: distinct.len(),
        });
    }

    let base = infer_base_directory(entries.iter().map(|e| e.absolute_path.as_str()));
    debug!("inferred base directory {base} from {} paths", distinct.len());
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Digest;

    fn entry(path: &str) -> ManifestEntry {
        ManifestEntry {
            line: 1,
            digest: Digest::parse(&"0".repeat(64)).unwrap(),
            absolute_path: path.to_owned(),
        }
    }

    #[test]
    fn infers_deepest_common_windows_directory() {
        let base = infer_base_directory([r"C:\A\B\f1.txt", r"C:\A\B\C\f2.txt"]);
        assert_eq!(base.to_string(), r"C:\A\B");
        assert_eq!(base.segments(), ["C:", "A", "B"]);
    }

    #[test]
    fn infers_unix_directory_with_leading_slash() {
        let base = infer_base_directory(["/srv/case/a/x.bin", "/srv/case/b/y.bin", "/srv/case/z"]);
        assert_eq!(base.to_string(), "/srv/case");
    }

    #[test]
    fn never_matches_partial_segments() {
        let base = infer_base_directory(["/data/evidence1/a.txt", "/data/evidence2/b.txt"]);
        assert_eq!(base.to_string(), "/data");
    }

    #[test]
    fn mixed_separators_and_repeated_separators_agree() {
        let base = infer_base_directory([r"C:\A\\B\f1.txt", "C:/A/B/sub/f2.txt"]);
        assert_eq!(base.segments(), ["C:", "A", "B"]);
    }

    #[test]
    fn segment_comparison_is_case_sensitive() {
        let base = infer_base_directory([r"C:\Case\a.txt", r"C:\case\b.txt"]);
        assert_eq!(base.segments(), ["C:"]);
    }

    #[test]
    fn disjoint_roots_give_empty_base() {
        let base = infer_base_directory([r"C:\a.txt", r"D:\b.txt", r"C:\c.txt"]);
        assert!(base.is_empty());
    }

    #[test]
    fn no_paths_give_empty_base() {
        let base = infer_base_directory(std::iter::empty());
        assert!(base.is_empty());
        assert_eq!(base.to_string(), "");
    }

    #[test]
    fn single_path_degenerates_to_whole_path() {
        let base = infer_base_directory(["/only/file.txt"]);
        assert_eq!(base.segments(), ["only", "file.txt"]);
    }

    #[test]
    fn resolve_requires_explicit_base_for_single_entry() {
        let err = resolve_base_directory(&[entry("/only/file.txt")], None).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::BaseDirectoryRequired { entries: 1 }
        ));
    }

    #[test]
    fn resolve_counts_distinct_paths() {
        let entries = [entry("/a/file.txt"), entry("/a/file.txt")];
        assert!(resolve_base_directory(&entries, None).is_err());
    }

    #[test]
    fn resolve_prefers_explicit_base() {
        let entries = [entry(r"C:\A\B\f1.txt"), entry(r"C:\A\B\C\f2.txt")];
        let base = resolve_base_directory(&entries, Some(r"C:\A")).unwrap();
        assert_eq!(base.segments(), ["C:", "A"]);
    }

    #[test]
    fn resolve_accepts_explicit_base_for_single_entry() {
        let base = resolve_base_directory(&[entry("/only/file.txt")], Some("/only/")).unwrap();
        assert_eq!(base.to_string(), "/only");
    }

    #[test]
    fn serializes_as_display_string() {
        let base = BaseDirectory::parse(r"\\server\share\case");
        let json = serde_json::to_string(&base).unwrap();
        assert_eq!(json, r#""\\\\server\\share\\case""#);
    }
}
