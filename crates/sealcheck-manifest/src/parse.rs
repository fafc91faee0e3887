use crate::types::Digest;
use crate::ManifestError;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// The only algorithm tag accepted in a manifest record.
pub const ALGORITHM_TAG: &str = "SHA256";

/// Algorithm names emitted by common hashing tools that sealcheck recognizes
/// but does not verify.
const KNOWN_OTHER_ALGORITHMS: &[&str] = &[
    "SHA1",
    "SHA384",
    "SHA512",
    "MD5",
    "MACTRIPLEDES",
    "RIPEMD160",
];

/// One `(digest, absolute path)` record from a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// 1-based line number in the manifest text.
    pub line: usize,
    pub digest: Digest,
    /// Path exactly as written after the digest, trimmed.
    pub absolute_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Column header or separator line.
    Header,
    UnsupportedAlgorithm,
    InvalidDigest,
    MissingPath,
    Unrecognized,
}

impl SkipReason {
    /// Whether this kind of skipped line suggests a damaged manifest rather
    /// than decoration around the records.
    pub fn is_malformed(self) -> bool {
        !matches!(self, SkipReason::Header)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::Header => "header",
            SkipReason::UnsupportedAlgorithm => "unsupported algorithm",
            SkipReason::InvalidDigest => "invalid digest",
            SkipReason::MissingPath => "missing path",
            SkipReason::Unrecognized => "unrecognized line",
        }
    }
}

/// A non-blank manifest line that did not produce an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    pub line: usize,
    pub reason: SkipReason,
    pub content: String,
}

/// Parsed manifest: usable entries plus a diagnostic for every skipped line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedManifest {
    pub entries: Vec<ManifestEntry>,
    pub skipped: Vec<SkippedLine>,
}

impl ParsedManifest {
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.absolute_path.as_str())
    }

    /// Skipped lines other than headers and separators.
    pub fn malformed(&self) -> impl Iterator<Item = &SkippedLine> {
        self.skipped.iter().filter(|s| s.reason.is_malformed())
    }

    pub fn has_malformed_lines(&self) -> bool {
        self.malformed().next().is_some()
    }
}

pub fn parse_manifest_str(input: &str) -> ParsedManifest {
    let mut parsed = ParsedManifest::default();

    for (idx, raw) in input.lines().enumerate() {
        let line = idx + 1;
        match parse_line(raw) {
            Ok(None) => {}
            Ok(Some((digest, absolute_path))) => parsed.entries.push(ManifestEntry {
                line,
                digest,
                absolute_path,
            }),
            Err(reason) => parsed.skipped.push(SkippedLine {
                line,
                reason,
                content: raw.trim().to_owned(),
            }),
        }
    }

    debug!(
        "parsed manifest: {} entries, {} skipped lines",
        parsed.entries.len(),
        parsed.skipped.len()
    );
    parsed
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<ParsedManifest, ManifestError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let content = decode_manifest_bytes(&bytes)?;
    debug!("read manifest {} ({} bytes)", path.display(), bytes.len());
    Ok(parse_manifest_str(&content))
}

/// Decode manifest bytes as UTF-8, or as UTF-16 when a UTF-16 BOM is present.
///
/// Windows tooling commonly writes redirected output as UTF-16LE with a BOM.
pub fn decode_manifest_bytes(bytes: &[u8]) -> Result<String, ManifestError> {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return utf8(rest);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return utf16(rest, u16::from_be_bytes);
    }
    utf8(bytes)
}

fn utf8(bytes: &[u8]) -> Result<String, ManifestError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| ManifestError::Encoding(format!("invalid UTF-8: {e}")))
}

fn utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String, ManifestError> {
    if bytes.len() % 2 != 0 {
        return Err(ManifestError::Encoding(
            "UTF-16 content has an odd number of bytes".to_owned(),
        ));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|e| ManifestError::Encoding(format!("invalid UTF-16: {e}")))
}

/// `Ok(None)` for blank lines, `Ok(Some(..))` for records.
fn parse_line(raw: &str) -> Result<Option<(Digest, String)>, SkipReason> {
    let line = raw.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if is_header(line) {
        return Err(SkipReason::Header);
    }

    let (tag, rest) = split_token(line);
    if !tag.eq_ignore_ascii_case(ALGORITHM_TAG) {
        let upper = tag.to_ascii_uppercase();
        return Err(if KNOWN_OTHER_ALGORITHMS.contains(&upper.as_str()) {
            SkipReason::UnsupportedAlgorithm
        } else {
            SkipReason::Unrecognized
        });
    }

    let (digest, rest) = split_token(rest);
    let digest = Digest::parse(digest).map_err(|_| SkipReason::InvalidDigest)?;

    let path = rest.trim();
    if path.is_empty() {
        return Err(SkipReason::MissingPath);
    }
    Ok(Some((digest, path.to_owned())))
}

/// Split off the first whitespace-delimited token; the remainder keeps its
/// inner whitespace but loses the leading run.
fn split_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(pos) => (&s[..pos], s[pos..].trim_start()),
        None => (s, ""),
    }
}

fn is_header(line: &str) -> bool {
    if line.chars().all(|c| c == '-' || c.is_whitespace()) {
        return true;
    }
    let (first, rest) = split_token(line);
    first.eq_ignore_ascii_case("algorithm") && rest.to_ascii_lowercase().starts_with("hash")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(c: char) -> String {
        std::iter::repeat(c).take(64).collect()
    }

    #[test]
    fn parses_powershell_table_output() {
        let input = format!(
            "\n\
             Algorithm       Hash                                                                   Path\n\
             ---------       ----                                                                   ----\n\
             SHA256          {}       C:\\Evidence\\Case42\\img\\disk.E01\n\
             SHA256          {}       C:\\Evidence\\Case42\\notes.txt\n\
             \n",
            hex('A'),
            hex('b')
        );
        let parsed = parse_manifest_str(&input);
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[0].digest.as_str(), hex('a'));
        assert_eq!(
            parsed.entries[0].absolute_path,
            r"C:\Evidence\Case42\img\disk.E01"
        );
        assert_eq!(parsed.entries[0].line, 4);
        assert_eq!(parsed.skipped.len(), 2);
        assert!(parsed.skipped.iter().all(|s| s.reason == SkipReason::Header));
        assert!(!parsed.has_malformed_lines());
    }

    #[test]
    fn path_keeps_inner_whitespace() {
        let input = format!("SHA256 {}   /srv/case files/photo  01.jpg   ", hex('c'));
        let parsed = parse_manifest_str(&input);
        assert_eq!(parsed.entries[0].absolute_path, "/srv/case files/photo  01.jpg");
    }

    #[test]
    fn algorithm_tag_is_case_insensitive() {
        let input = format!("sha256\t{}\t/data/x.bin", hex('d'));
        let parsed = parse_manifest_str(&input);
        assert_eq!(parsed.entries.len(), 1);
    }

    #[test]
    fn reports_each_kind_of_malformed_line() {
        let input = format!(
            "MD5 {} /data/a\n\
             SHA256 1234 /data/b\n\
             SHA256 {}\n\
             garbage here\n\
             SHA256 {} /data/ok\n",
            hex('e'),
            hex('f'),
            hex('0')
        );
        let parsed = parse_manifest_str(&input);
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].line, 5);
        let reasons: Vec<_> = parsed.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(
            reasons,
            [
                SkipReason::UnsupportedAlgorithm,
                SkipReason::InvalidDigest,
                SkipReason::MissingPath,
                SkipReason::Unrecognized,
            ]
        );
        assert!(parsed.has_malformed_lines());
        assert_eq!(parsed.malformed().count(), 4);
        assert_eq!(parsed.skipped[3].content, "garbage here");
    }

    #[test]
    fn bare_tag_line_is_invalid_digest() {
        let parsed = parse_manifest_str("SHA256");
        assert_eq!(parsed.skipped[0].reason, SkipReason::InvalidDigest);
    }

    #[test]
    fn blank_input_yields_nothing() {
        let parsed = parse_manifest_str("\n   \n\t\n");
        assert!(parsed.entries.is_empty());
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn handles_crlf_line_endings() {
        let input = format!("SHA256 {} C:\\a\\b.txt\r\nSHA256 {} C:\\a\\c.txt\r\n", hex('1'), hex('2'));
        let parsed = parse_manifest_str(&input);
        assert_eq!(parsed.entries[1].absolute_path, r"C:\a\c.txt");
    }

    #[test]
    fn decodes_utf16le_with_bom() {
        let text = format!("SHA256 {} C:\\ä\\b.txt", hex('3'));
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let decoded = decode_manifest_bytes(&bytes).unwrap();
        assert_eq!(decoded, text);
    }

    #[test]
    fn decodes_utf16be_with_bom() {
        let text = "SHA256 x y";
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_manifest_bytes(&bytes).unwrap(), text);
    }

    #[test]
    fn strips_utf8_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"hello");
        assert_eq!(decode_manifest_bytes(&bytes).unwrap(), "hello");
    }

    #[test]
    fn rejects_odd_utf16_payload() {
        let err = decode_manifest_bytes(&[0xFF, 0xFE, 0x41]).unwrap_err();
        assert!(matches!(err, ManifestError::Encoding(_)));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let err = decode_manifest_bytes(&[0x53, 0xC3, 0x28]).unwrap_err();
        assert!(err.to_string().contains("invalid UTF-8"));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_manifest_file(dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, ManifestError::Unreadable(_)));
    }

    #[test]
    fn parses_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hashes.txt");
        std::fs::write(&path, format!("SHA256 {} /case/a.txt\n", hex('9'))).unwrap();
        let parsed = parse_manifest_file(&path).unwrap();
        assert_eq!(parsed.paths().collect::<Vec<_>>(), ["/case/a.txt"]);
    }
}
