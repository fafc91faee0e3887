use sealcheck_manifest::Digest;
use sha2::{Digest as _, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Computes the digest of a file's bytes.
///
/// Implementations must be safe to call from several worker threads at once.
pub trait FileDigester: Sync {
    fn digest_file(&self, path: &Path) -> io::Result<Digest>;
}

/// Streaming SHA-256 over the file contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digester;

impl FileDigester for Sha256Digester {
    fn digest_file(&self, path: &Path) -> io::Result<Digest> {
        sha256_reader(&mut File::open(path)?)
    }
}

/// SHA-256 of everything `reader` yields. Interrupted reads are retried.
pub fn sha256_reader(reader: &mut impl Read) -> io::Result<Digest> {
    let mut hasher = Sha256::new();
    io::copy(reader, &mut hasher)?;
    Digest::parse(&hex::encode(hasher.finalize())).map_err(io::Error::other)
}

/// Lowercase hex SHA-256 of an in-memory buffer.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
