//! Content hashing for uploaded files.
//!
//! The SHA-256 digest of a file's bytes is its identity: it names the
//! storage directory and is the dedupe key for uploads.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Size of each read when hashing a file from disk.
const CHUNK_SIZE: usize = 8 * 1024;

/// Computes the lowercase hex SHA-256 of the file at `path`.
///
/// Reads in fixed 8 KiB chunks so memory use does not grow with file size.
pub fn calculate_file_hash(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Computes the lowercase hex SHA-256 of an in-memory buffer.
pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
