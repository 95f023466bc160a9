//! ZIP archive reading.
//!
//! Archives are read from the end: the end-of-central-directory record is
//! located in the file tail, then the central directory supplies every
//! entry's metadata without decompressing anything. Entry bodies are only
//! read when unpacking.
//!
//! Supported: standard and ZIP64 archives, STORED and DEFLATE entries.
//! Not supported: encryption, multi-disk archives, other compression
//! methods.

mod extractor;
mod parser;
mod structures;

pub use extractor::ZipReader;
pub use parser::ZipParser;
pub use structures::*;

use anyhow::{Result, anyhow};

/// Latest modification timestamp across `entries`.
///
/// The per-archive output folder is named after this value; an archive
/// with no entries cannot be labeled and is an error.
pub fn latest_modified(entries: &[ArchiveEntry]) -> Result<DosDateTime> {
    entries
        .iter()
        .map(|entry| entry.modified)
        .max()
        .ok_or_else(|| anyhow!("archive has no entries"))
}
