use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use flate2::read::DeflateDecoder;
use tokio::fs;

use crate::io::ReadAt;

use super::parser::ZipParser;
use super::structures::{ArchiveEntry, CompressionMethod};

/// High-level archive reader: entry listing, per-entry bodies, unpacking.
pub struct ZipReader<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipReader<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries recorded in the archive's central directory.
    pub async fn entries(&self) -> Result<Vec<ArchiveEntry>> {
        self.parser.entries().await
    }

    /// Read one entry's body into memory, inflating DEFLATE entries.
    ///
    /// ZIP stores raw deflate streams, no zlib wrapper.
    pub async fn read_entry(&self, entry: &ArchiveEntry) -> Result<Vec<u8>> {
        let offset = self.parser.data_offset(entry).await?;
        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.parser.reader().read_at(offset, &mut raw).await?;

        match entry.method {
            CompressionMethod::Stored => Ok(raw),
            CompressionMethod::Deflate => {
                let mut decoder = DeflateDecoder::new(raw.as_slice());
                let mut body = Vec::with_capacity(entry.uncompressed_size as usize);
                decoder
                    .read_to_end(&mut body)
                    .with_context(|| format!("cannot inflate {}", entry.name))?;
                Ok(body)
            }
            CompressionMethod::Unsupported(method) => {
                bail!("unsupported compression method {method} for {}", entry.name)
            }
        }
    }

    /// Unpack every entry under `destination`, preserving the archive's
    /// internal directory structure. Existing files are overwritten.
    pub async fn unpack(&self, entries: &[ArchiveEntry], destination: &Path) -> Result<()> {
        fs::create_dir_all(destination)
            .await
            .with_context(|| format!("cannot create {}", destination.display()))?;

        for entry in entries {
            let target = destination.join(relative_entry_path(&entry.name)?);

            if entry.is_dir {
                fs::create_dir_all(&target).await?;
                continue;
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).await?;
            }

            let body = self.read_entry(entry).await?;
            fs::write(&target, body)
                .await
                .with_context(|| format!("cannot write {}", target.display()))?;
        }

        Ok(())
    }
}

/// Map an entry name onto a path that stays below the extraction root.
///
/// Absolute names and parent-directory components are rejected rather
/// than resolved.
fn relative_entry_path(name: &str) -> Result<PathBuf> {
    let path = Path::new(name);
    if path.is_absolute() {
        bail!("refusing absolute entry path {name}");
    }

    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => bail!("entry path {name} escapes the extraction root"),
        }
    }

    Ok(path.to_path_buf())
}
