mod local;

pub use local::LocalFileReader;

use anyhow::Result;
use async_trait::async_trait;

/// Trait for random access reading from an archive source.
///
/// ZIP archives are parsed from the end of the file, so the reader must
/// support positioned reads rather than sequential consumption.
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer.
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Total size of the source in bytes.
    fn size(&self) -> u64;
}
