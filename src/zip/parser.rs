//! Low-level ZIP structure parsing.
//!
//! The archive is read back to front: the end-of-central-directory record
//! sits in the file tail, points at the central directory, and the central
//! directory describes every entry without touching compressed data. All
//! reads go through the [`ReadAt`] seam, so any random-access source works.

use std::io::{Cursor, Read};
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use byteorder::{LittleEndian, ReadBytesExt};

use crate::io::ReadAt;

use super::structures::*;

/// The format allows up to 65535 bytes of archive comment after the EOCD,
/// which bounds the backward search for the record.
const MAX_COMMENT_LEN: u64 = 65535;

/// Parses ZIP metadata from a random-access source.
///
/// Typically used through [`ZipReader`](super::ZipReader) rather than
/// directly.
pub struct ZipParser<R: ReadAt> {
    reader: Arc<R>,
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Locate and parse the end-of-central-directory record.
    ///
    /// Comment-free archives end exactly with the 22-byte record, which is
    /// the common case and costs a single tail read. Otherwise the record
    /// sits in front of an archive comment and is found by scanning
    /// backwards over the largest comment the format allows, verifying the
    /// comment-length field against the remaining bytes to reject stray
    /// signature bytes.
    ///
    /// # Errors
    ///
    /// Fails when no valid record exists, which is how corrupt, truncated,
    /// and non-ZIP files surface.
    async fn find_eocd(&self) -> Result<(Eocd, u64)> {
        if self.size >= Eocd::SIZE as u64 {
            let offset = self.size - Eocd::SIZE as u64;
            let mut tail = vec![0u8; Eocd::SIZE];
            self.reader.read_at(offset, &mut tail).await?;

            if tail.starts_with(Eocd::SIGNATURE) && tail[20..22] == [0, 0] {
                return Ok((Eocd::parse(&tail)?, offset));
            }
        }

        let span = (MAX_COMMENT_LEN + Eocd::SIZE as u64).min(self.size);
        let start = self.size - span;
        let mut tail = vec![0u8; span as usize];
        self.reader.read_at(start, &mut tail).await?;

        for i in (0..tail.len().saturating_sub(Eocd::SIZE)).rev() {
            if !tail[i..].starts_with(Eocd::SIGNATURE) {
                continue;
            }

            let comment_len = u16::from_le_bytes([tail[i + 20], tail[i + 21]]) as usize;
            if i + Eocd::SIZE + comment_len == tail.len() {
                let eocd = Eocd::parse(&tail[i..i + Eocd::SIZE])?;
                return Ok((eocd, start + i as u64));
            }
        }

        bail!("no end-of-central-directory record found; not a ZIP archive?")
    }

    /// Resolve the ZIP64 record for archives whose EOCD fields overflowed.
    ///
    /// The ZIP64 locator sits immediately before the regular EOCD and
    /// points at the full-width record.
    async fn read_zip64(&self, eocd_offset: u64) -> Result<Zip64Eocd> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64Locator::SIZE as u64)
            .ok_or_else(|| anyhow!("truncated ZIP64 archive"))?;

        let mut buf = vec![0u8; Zip64Locator::SIZE];
        self.reader.read_at(locator_offset, &mut buf).await?;
        let locator = Zip64Locator::parse(&buf)?;

        let mut buf = vec![0u8; Zip64Eocd::MIN_SIZE];
        self.reader.read_at(locator.eocd64_offset, &mut buf).await?;
        Zip64Eocd::parse(&buf)
    }

    /// Parse the central directory into one [`ArchiveEntry`] per entry.
    ///
    /// The directory is fetched in a single read; nothing is decompressed.
    pub async fn entries(&self) -> Result<Vec<ArchiveEntry>> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        let (cd_offset, cd_size, count) = if eocd.needs_zip64() {
            let eocd64 = self.read_zip64(eocd_offset).await?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        let mut directory = vec![0u8; cd_size as usize];
        self.reader.read_at(cd_offset, &mut directory).await?;

        let mut cursor = Cursor::new(directory.as_slice());
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            entries.push(Self::read_entry(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Parse one central-directory file header at the cursor.
    fn read_entry(cursor: &mut Cursor<&[u8]>) -> Result<ArchiveEntry> {
        let mut signature = [0u8; 4];
        cursor.read_exact(&mut signature)?;
        if signature != CENTRAL_HEADER_SIGNATURE {
            bail!("malformed central directory entry");
        }

        // Version-made-by, version-needed, and general-purpose flags.
        cursor.set_position(cursor.position() + 6);
        let method = cursor.read_u16::<LittleEndian>()?;
        let mod_time = cursor.read_u16::<LittleEndian>()?;
        let mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let name_len = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_len = cursor.read_u16::<LittleEndian>()? as u64;
        let comment_len = cursor.read_u16::<LittleEndian>()? as u64;
        // Disk-number-start and the internal/external attribute words.
        cursor.set_position(cursor.position() + 8);
        let mut header_offset = cursor.read_u32::<LittleEndian>()? as u64;

        let mut name_bytes = vec![0u8; name_len as usize];
        cursor.read_exact(&mut name_bytes)?;
        // Lossy conversion keeps non-UTF8 entry names walkable.
        let name = String::from_utf8_lossy(&name_bytes).into_owned();
        let is_dir = name.ends_with('/');

        // ZIP64 sizes and offsets live in extra field 0x0001, and each
        // value is present only when its 32-bit field holds the sentinel.
        let extra_end = cursor.position() + extra_len;
        while cursor.position() + 4 <= extra_end {
            let field_id = cursor.read_u16::<LittleEndian>()?;
            let field_len = cursor.read_u16::<LittleEndian>()? as u64;

            if field_id != 0x0001 {
                cursor.set_position(cursor.position() + field_len);
                continue;
            }

            if uncompressed_size == 0xFFFF_FFFF && cursor.position() + 8 <= extra_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFF_FFFF && cursor.position() + 8 <= extra_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if header_offset == 0xFFFF_FFFF && cursor.position() + 8 <= extra_end {
                header_offset = cursor.read_u64::<LittleEndian>()?;
            }
            break;
        }
        cursor.set_position(extra_end + comment_len);

        Ok(ArchiveEntry {
            name,
            method: CompressionMethod::from_u16(method),
            compressed_size,
            uncompressed_size,
            crc32,
            header_offset,
            modified: DosDateTime::new(mod_date, mod_time),
            is_dir,
        })
    }

    /// Compute where an entry's compressed data begins.
    ///
    /// The local header repeats the name and extra field with its own
    /// lengths, which may differ from the central directory's copy; the
    /// local lengths are authoritative for the data position.
    pub async fn data_offset(&self, entry: &ArchiveEntry) -> Result<u64> {
        let mut header = vec![0u8; LOCAL_HEADER_SIZE];
        self.reader.read_at(entry.header_offset, &mut header).await?;

        if !header.starts_with(LOCAL_HEADER_SIGNATURE) {
            bail!("malformed local header for {}", entry.name);
        }

        let name_len = u16::from_le_bytes([header[26], header[27]]) as u64;
        let extra_len = u16::from_le_bytes([header[28], header[29]]) as u64;

        Ok(entry.header_offset + LOCAL_HEADER_SIZE as u64 + name_len + extra_len)
    }

    /// The underlying random-access source, for reading entry data once
    /// its offset is known.
    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}
