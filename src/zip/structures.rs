use std::io::Cursor;

use anyhow::{Result, bail};
use byteorder::{LittleEndian, ReadBytesExt};

/// Compression methods this tool can unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unsupported(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            other => CompressionMethod::Unsupported(other),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unsupported(other) => *other,
        }
    }
}

/// MS-DOS packed modification date and time, as recorded per entry in
/// the central directory.
///
/// Ordering compares the date word, then the time word. The year sits in
/// the high bits of the date word, so this matches chronological order
/// without decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DosDateTime {
    date: u16,
    time: u16,
}

impl DosDateTime {
    pub fn new(date: u16, time: u16) -> Self {
        Self { date, time }
    }

    pub fn year(&self) -> u16 {
        ((self.date >> 9) & 0x7F) + 1980
    }

    pub fn month(&self) -> u8 {
        ((self.date >> 5) & 0x0F) as u8
    }

    pub fn day(&self) -> u8 {
        (self.date & 0x1F) as u8
    }

    pub fn hour(&self) -> u8 {
        ((self.time >> 11) & 0x1F) as u8
    }

    pub fn minute(&self) -> u8 {
        ((self.time >> 5) & 0x3F) as u8
    }

    /// DOS time has two-second resolution.
    pub fn second(&self) -> u8 {
        ((self.time & 0x1F) * 2) as u8
    }

    /// Sortable `YYYYMMDD_HHMMSS` form, used to name output folders.
    pub fn label(&self) -> String {
        format!(
            "{:04}{:02}{:02}_{:02}{:02}{:02}",
            self.year(),
            self.month(),
            self.day(),
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

/// End of Central Directory record - 22 bytes minimum.
///
/// Only the fields the pipeline consumes are kept; disk-spanning fields
/// are validated implicitly by parse order and discarded.
pub struct Eocd {
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
}

impl Eocd {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("missing end-of-central-directory record");
        }

        let mut cursor = Cursor::new(&data[4..]);
        let _disk_number = cursor.read_u16::<LittleEndian>()?;
        let _cd_disk = cursor.read_u16::<LittleEndian>()?;
        let _disk_entries = cursor.read_u16::<LittleEndian>()?;
        let total_entries = cursor.read_u16::<LittleEndian>()?;
        let cd_size = cursor.read_u32::<LittleEndian>()?;
        let cd_offset = cursor.read_u32::<LittleEndian>()?;

        Ok(Self {
            total_entries,
            cd_size,
            cd_offset,
        })
    }

    /// Any field pinned at its sentinel means the real value lives in the
    /// ZIP64 record.
    pub fn needs_zip64(&self) -> bool {
        self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFF_FFFF
            || self.cd_offset == 0xFFFF_FFFF
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes.
pub struct Zip64Locator {
    pub eocd64_offset: u64,
}

impl Zip64Locator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("missing ZIP64 end-of-central-directory locator");
        }

        let mut cursor = Cursor::new(&data[4..]);
        let _eocd64_disk = cursor.read_u32::<LittleEndian>()?;
        let eocd64_offset = cursor.read_u64::<LittleEndian>()?;

        Ok(Self { eocd64_offset })
    }
}

/// ZIP64 End of Central Directory record - 56 bytes minimum.
pub struct Zip64Eocd {
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64Eocd {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("missing ZIP64 end-of-central-directory record");
        }

        let mut cursor = Cursor::new(&data[4..]);
        // Record size, versions, disk numbers, per-disk entry count.
        cursor.set_position(8 + 2 + 2 + 4 + 4 + 8);
        let total_entries = cursor.read_u64::<LittleEndian>()?;
        let cd_size = cursor.read_u64::<LittleEndian>()?;
        let cd_offset = cursor.read_u64::<LittleEndian>()?;

        Ok(Self {
            total_entries,
            cd_size,
            cd_offset,
        })
    }
}

/// Central Directory File Header signature and minimum size.
pub const CENTRAL_HEADER_SIGNATURE: &[u8] = b"PK\x01\x02";

/// Local File Header signature and fixed size.
pub const LOCAL_HEADER_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LOCAL_HEADER_SIZE: usize = 30;

/// One file or directory recorded in an archive's central directory.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub header_offset: u64,
    pub modified: DosDateTime,
    pub is_dir: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dos(year: u16, month: u16, day: u16, hour: u16, minute: u16, second: u16) -> DosDateTime {
        let date = ((year - 1980) << 9) | (month << 5) | day;
        let time = (hour << 11) | (minute << 5) | (second / 2);
        DosDateTime::new(date, time)
    }

    #[test]
    fn dos_datetime_decodes_packed_fields() {
        let stamp = dos(2023, 6, 15, 8, 30, 42);
        assert_eq!(stamp.year(), 2023);
        assert_eq!(stamp.month(), 6);
        assert_eq!(stamp.day(), 15);
        assert_eq!(stamp.hour(), 8);
        assert_eq!(stamp.minute(), 30);
        assert_eq!(stamp.second(), 42);
    }

    #[test]
    fn label_is_sortable_and_zero_padded() {
        assert_eq!(dos(2023, 6, 15, 8, 30, 0).label(), "20230615_083000");
        assert_eq!(dos(1999, 1, 2, 3, 4, 6).label(), "19990102_030406");
    }

    #[test]
    fn ordering_follows_the_calendar() {
        assert!(dos(2023, 1, 1, 10, 0, 0) < dos(2023, 6, 15, 8, 30, 0));
        assert!(dos(2022, 12, 31, 23, 59, 58) < dos(2023, 1, 1, 0, 0, 0));
        assert!(dos(2023, 6, 15, 8, 30, 0) < dos(2023, 6, 15, 8, 30, 2));
    }

    #[test]
    fn compression_method_round_trips() {
        assert_eq!(CompressionMethod::from_u16(0), CompressionMethod::Stored);
        assert_eq!(CompressionMethod::from_u16(8), CompressionMethod::Deflate);
        assert_eq!(
            CompressionMethod::from_u16(12),
            CompressionMethod::Unsupported(12)
        );
        assert_eq!(CompressionMethod::Unsupported(12).as_u16(), 12);
    }
}
