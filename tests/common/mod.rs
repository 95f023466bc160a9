//! Shared fixture support: archives are synthesized byte-by-byte so the
//! tests control entry names, compression methods, and DOS timestamps
//! exactly.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;

/// Pack a calendar stamp into the DOS (date, time) words.
pub fn dos_datetime(
    year: u16,
    month: u16,
    day: u16,
    hour: u16,
    minute: u16,
    second: u16,
) -> (u16, u16) {
    let date = ((year - 1980) << 9) | (month << 5) | day;
    let time = (hour << 11) | (minute << 5) | (second / 2);
    (date, time)
}

struct Entry {
    name: String,
    stored: Vec<u8>,
    raw_len: u32,
    method: u16,
    date: u16,
    time: u16,
}

#[derive(Default)]
pub struct ZipBuilder {
    entries: Vec<Entry>,
    comment: Vec<u8>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a STORED file entry.
    pub fn stored(self, name: &str, body: &[u8], stamp: (u16, u16)) -> Self {
        self.entry(name, body.to_vec(), body.len() as u32, 0, stamp)
    }

    /// Add a DEFLATE file entry (raw deflate, as ZIP stores it).
    pub fn deflated(self, name: &str, body: &[u8], stamp: (u16, u16)) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(body).unwrap();
        let compressed = encoder.finish().unwrap();
        self.entry(name, compressed, body.len() as u32, 8, stamp)
    }

    /// Add a directory entry (name must end with `/`).
    pub fn dir(self, name: &str, stamp: (u16, u16)) -> Self {
        self.entry(name, Vec::new(), 0, 0, stamp)
    }

    /// Add an entry claiming an arbitrary compression method.
    pub fn with_method(self, name: &str, body: &[u8], method: u16, stamp: (u16, u16)) -> Self {
        self.entry(name, body.to_vec(), body.len() as u32, method, stamp)
    }

    /// Append an archive comment after the end-of-central-directory
    /// record.
    pub fn comment(mut self, text: &str) -> Self {
        self.comment = text.as_bytes().to_vec();
        self
    }

    fn entry(
        mut self,
        name: &str,
        stored: Vec<u8>,
        raw_len: u32,
        method: u16,
        (date, time): (u16, u16),
    ) -> Self {
        self.entries.push(Entry {
            name: name.to_owned(),
            stored,
            raw_len,
            method,
            date,
            time,
        });
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut offsets = Vec::new();

        for entry in &self.entries {
            offsets.push(out.len() as u32);
            out.extend_from_slice(b"PK\x03\x04");
            out.write_u16::<LittleEndian>(20).unwrap(); // version needed
            out.write_u16::<LittleEndian>(0).unwrap(); // flags
            out.write_u16::<LittleEndian>(entry.method).unwrap();
            out.write_u16::<LittleEndian>(entry.time).unwrap();
            out.write_u16::<LittleEndian>(entry.date).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap(); // crc, unchecked by the reader
            out.write_u32::<LittleEndian>(entry.stored.len() as u32).unwrap();
            out.write_u32::<LittleEndian>(entry.raw_len).unwrap();
            out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap(); // extra field
            out.extend_from_slice(entry.name.as_bytes());
            out.extend_from_slice(&entry.stored);
        }

        let cd_offset = out.len() as u32;
        for (entry, offset) in self.entries.iter().zip(&offsets) {
            out.extend_from_slice(b"PK\x01\x02");
            out.write_u16::<LittleEndian>(20).unwrap(); // version made by
            out.write_u16::<LittleEndian>(20).unwrap(); // version needed
            out.write_u16::<LittleEndian>(0).unwrap(); // flags
            out.write_u16::<LittleEndian>(entry.method).unwrap();
            out.write_u16::<LittleEndian>(entry.time).unwrap();
            out.write_u16::<LittleEndian>(entry.date).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap(); // crc
            out.write_u32::<LittleEndian>(entry.stored.len() as u32).unwrap();
            out.write_u32::<LittleEndian>(entry.raw_len).unwrap();
            out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap(); // extra field
            out.write_u16::<LittleEndian>(0).unwrap(); // comment
            out.write_u16::<LittleEndian>(0).unwrap(); // disk start
            out.write_u16::<LittleEndian>(0).unwrap(); // internal attrs
            out.write_u32::<LittleEndian>(0).unwrap(); // external attrs
            out.write_u32::<LittleEndian>(*offset).unwrap();
            out.extend_from_slice(entry.name.as_bytes());
        }
        let cd_size = out.len() as u32 - cd_offset;

        out.extend_from_slice(b"PK\x05\x06");
        out.write_u16::<LittleEndian>(0).unwrap(); // disk number
        out.write_u16::<LittleEndian>(0).unwrap(); // central directory disk
        out.write_u16::<LittleEndian>(self.entries.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(self.entries.len() as u16).unwrap();
        out.write_u32::<LittleEndian>(cd_size).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(self.comment.len() as u16).unwrap();
        out.extend_from_slice(&self.comment);
        out
    }

    pub fn write_to(self, path: &Path) {
        std::fs::write(path, self.build()).unwrap();
    }
}
