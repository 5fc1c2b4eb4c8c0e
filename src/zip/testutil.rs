//! In-memory archive builder, shared by unit and integration tests.

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

/// 2025-01-01 12:00:00 in DOS format.
pub const DOS_DATE: u16 = 0x5A21;
pub const DOS_TIME: u16 = 0x6000;

struct Member {
    name: String,
    method: u16,
    flags: u16,
    payload: Vec<u8>,
    size: u32,
}

/// Writes local headers, payloads, central directory and trailer in the
/// order members were added.
#[derive(Default)]
pub struct ArchiveBuilder {
    members: Vec<Member>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directory(self, name: &str) -> Self {
        self.raw(name, 0, 0, Vec::new(), 0)
    }

    pub fn stored(self, name: &str, content: &[u8]) -> Self {
        self.raw(name, 0, 0, content.to_vec(), content.len() as u32)
    }

    pub fn deflated(self, name: &str, content: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content).unwrap();
        let payload = encoder.finish().unwrap();
        self.raw(name, 8, 0, payload, content.len() as u32)
    }

    /// Member with an arbitrary method, flags and declared size.
    pub fn raw(mut self, name: &str, method: u16, flags: u16, payload: Vec<u8>, size: u32) -> Self {
        self.members.push(Member {
            name: name.to_owned(),
            method,
            flags,
            payload,
            size,
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut offsets = Vec::new();

        for m in &self.members {
            offsets.push(out.len() as u32);
            out.extend_from_slice(b"PK\x03\x04");
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(m.flags).unwrap();
            out.write_u16::<LittleEndian>(m.method).unwrap();
            out.write_u16::<LittleEndian>(DOS_TIME).unwrap();
            out.write_u16::<LittleEndian>(DOS_DATE).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(m.payload.len() as u32).unwrap();
            out.write_u32::<LittleEndian>(m.size).unwrap();
            out.write_u16::<LittleEndian>(m.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.extend_from_slice(m.name.as_bytes());
            out.extend_from_slice(&m.payload);
        }

        let cd_offset = out.len() as u32;
        for (m, offset) in self.members.iter().zip(offsets) {
            out.extend_from_slice(b"PK\x01\x02");
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(m.flags).unwrap();
            out.write_u16::<LittleEndian>(m.method).unwrap();
            out.write_u16::<LittleEndian>(DOS_TIME).unwrap();
            out.write_u16::<LittleEndian>(DOS_DATE).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(m.payload.len() as u32).unwrap();
            out.write_u32::<LittleEndian>(m.size).unwrap();
            out.write_u16::<LittleEndian>(m.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(offset).unwrap();
            out.extend_from_slice(m.name.as_bytes());
        }
        let cd_size = out.len() as u32 - cd_offset;

        out.extend_from_slice(b"PK\x05\x06");
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(self.members.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(self.members.len() as u16).unwrap();
        out.write_u32::<LittleEndian>(cd_size).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out
    }
}
