use byteorder::{LittleEndian, ReadBytesExt};
use chrono::{NaiveDate, NaiveDateTime};
use std::io::{self, Cursor};

use thiserror::Error;

/// Format-level failure while decoding archive records or payloads.
#[derive(Debug, Error)]
pub enum ZipError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0} invalid")]
    Signature(&'static str),

    #[error("{0} truncated")]
    Truncated(&'static str),

    #[error("method not implemented: {0}")]
    UnsupportedMethod(u16),

    #[error("encrypted entry")]
    Encrypted,

    #[error("inflate failed: {0}")]
    Inflate(io::Error),

    #[error("size error: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
}

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMethod {
    #[default]
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// End of Central Directory (EOCD) - 22 bytes, no archive comment.
///
/// | offset | size | field                          |
/// |-------:|-----:|--------------------------------|
/// |      0 |    4 | signature `PK\x05\x06`         |
/// |      4 |    2 | number of this disk            |
/// |      6 |    2 | disk where central dir starts  |
/// |      8 |    2 | records on this disk           |
/// |     10 |    2 | total records                  |
/// |     12 |    4 | size of central directory      |
/// |     16 |    4 | offset of central directory    |
/// |     20 |    2 | comment length                 |
#[derive(Debug, Clone)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> Result<Self, ZipError> {
        if data.len() < Self::SIZE {
            return Err(ZipError::Truncated("EOCD"));
        }

        if &data[0..4] != Self::SIGNATURE {
            return Err(ZipError::Signature("EOCD"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 byte fixed region.
///
/// | offset | size | field                    |
/// |-------:|-----:|--------------------------|
/// |      0 |    4 | signature `PK\x01\x02`   |
/// |      4 |    2 | version made by          |
/// |      6 |    2 | version needed           |
/// |      8 |    2 | general purpose flags    |
/// |     10 |    2 | compression method       |
/// |     12 |    2 | last modified time (DOS) |
/// |     14 |    2 | last modified date (DOS) |
/// |     16 |    4 | CRC-32                   |
/// |     20 |    4 | compressed size          |
/// |     24 |    4 | uncompressed size        |
/// |     28 |    2 | file name length         |
/// |     30 |    2 | extra field length       |
/// |     32 |    2 | file comment length      |
/// |     34 |    2 | disk number start        |
/// |     36 |    2 | internal attributes      |
/// |     38 |    4 | external attributes      |
/// |     42 |    4 | local header offset      |
///
/// The name, extra field and comment follow in that order.
#[derive(Debug, Clone, Default)]
pub struct CentralDirectoryHeader {
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
    pub file_comment_length: u16,
    pub lfh_offset: u32,
}

impl CentralDirectoryHeader {
    pub const SIGNATURE: &'static [u8] = b"PK\x01\x02";
    pub const SIZE: usize = 46;

    /// Flag bit 0: entry is encrypted.
    pub const FLAG_ENCRYPTED: u16 = 0x0001;

    pub fn from_bytes(data: &[u8]) -> Result<Self, ZipError> {
        if data.len() < 4 || &data[0..4] != Self::SIGNATURE {
            return Err(ZipError::Signature("CDFH"));
        }
        if data.len() < Self::SIZE {
            return Err(ZipError::Truncated("CDFH"));
        }

        let mut cursor = Cursor::new(&data[4..Self::SIZE]);
        let _version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let compressed_size = cursor.read_u32::<LittleEndian>()?;
        let uncompressed_size = cursor.read_u32::<LittleEndian>()?;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let _external_attrs = cursor.read_u32::<LittleEndian>()?;
        let lfh_offset = cursor.read_u32::<LittleEndian>()?;

        Ok(Self {
            flags,
            compression_method: CompressionMethod::from_u16(compression_method),
            last_mod_time,
            last_mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name_length,
            extra_field_length,
            file_comment_length,
            lfh_offset,
        })
    }

    /// Full on-disk length of this record, variable regions included.
    pub fn record_len(&self) -> usize {
        Self::SIZE
            + self.file_name_length as usize
            + self.extra_field_length as usize
            + self.file_comment_length as usize
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags & Self::FLAG_ENCRYPTED != 0
    }

    /// Where the entry payload starts.
    ///
    /// Assumes the local header repeats the central name length and carries
    /// no extra field.
    pub fn data_offset(&self) -> u64 {
        self.lfh_offset as u64 + LFH_SIZE as u64 + self.file_name_length as u64
    }
}

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIZE: usize = 30;

/// Parse a DOS date to (year, month, day)
pub fn dos_date(date: u16) -> (u16, u8, u8) {
    let day = (date & 0x1F) as u8;
    let month = ((date >> 5) & 0x0F) as u8;
    let year = ((date >> 9) & 0x7F) + 1980;
    (year, month, day)
}

/// Parse a DOS time to (hour, minute, second)
pub fn dos_time(time: u16) -> (u8, u8, u8) {
    let second = ((time & 0x1F) * 2) as u8;
    let minute = ((time >> 5) & 0x3F) as u8;
    let hour = ((time >> 11) & 0x1F) as u8;
    (hour, minute, second)
}

/// Combine DOS date and time fields. `None` for out-of-range values.
pub fn dos_datetime(date: u16, time: u16) -> Option<NaiveDateTime> {
    let (year, month, day) = dos_date(date);
    let (hour, minute, second) = dos_time(time);
    NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)?.and_hms_opt(
        hour as u32,
        minute as u32,
        second as u32,
    )
}
