use flate2::read::DeflateDecoder;
use std::io::Read;

use tracing::trace;

use crate::io::ReadAt;

use super::structures::{CompressionMethod, ZipError};
use super::tree::FileEntry;

/// Read and decode the payload of `entry`.
///
/// The payload is located from the central directory alone (see
/// [`CentralDirectoryHeader::data_offset`](super::CentralDirectoryHeader::data_offset)).
/// The decoded length must match the declared uncompressed size.
pub fn read_entry<R: ReadAt + ?Sized>(
    reader: &mut R,
    entry: &FileEntry,
) -> Result<Vec<u8>, ZipError> {
    if entry.encrypted {
        return Err(ZipError::Encrypted);
    }
    if let CompressionMethod::Unknown(method) = entry.method {
        return Err(ZipError::UnsupportedMethod(method));
    }

    entry
        .data_offset
        .checked_add(entry.compressed_size)
        .filter(|end| *end <= reader.size())
        .ok_or(ZipError::Truncated("entry data"))?;

    let mut raw = vec![0u8; entry.compressed_size as usize];
    if !raw.is_empty() {
        reader.read_exact_at(entry.data_offset, &mut raw)?;
    }

    let data = match entry.method {
        CompressionMethod::Stored => raw,
        CompressionMethod::Deflate => {
            // one byte past the declared size is enough to fail the size check
            let mut out = Vec::new();
            DeflateDecoder::new(raw.as_slice())
                .take(entry.uncompressed_size + 1)
                .read_to_end(&mut out)
                .map_err(ZipError::Inflate)?;
            out
        }
        CompressionMethod::Unknown(method) => return Err(ZipError::UnsupportedMethod(method)),
    };

    trace!(
        offset = entry.data_offset,
        compressed = entry.compressed_size,
        size = data.len(),
        "entry read"
    );

    if data.len() as u64 != entry.uncompressed_size {
        return Err(ZipError::SizeMismatch {
            expected: entry.uncompressed_size,
            actual: data.len() as u64,
        });
    }

    Ok(data)
}
