//! Central directory loading and incremental record decoding.
//!
//! The whole central directory is read into memory once, but records are
//! decoded one at a time as the resolver asks for them. The cursor only moves
//! forward; a consumed prefix can be dropped ([`CentralDirectory::compact`])
//! without changing the cursor's logical position.

use tracing::{debug, trace};

use crate::io::ReadAt;

use super::structures::{CentralDirectoryHeader, EndOfCentralDirectory, ZipError};

/// One decoded central directory record.
#[derive(Debug, Clone)]
pub struct DirectoryRecord {
    pub name: String,
    pub header: CentralDirectoryHeader,
}

impl DirectoryRecord {
    pub fn new(name: impl Into<String>, header: CentralDirectoryHeader) -> Self {
        Self {
            name: name.into(),
            header,
        }
    }

    /// Directory records name their path with a trailing separator.
    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }
}

/// Anything that hands out directory records in archive order.
pub trait RecordSource {
    /// Decode the next record, or `None` once the directory is exhausted.
    fn next_record(&mut self) -> Result<Option<DirectoryRecord>, ZipError>;

    /// Drop already consumed bytes if that reclaims a worthwhile amount.
    fn compact(&mut self) {}
}

/// Raw central directory bytes plus a monotonic scan cursor.
pub struct CentralDirectory {
    data: Vec<u8>,
    /// Cursor into `data`.
    pos: usize,
    /// Logical offset of `data[0]` within the full directory.
    base: u64,
}

impl CentralDirectory {
    /// Read the end-of-directory trailer and load the central directory.
    ///
    /// The archive comment is assumed to be empty, so the trailer is expected
    /// in the last 22 bytes of the file.
    pub fn load<R: ReadAt + ?Sized>(reader: &mut R) -> Result<Self, ZipError> {
        let size = reader.size();
        if size < EndOfCentralDirectory::SIZE as u64 {
            return Err(ZipError::Truncated("EOCD"));
        }

        let mut trailer = [0u8; EndOfCentralDirectory::SIZE];
        reader.read_exact_at(size - EndOfCentralDirectory::SIZE as u64, &mut trailer)?;
        let eocd = EndOfCentralDirectory::from_bytes(&trailer)?;

        let cd_offset = eocd.cd_offset as u64;
        let cd_size = eocd.cd_size as u64;
        if cd_offset + cd_size > size - EndOfCentralDirectory::SIZE as u64 {
            return Err(ZipError::Truncated("central directory"));
        }

        let mut data = vec![0u8; cd_size as usize];
        reader.read_exact_at(cd_offset, &mut data)?;
        debug!(
            entries = eocd.total_entries,
            bytes = cd_size,
            offset = cd_offset,
            "central directory loaded"
        );

        Ok(Self::from_bytes(data))
    }

    /// Wrap already loaded central directory bytes.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Logical cursor position, unaffected by compaction.
    pub fn position(&self) -> u64 {
        self.base + self.pos as u64
    }

    /// Bytes currently held in memory.
    pub fn buffered(&self) -> usize {
        self.data.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }
}

impl RecordSource for CentralDirectory {
    fn next_record(&mut self) -> Result<Option<DirectoryRecord>, ZipError> {
        if self.is_exhausted() {
            return Ok(None);
        }

        let rest = &self.data[self.pos..];
        let header = CentralDirectoryHeader::from_bytes(rest)?;
        let len = header.record_len();
        if rest.len() < len {
            return Err(ZipError::Truncated("CDFH"));
        }

        let name_end = CentralDirectoryHeader::SIZE + header.file_name_length as usize;
        let name =
            String::from_utf8_lossy(&rest[CentralDirectoryHeader::SIZE..name_end]).into_owned();
        trace!(name = %name, position = self.position(), "central directory record");

        self.pos += len;
        Ok(Some(DirectoryRecord::new(name, header)))
    }

    fn compact(&mut self) {
        if self.pos * 2 <= self.data.len() {
            return;
        }
        debug!(
            dropped = self.pos,
            kept = self.data.len() - self.pos,
            "central directory compacted"
        );
        self.data.drain(..self.pos);
        self.data.shrink_to_fit();
        self.base += self.pos as u64;
        self.pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::testutil::ArchiveBuilder;

    fn names(cd: &mut CentralDirectory) -> Vec<String> {
        let mut names = Vec::new();
        while let Some(record) = cd.next_record().unwrap() {
            names.push(record.name);
        }
        names
    }

    #[test]
    fn loads_and_walks_records_in_order() {
        let mut archive = ArchiveBuilder::new()
            .directory("a/")
            .stored("a/b.txt", b"hi")
            .deflated("a/c.json", b"{\"x\":1}")
            .build();

        let mut cd = CentralDirectory::load(&mut archive).unwrap();
        assert_eq!(cd.position(), 0);
        assert_eq!(names(&mut cd), ["a/", "a/b.txt", "a/c.json"]);
        assert!(cd.is_exhausted());
        assert!(cd.next_record().unwrap().is_none());
    }

    #[test]
    fn rejects_missing_trailer() {
        let mut archive = ArchiveBuilder::new().stored("x", b"x").build();
        let len = archive.len();
        archive[len - 22] = b'X';
        assert!(matches!(
            CentralDirectory::load(&mut archive),
            Err(ZipError::Signature("EOCD"))
        ));

        let mut tiny = vec![0u8; 10];
        assert!(CentralDirectory::load(&mut tiny).is_err());
    }

    #[test]
    fn bad_record_signature_stops_the_scan() {
        let archive = ArchiveBuilder::new().stored("a", b"1").stored("b", b"2").build();
        let mut cd = CentralDirectory::load(&mut archive.clone()).unwrap();
        let first = cd.next_record().unwrap().unwrap();

        // corrupt the second record in a fresh copy
        let mut data = cd.data.clone();
        let second = first.header.record_len();
        data[second] = 0;
        let mut broken = CentralDirectory::from_bytes(data);
        broken.next_record().unwrap();
        assert!(matches!(broken.next_record(), Err(ZipError::Signature("CDFH"))));
        assert!(matches!(broken.next_record(), Err(ZipError::Signature("CDFH"))));
    }

    #[test]
    fn compaction_keeps_logical_position() {
        let mut archive = ArchiveBuilder::new()
            .stored("one", b"1")
            .stored("two", b"2")
            .stored("three", b"3")
            .build();
        let mut cd = CentralDirectory::load(&mut archive).unwrap();
        let total = cd.buffered();

        let first = cd.next_record().unwrap().unwrap();
        cd.compact();
        // less than half consumed, nothing dropped
        assert_eq!(cd.buffered(), total);

        cd.next_record().unwrap();
        let before = cd.position();
        cd.compact();
        assert_eq!(cd.position(), before);
        assert!(cd.buffered() < total);
        assert_eq!(cd.buffered() as u64, total as u64 - before);
        assert!(first.header.record_len() > 0);

        assert_eq!(cd.next_record().unwrap().unwrap().name, "three");
        assert!(cd.next_record().unwrap().is_none());
    }
}
