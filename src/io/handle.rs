use std::fs::{File, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, error};

use super::ReadAt;
use crate::config::ZipFsConfig;
use crate::error::{Result, ZipFsError};

/// OS-level identity of a file, used to notice that a path now points at
/// different content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIdentity {
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
    #[cfg(not(unix))]
    len: u64,
    #[cfg(not(unix))]
    modified: Option<std::time::SystemTime>,
}

impl FileIdentity {
    pub fn of(meta: &Metadata) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            Self {
                dev: meta.dev(),
                ino: meta.ino(),
            }
        }

        #[cfg(not(unix))]
        {
            Self {
                len: meta.len(),
                modified: meta.modified().ok(),
            }
        }
    }
}

/// Owner of the archive's file descriptor.
///
/// The descriptor is opened on demand and released once the handle has been
/// idle for the configured period. Eviction is cooperative: nothing closes the
/// file behind the caller's back, the owner calls [`evict_if_idle`] between
/// operations.
///
/// [`evict_if_idle`]: ArchiveHandle::evict_if_idle
pub struct ArchiveHandle {
    path: PathBuf,
    name: String,
    file: Option<File>,
    size: u64,
    /// Identity of the file we were reading when the descriptor was last released.
    identity: Option<FileIdentity>,
    poisoned: bool,
    last_access: Instant,
    idle_timeout: Duration,
}

impl ArchiveHandle {
    pub fn new(path: impl Into<PathBuf>, config: &ZipFsConfig) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self {
            path,
            name,
            file: None,
            size: 0,
            identity: None,
            poisoned: false,
            last_access: Instant::now(),
            idle_timeout: config.idle_timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Archive file name as it appears in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Open the archive unless it already is.
    ///
    /// After an idle close the file must still be the one we indexed; if the
    /// path now resolves to a different file the handle is poisoned and every
    /// later call fails with [`ZipFsError::IdentityMismatch`].
    pub fn ensure_open(&mut self) -> Result<()> {
        if self.poisoned {
            return Err(self.mismatch());
        }
        if self.file.is_some() {
            return Ok(());
        }

        let file = File::open(&self.path).map_err(|e| self.io_error(e))?;
        let meta = file.metadata().map_err(|e| self.io_error(e))?;
        let current = FileIdentity::of(&meta);

        if let Some(previous) = self.identity {
            if previous != current {
                self.poisoned = true;
                error!(archive = %self.name, "mismatch: archive replaced while mounted");
                return Err(self.mismatch());
            }
        }

        debug!(archive = %self.name, size = meta.len(), "archive opened");
        self.size = meta.len();
        self.file = Some(file);
        Ok(())
    }

    /// Record an access; restarts the idle period.
    pub fn touch(&mut self) {
        self.last_access = Instant::now();
    }

    pub fn is_idle(&self, now: Instant) -> bool {
        self.file.is_some() && now.saturating_duration_since(self.last_access) >= self.idle_timeout
    }

    /// Close the descriptor if the idle period has elapsed.
    pub fn evict_if_idle(&mut self, now: Instant) -> Result<bool> {
        if !self.is_idle(now) {
            return Ok(false);
        }
        self.close()?;
        Ok(true)
    }

    /// Release the descriptor, remembering which file it referred to.
    pub fn close(&mut self) -> Result<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        let meta = file.metadata();
        self.release(meta)
    }

    /// Record the descriptor's identity, then drop it. If the identity cannot
    /// be read the descriptor stays open.
    fn release(&mut self, meta: io::Result<Metadata>) -> Result<()> {
        let meta = meta.map_err(|e| self.io_error(e))?;
        self.identity = Some(FileIdentity::of(&meta));
        self.file = None;
        debug!(archive = %self.name, "archive closed");
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> ZipFsError {
        ZipFsError::Io {
            archive: self.name.clone(),
            source,
        }
    }

    fn mismatch(&self) -> ZipFsError {
        ZipFsError::IdentityMismatch {
            archive: self.name.clone(),
        }
    }
}

impl ReadAt for ArchiveHandle {
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let file = self
            .file
            .as_ref()
            .ok_or_else(|| io::Error::other("archive descriptor is closed"))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            file.read_exact_at(buf, offset)
        }

        #[cfg(windows)]
        {
            use std::os::windows::fs::FileExt;
            // seek_read may return short counts
            let mut filled = 0;
            while filled < buf.len() {
                let n = file.seek_read(&mut buf[filled..], offset + filled as u64)?;
                if n == 0 {
                    return Err(io::ErrorKind::UnexpectedEof.into());
                }
                filled += n;
            }
            Ok(())
        }

        #[cfg(not(any(unix, windows)))]
        {
            use std::io::{Read, Seek, SeekFrom};
            let mut file = file;
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(buf)
        }
    }

    fn size(&self) -> u64 {
        self.size
    }
}
