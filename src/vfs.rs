//! Filesystem-style access to one archive.

use std::path::Path;
use std::time::Instant;

use chrono::NaiveDateTime;
use tracing::{debug, error};

use crate::config::{IdentityPolicy, ZipFsConfig};
use crate::error::{Result, ZipFsError};
use crate::io::ArchiveHandle;
use crate::text::{TextEncoding, UnknownEncoding};
use crate::zip::resolver::normalize;
use crate::zip::{CentralDirectory, EntryResolver, Expect, Node, RecordSource, read_entry};

/// Result of [`ZipFs::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    is_dir: bool,
    size: u64,
    modified: Option<NaiveDateTime>,
}

impl Metadata {
    pub(crate) fn new(is_dir: bool, size: u64, modified: Option<NaiveDateTime>) -> Self {
        Self {
            is_dir,
            size,
            modified,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    pub fn is_file(&self) -> bool {
        !self.is_dir
    }

    /// Uncompressed size; zero for directories.
    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Last modification time as recorded in the archive (local time, no zone).
    pub fn modified(&self) -> Option<NaiveDateTime> {
        self.modified
    }
}

/// A mounted archive.
///
/// All operations are synchronous and take `&mut self`: the archive state
/// (descriptor, scan cursor, tree) is meant for one thread. Hosts that share
/// it across threads must serialize calls themselves, e.g. behind a `Mutex`.
///
/// ## Example
///
/// ```no_run
/// use zipvfs::{ZipFs, ZipFsConfig};
///
/// fn main() -> zipvfs::Result<()> {
///     let mut fs = ZipFs::open("app.zip", ZipFsConfig::default())?;
///     for name in fs.read_dir("lib")? {
///         println!("{name}");
///     }
///     let main = fs.read_to_string("lib/main.js", "utf8")?;
///     println!("{} bytes", main.len());
///     Ok(())
/// }
/// ```
pub struct ZipFs {
    handle: ArchiveHandle,
    resolver: EntryResolver<CentralDirectory>,
    loaded: bool,
    config: ZipFsConfig,
}

impl ZipFs {
    /// Mount the archive at `path`.
    ///
    /// The trailer and central directory bytes are read immediately so that a
    /// file that is not an archive fails here; records are decoded lazily.
    pub fn open(path: impl AsRef<Path>, config: ZipFsConfig) -> Result<Self> {
        let handle = ArchiveHandle::new(path.as_ref(), &config);
        let resolver = EntryResolver::new(handle.name());
        let mut fs = Self {
            handle,
            resolver,
            loaded: false,
            config,
        };
        fs.begin()?;
        fs.handle.touch();
        Ok(fs)
    }

    pub fn path(&self) -> &Path {
        self.handle.path()
    }

    pub fn config(&self) -> &ZipFsConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    /// True once every central directory record has been indexed.
    pub fn is_fully_indexed(&self) -> bool {
        self.loaded && self.resolver.is_indexed()
    }

    /// Whether `path` exists in the archive. Never fails.
    pub fn exists(&mut self, path: &str) -> bool {
        self.run(|fs| fs.resolver.resolve(path, Expect::Either)).is_ok()
    }

    /// Sorted names of the immediate children of directory `path`.
    ///
    /// Listing has to be complete whatever order the archive stores its
    /// records in, so this indexes the rest of the central directory first.
    pub fn read_dir(&mut self, path: &str) -> Result<Vec<String>> {
        self.run(|fs| {
            fs.resolver.resolve(path, Expect::Directory)?;
            fs.resolver.index_all()?;
            let id = fs.resolver.resolve(path, Expect::Directory)?;
            match fs.resolver.tree().node(id) {
                Node::Directory(dir) => Ok(dir.names()),
                Node::File(_) => Err(ZipFsError::NotADirectory {
                    path: normalize(path).to_owned(),
                    archive: fs.handle.name().to_owned(),
                }),
            }
        })
    }

    /// Whole, decompressed contents of file `path`.
    pub fn read_file(&mut self, path: &str) -> Result<Vec<u8>> {
        self.run(|fs| {
            let id = fs.resolver.resolve(path, Expect::File)?;
            let Node::File(entry) = fs.resolver.tree().node(id) else {
                return Err(ZipFsError::IsDirectory {
                    path: normalize(path).to_owned(),
                    archive: fs.handle.name().to_owned(),
                });
            };
            read_entry(&mut fs.handle, entry)
                .map_err(|e| ZipFsError::from_zip(e, path, fs.handle.name()))
        })
    }

    /// Contents of file `path` decoded with the named text encoding.
    ///
    /// The path is resolved first, so lookup errors win over a bad encoding.
    pub fn read_to_string(&mut self, path: &str, encoding: &str) -> Result<String> {
        let bytes = self.read_file(path)?;
        let encoding: TextEncoding = encoding.parse().map_err(|e: UnknownEncoding| {
            ZipFsError::Unsupported {
                path: normalize(path).to_owned(),
                archive: self.handle.name().to_owned(),
                reason: e.to_string(),
            }
        })?;
        Ok(encoding.decode(&bytes))
    }

    pub fn stat(&mut self, path: &str) -> Result<Metadata> {
        self.run(|fs| {
            let id = fs.resolver.resolve(path, Expect::Either)?;
            Ok(match fs.resolver.tree().node(id) {
                Node::Directory(_) => Metadata::new(true, 0, None),
                Node::File(entry) => {
                    let meta = entry.meta();
                    Metadata::new(false, meta.size, meta.modified)
                }
            })
        })
    }

    /// Archive contents are already canonical; the path is returned as is.
    pub fn canonicalize(&self, path: &str) -> String {
        path.to_owned()
    }

    pub async fn read_dir_async(&mut self, path: &str) -> Result<Vec<String>> {
        self.read_dir(path)
    }

    pub async fn read_file_async(&mut self, path: &str) -> Result<Vec<u8>> {
        self.read_file(path)
    }

    pub async fn read_to_string_async(&mut self, path: &str, encoding: &str) -> Result<String> {
        self.read_to_string(path, encoding)
    }

    pub async fn stat_async(&mut self, path: &str) -> Result<Metadata> {
        self.stat(path)
    }

    /// Release the descriptor if the archive has been idle long enough.
    ///
    /// Runs automatically before every operation; hosts with an event loop
    /// may also call it from there to free the descriptor sooner.
    pub fn evict_if_idle(&mut self) -> Result<bool> {
        let evicted = self.handle.evict_if_idle(Instant::now())?;
        if evicted {
            if let Some(cd) = self.resolver.source_mut() {
                cd.compact();
            }
            debug!(archive = %self.handle.name(), "idle archive released");
        }
        Ok(evicted)
    }

    /// Release the descriptor now. The next operation reopens it.
    pub fn close(&mut self) -> Result<()> {
        self.handle.close()?;
        if let Some(cd) = self.resolver.source_mut() {
            cd.compact();
        }
        Ok(())
    }

    /// Cooperative eviction, then make sure the archive is open and indexed
    /// far enough to start resolving.
    fn begin(&mut self) -> Result<()> {
        let prepared = self.evict_if_idle().and_then(|_| self.handle.ensure_open());
        if let Err(err) = prepared {
            return Err(self.escalate(err));
        }

        if !self.loaded {
            let cd = CentralDirectory::load(&mut self.handle)
                .map_err(|e| ZipFsError::from_zip(e, "", self.handle.name()))?;
            self.resolver.attach(cd);
            self.loaded = true;
        }
        Ok(())
    }

    fn run<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.begin()?;
        let result = op(self);
        self.handle.touch();
        result
    }

    fn escalate(&self, err: ZipFsError) -> ZipFsError {
        if err.is_fatal() && self.config.identity_policy == IdentityPolicy::Exit {
            error!(archive = %self.handle.name(), "{err}; terminating");
            std::process::exit(1);
        }
        err
    }
}
