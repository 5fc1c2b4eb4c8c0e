//! # zipvfs
//!
//! Read-only filesystem access to the contents of a single ZIP archive,
//! without extracting it.
//!
//! The archive is indexed lazily: the central directory bytes are loaded once,
//! but records are decoded only until the requested path turns up. Paths seen
//! once are answered from an in-memory directory tree afterwards. The file
//! descriptor is released after a quiet period and reopened on demand, with a
//! check that the archive file was not replaced in between.
//!
//! ## Features
//!
//! - Directory listing, existence checks, `stat` and whole-file reads
//! - STORED and DEFLATE entries, optional text decoding
//! - Idle descriptor release with file identity verification on reopen
//! - [`Mount`] routing between archive paths and the host filesystem
//!
//! ## Example
//!
//! ```no_run
//! use zipvfs::{ZipFs, ZipFsConfig};
//!
//! fn main() -> zipvfs::Result<()> {
//!     let mut fs = ZipFs::open("app.zip", ZipFsConfig::default())?;
//!
//!     if fs.exists("a/c.json") {
//!         let meta = fs.stat("a/c.json")?;
//!         println!("{} bytes", meta.len());
//!         println!("{}", fs.read_to_string("a/c.json", "utf8")?);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod mount;
pub mod text;
pub mod vfs;
pub mod zip;

pub use cli::Cli;
pub use config::{IdentityPolicy, ZipFsConfig};
pub use error::{ErrorKind, Result, ZipFsError};
pub use io::{ArchiveHandle, ReadAt};
pub use mount::{Mount, resolve_archive_file};
pub use text::TextEncoding;
pub use vfs::{Metadata, ZipFs};
