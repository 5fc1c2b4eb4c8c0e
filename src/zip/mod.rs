//! ZIP archive indexing and extraction.
//!
//! ## Architecture
//!
//! - [`structures`]: Record structs for the format elements (EOCD, central directory headers)
//! - [`directory`]: Loads the central directory and decodes it one record at a time
//! - [`tree`]: The directory tree grown from scanned records
//! - [`resolver`]: Resolves paths, scanning further only when the tree has no answer
//! - [`extractor`]: Reads and decompresses entry payloads
//!
//! ## Supported Features
//!
//! - STORED (no compression) method
//! - DEFLATE compression method
//!
//! ## Limitations
//!
//! - The archive comment must be empty (the EOCD is expected in the last 22 bytes)
//! - No ZIP64, encryption, multi-disk archives or data descriptors
//! - Payload offsets are derived from the central directory; local headers
//!   are assumed to repeat the central name and to carry no extra field

pub mod directory;
pub mod extractor;
pub mod resolver;
pub mod structures;
pub mod tree;

#[cfg(test)]
pub(crate) mod testutil;

pub use directory::{CentralDirectory, DirectoryRecord, RecordSource};
pub use extractor::read_entry;
pub use resolver::{EntryResolver, Expect};
pub use structures::*;
pub use tree::{DirectoryNode, DirectoryTree, FileEntry, FileMeta, Node, NodeId};
