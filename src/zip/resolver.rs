//! Path resolution driving the incremental central directory scan.

use tracing::{debug, trace};

use crate::error::{Result, ZipFsError};

use super::directory::RecordSource;
use super::tree::{DirectoryTree, Node, NodeId};

/// Node type a caller is prepared to accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    File,
    Directory,
    Either,
}

/// Strip leading and trailing separators; the empty string is the root.
pub fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

/// Resolves archive paths to tree nodes, pulling records from `S` only when
/// the tree does not know the answer yet.
pub struct EntryResolver<S> {
    archive: String,
    tree: DirectoryTree,
    /// Remaining records; dropped once everything has been indexed.
    source: Option<S>,
    scanned: usize,
}

impl<S: RecordSource> EntryResolver<S> {
    pub fn new(archive: impl Into<String>) -> Self {
        Self {
            archive: archive.into(),
            tree: DirectoryTree::new(),
            source: None,
            scanned: 0,
        }
    }

    pub fn with_source(archive: impl Into<String>, source: S) -> Self {
        let mut resolver = Self::new(archive);
        resolver.attach(source);
        resolver
    }

    pub fn attach(&mut self, source: S) {
        self.source = Some(source);
    }

    pub fn tree(&self) -> &DirectoryTree {
        &self.tree
    }

    pub fn source_mut(&mut self) -> Option<&mut S> {
        self.source.as_mut()
    }

    /// True once every record has been read into the tree.
    pub fn is_indexed(&self) -> bool {
        self.source.is_none()
    }

    /// Records consumed so far.
    pub fn scanned(&self) -> usize {
        self.scanned
    }

    /// Resolve `path` and check it against `expect`.
    pub fn resolve(&mut self, path: &str, expect: Expect) -> Result<NodeId> {
        let path = normalize(path);
        let id = match self.tree.lookup(path) {
            Some(id) => id,
            None => self.scan_for(path)?,
        };

        match (self.tree.node(id), expect) {
            (Node::Directory(_), Expect::File) => Err(ZipFsError::IsDirectory {
                path: path.to_owned(),
                archive: self.archive.clone(),
            }),
            (Node::File(_), Expect::Directory) => Err(ZipFsError::NotADirectory {
                path: path.to_owned(),
                archive: self.archive.clone(),
            }),
            (Node::File(entry), _) => {
                entry.meta();
                Ok(id)
            }
            (Node::Directory(_), _) => Ok(id),
        }
    }

    /// Read every remaining record into the tree.
    pub fn index_all(&mut self) -> Result<()> {
        while self.pull("")?.is_some() {}
        Ok(())
    }

    fn scan_for(&mut self, path: &str) -> Result<NodeId> {
        while let Some(name) = self.pull(path)? {
            let name = name.trim_end_matches('/');
            if name == path {
                if let Some(id) = self.tree.lookup(path) {
                    return Ok(id);
                }
            } else if name.len() > path.len()
                && name.starts_with(path)
                && name.as_bytes()[path.len()] == b'/'
            {
                // a descendant was indexed, so the requested directory now exists
                if let Some(id) = self.tree.lookup(path) {
                    return Ok(id);
                }
            }
        }

        Err(ZipFsError::NotFound {
            path: path.to_owned(),
            archive: self.archive.clone(),
        })
    }

    /// Insert the next record into the tree and return its name. `None` once
    /// the source is exhausted, at which point it is released.
    fn pull(&mut self, path: &str) -> Result<Option<String>> {
        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };

        let record = match source.next_record() {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(
                    archive = %self.archive,
                    records = self.scanned,
                    "central directory fully indexed"
                );
                self.source = None;
                return Ok(None);
            }
            Err(source) => return Err(ZipFsError::from_zip(source, path, &self.archive)),
        };

        self.scanned += 1;
        if self.tree.insert(&record).is_none() {
            trace!(name = %record.name, "record shadowed by a file ancestor");
        }
        Ok(Some(record.name))
    }
}
