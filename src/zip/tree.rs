//! Lazily grown directory tree.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Once a name is
//! bound under a directory it is never rebound, so ids handed out stay valid
//! for the life of the tree.

use std::cell::OnceCell;
use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::directory::DirectoryRecord;
use super::structures::{CompressionMethod, dos_datetime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

#[derive(Debug, Default)]
pub struct DirectoryNode {
    children: HashMap<String, NodeId>,
}

impl DirectoryNode {
    /// Child names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.children.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Metadata decoded on first inspection of a file entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    pub modified: Option<NaiveDateTime>,
    pub size: u64,
}

/// A file as described by its central directory record.
#[derive(Debug)]
pub struct FileEntry {
    pub method: CompressionMethod,
    pub encrypted: bool,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    /// Payload offset within the archive.
    pub data_offset: u64,
    last_mod_time: u16,
    last_mod_date: u16,
    meta: OnceCell<FileMeta>,
}

impl FileEntry {
    pub fn from_record(record: &DirectoryRecord) -> Self {
        let header = &record.header;
        Self {
            method: header.compression_method,
            encrypted: header.is_encrypted(),
            compressed_size: header.compressed_size as u64,
            uncompressed_size: header.uncompressed_size as u64,
            data_offset: header.data_offset(),
            last_mod_time: header.last_mod_time,
            last_mod_date: header.last_mod_date,
            meta: OnceCell::new(),
        }
    }

    /// Decoded timestamp and size, computed once.
    pub fn meta(&self) -> &FileMeta {
        self.meta.get_or_init(|| FileMeta {
            modified: dos_datetime(self.last_mod_date, self.last_mod_time),
            size: self.uncompressed_size,
        })
    }

    pub fn meta_loaded(&self) -> bool {
        self.meta.get().is_some()
    }
}

#[derive(Debug)]
pub enum Node {
    Directory(DirectoryNode),
    File(FileEntry),
}

impl Node {
    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory(_))
    }
}

/// Split `path` into its directory part and leaf name.
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}

fn segments(dir: &str) -> impl Iterator<Item = &str> {
    dir.split('/').filter(|s| !s.is_empty())
}

pub struct DirectoryTree {
    nodes: Vec<Node>,
    /// Directory chain reached by the last walk: segment name and node at
    /// each depth. Sibling lookups reuse the shared prefix.
    chain: Vec<(String, NodeId)>,
}

impl Default for DirectoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::Directory(DirectoryNode::default())],
            chain: Vec::new(),
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        match self.node(parent) {
            Node::Directory(dir) => dir.children.get(name).copied(),
            Node::File(_) => None,
        }
    }

    fn add_child(&mut self, parent: NodeId, name: &str, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        if let Node::Directory(dir) = &mut self.nodes[parent.0] {
            dir.children.insert(name.to_owned(), id);
        }
        id
    }

    /// Walk the directory chain `dir`, starting from the cached chain.
    ///
    /// With `create` missing directories are added. Returns `None` when a
    /// segment is missing (and not created) or names a file.
    pub fn resolve_dir(&mut self, dir: &str, create: bool) -> Option<NodeId> {
        let mut current = NodeId::ROOT;

        for (depth, segment) in segments(dir).enumerate() {
            if let Some((name, id)) = self.chain.get(depth) {
                if name == segment {
                    current = *id;
                    continue;
                }
            }
            self.chain.truncate(depth);

            let next = match self.child(current, segment) {
                Some(id) => id,
                None if create => {
                    self.add_child(current, segment, Node::Directory(DirectoryNode::default()))
                }
                None => return None,
            };
            if !self.node(next).is_dir() {
                return None;
            }

            self.chain.push((segment.to_owned(), next));
            current = next;
        }

        Some(current)
    }

    /// Find an already indexed path. The empty path is the root.
    pub fn lookup(&mut self, path: &str) -> Option<NodeId> {
        if path.is_empty() {
            return Some(NodeId::ROOT);
        }
        let (dir, leaf) = split_path(path);
        let parent = self.resolve_dir(dir, false)?;
        if leaf.is_empty() {
            return Some(parent);
        }
        self.child(parent, leaf)
    }

    /// Add a scanned record, creating its ancestors as needed.
    ///
    /// Returns the node the record names, or `None` when one of its ancestors
    /// is a file. Names already bound keep their existing node.
    pub fn insert(&mut self, record: &DirectoryRecord) -> Option<NodeId> {
        let (dir, leaf) = split_path(&record.name);
        let parent = self.resolve_dir(dir, true)?;
        if leaf.is_empty() {
            return Some(parent);
        }

        match self.child(parent, leaf) {
            Some(existing) => Some(existing),
            None => Some(self.add_child(parent, leaf, Node::File(FileEntry::from_record(record)))),
        }
    }

    #[cfg(test)]
    pub(crate) fn cached_chain(&self) -> Vec<&str> {
        self.chain.iter().map(|(name, _)| name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::structures::CentralDirectoryHeader;

    fn file(name: &str, size: u32) -> DirectoryRecord {
        DirectoryRecord::new(
            name,
            CentralDirectoryHeader {
                uncompressed_size: size,
                compressed_size: size,
                file_name_length: name.len() as u16,
                ..Default::default()
            },
        )
    }

    fn dir(name: &str) -> DirectoryRecord {
        DirectoryRecord::new(name, CentralDirectoryHeader::default())
    }

    #[test]
    fn insert_builds_ancestors() {
        let mut tree = DirectoryTree::new();
        let id = tree.insert(&file("a/b/c.txt", 3)).unwrap();

        let a = tree.child(NodeId::ROOT, "a").unwrap();
        let b = tree.child(a, "b").unwrap();
        assert_eq!(tree.child(b, "c.txt"), Some(id));
        assert!(tree.node(a).is_dir());
        assert!(!tree.node(id).is_dir());
        assert_eq!(tree.lookup("a/b/c.txt"), Some(id));
        assert_eq!(tree.lookup("a/b"), Some(b));
        assert_eq!(tree.lookup(""), Some(NodeId::ROOT));
    }

    #[test]
    fn directory_records_reuse_existing_nodes() {
        let mut tree = DirectoryTree::new();
        tree.insert(&file("a/x", 1)).unwrap();
        let a = tree.lookup("a").unwrap();
        let nodes = tree.len();

        assert_eq!(tree.insert(&dir("a/")), Some(a));
        assert_eq!(tree.len(), nodes);

        // a second record with the same name does not replace the first
        let x = tree.lookup("a/x").unwrap();
        assert_eq!(tree.insert(&file("a/x", 99)), Some(x));
        match tree.node(x) {
            Node::File(entry) => assert_eq!(entry.uncompressed_size, 1),
            Node::Directory(_) => panic!("expected file"),
        }
    }

    #[test]
    fn chain_cache_tracks_last_walk() {
        let mut tree = DirectoryTree::new();
        tree.insert(&file("a/b/one", 1)).unwrap();
        assert_eq!(tree.cached_chain(), ["a", "b"]);

        tree.insert(&file("a/c/two", 1)).unwrap();
        assert_eq!(tree.cached_chain(), ["a", "c"]);

        assert!(tree.lookup("a/b/one").is_some());
        assert_eq!(tree.cached_chain(), ["a", "b"]);

        // failed walk keeps only the prefix that resolved
        assert!(tree.lookup("a/zzz/three").is_none());
        assert_eq!(tree.cached_chain(), ["a"]);
        assert!(tree.lookup("a/c/two").is_some());
    }

    #[test]
    fn file_in_path_stops_the_walk() {
        let mut tree = DirectoryTree::new();
        tree.insert(&file("a", 1)).unwrap();
        assert!(tree.insert(&file("a/b", 1)).is_none());
        assert!(tree.lookup("a/b").is_none());
    }

    #[test]
    fn lists_sorted_children() {
        let mut tree = DirectoryTree::new();
        for name in ["d/z", "d/m/", "d/b", "d/m/deep"] {
            tree.insert(&file(name, 0));
        }
        let d = tree.lookup("d").unwrap();
        match tree.node(d) {
            Node::Directory(dir) => assert_eq!(dir.names(), ["b", "m", "z"]),
            Node::File(_) => panic!("expected directory"),
        }
    }

    #[test]
    fn metadata_is_filled_once() {
        let mut tree = DirectoryTree::new();
        let id = tree.insert(&file("f", 5)).unwrap();
        let Node::File(entry) = tree.node(id) else {
            panic!("expected file");
        };
        assert!(!entry.meta_loaded());
        assert_eq!(entry.meta().size, 5);
        assert!(entry.meta_loaded());
        // default header carries a zero date, which is not a calendar date
        assert!(entry.meta().modified.is_none());
    }
}
