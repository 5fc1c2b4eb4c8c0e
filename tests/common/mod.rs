#![allow(dead_code)]

use std::path::{Path, PathBuf};

#[path = "../../src/zip/testutil.rs"]
mod testutil;

use testutil::ArchiveBuilder;

/// Archive written to disk; the central directory lists members in
/// insertion order.
#[derive(Default)]
pub struct Fixture(ArchiveBuilder);

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dir(self, name: &str) -> Self {
        Self(self.0.directory(name))
    }

    pub fn stored(self, name: &str, content: &[u8]) -> Self {
        Self(self.0.stored(name, content))
    }

    pub fn deflated(self, name: &str, content: &[u8]) -> Self {
        Self(self.0.deflated(name, content))
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.0.build()
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.bytes()).unwrap();
    }

    /// Write into `dir` as `name`, returning the archive path.
    pub fn write_in(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        self.write_to(&path);
        path
    }
}

/// The two-file archive used across the end-to-end tests.
pub fn sample() -> Fixture {
    Fixture::new()
        .dir("a/")
        .stored("a/b.txt", b"hi")
        .deflated("a/c.json", b"{\"x\":1}")
}
