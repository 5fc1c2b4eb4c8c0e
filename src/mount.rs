//! Routing between a mounted archive and the host filesystem.
//!
//! An archive `dir/app.zip` is mounted at `dir`: a path under `dir` is looked
//! up inside the archive, anything else goes to the real filesystem.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::config::ZipFsConfig;
use crate::error::{Result, ZipFsError};
use crate::text::{TextEncoding, UnknownEncoding};
use crate::vfs::{Metadata, ZipFs};

/// Absolute archive path for a command-line argument; `.zip` is appended
/// when the argument has no extension.
pub fn resolve_archive_file(arg: impl AsRef<Path>) -> io::Result<PathBuf> {
    let mut path = std::path::absolute(arg.as_ref())?;
    if path.extension().is_none() {
        path.set_extension("zip");
    }
    Ok(path)
}

/// Forward slashes, no `\\?\` verbatim prefix.
fn to_slashes(path: &str) -> String {
    path.strip_prefix(r"\\?\").unwrap_or(path).replace('\\', "/")
}

pub struct Mount {
    root: String,
    fs: ZipFs,
}

impl Mount {
    /// Mount `archive` at the directory containing it.
    pub fn new(archive: impl AsRef<Path>, config: ZipFsConfig) -> Result<Self> {
        let archive = archive.as_ref();
        let root = archive.parent().unwrap_or_else(|| Path::new(""));
        Ok(Self {
            root: to_slashes(&root.to_string_lossy()),
            fs: ZipFs::open(archive, config)?,
        })
    }

    /// Mount root with forward slashes.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn archive(&mut self) -> &mut ZipFs {
        &mut self.fs
    }

    /// Archive-relative path if `path` lies under the mount root.
    pub fn archive_path(&self, path: &str) -> Option<String> {
        let path = to_slashes(path);
        let rest = path.strip_prefix(self.root.as_str())?;
        if rest.is_empty() {
            return Some(String::new());
        }
        rest.strip_prefix('/').map(str::to_owned)
    }

    pub fn exists(&mut self, path: &str) -> bool {
        match self.archive_path(path) {
            Some(sub) => self.fs.exists(&sub),
            None => Path::new(path).exists(),
        }
    }

    pub fn read_dir(&mut self, path: &str) -> Result<Vec<String>> {
        match self.archive_path(path) {
            Some(sub) => self.fs.read_dir(&sub),
            None => {
                let mut names = fs::read_dir(path)
                    .and_then(|entries| {
                        entries
                            .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
                            .collect::<io::Result<Vec<_>>>()
                    })
                    .map_err(|e| host(path, e))?;
                names.sort();
                Ok(names)
            }
        }
    }

    pub fn read_file(&mut self, path: &str) -> Result<Vec<u8>> {
        match self.archive_path(path) {
            Some(sub) => self.fs.read_file(&sub),
            None => fs::read(path).map_err(|e| host(path, e)),
        }
    }

    pub fn read_to_string(&mut self, path: &str, encoding: &str) -> Result<String> {
        match self.archive_path(path) {
            Some(sub) => self.fs.read_to_string(&sub, encoding),
            None => {
                let bytes = fs::read(path).map_err(|e| host(path, e))?;
                let encoding: TextEncoding = encoding.parse().map_err(|e: UnknownEncoding| {
                    host(path, io::Error::new(io::ErrorKind::Unsupported, e))
                })?;
                Ok(encoding.decode(&bytes))
            }
        }
    }

    pub fn stat(&mut self, path: &str) -> Result<Metadata> {
        match self.archive_path(path) {
            Some(sub) => self.fs.stat(&sub),
            None => {
                let meta = fs::metadata(path).map_err(|e| host(path, e))?;
                let modified = meta
                    .modified()
                    .ok()
                    .map(|t| DateTime::<Local>::from(t).naive_local());
                let size = if meta.is_dir() { 0 } else { meta.len() };
                Ok(Metadata::new(meta.is_dir(), size, modified))
            }
        }
    }

    pub fn canonicalize(&self, path: &str) -> Result<String> {
        match self.archive_path(path) {
            Some(_) => Ok(path.to_owned()),
            None => fs::canonicalize(path)
                .map(|p| p.to_string_lossy().into_owned())
                .map_err(|e| host(path, e)),
        }
    }
}

fn host(path: &str, source: io::Error) -> ZipFsError {
    ZipFsError::Host {
        path: path.to_owned(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::testutil::ArchiveBuilder;

    fn mounted() -> (tempfile::TempDir, Mount) {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("app.zip");
        fs::write(
            &archive,
            ArchiveBuilder::new()
                .stored("app.js", b"main()")
                .deflated("lib/util.js", b"exports.x = 1")
                .build(),
        )
        .unwrap();
        fs::write(dir.path().join("outside.txt"), b"host").unwrap();
        let mount = Mount::new(&archive, ZipFsConfig::default()).unwrap();
        (dir, mount)
    }

    #[test]
    fn membership_follows_root_prefix() {
        let (_dir, mount) = mounted();
        let root = mount.root().to_owned();

        assert_eq!(mount.archive_path(&root), Some(String::new()));
        assert_eq!(mount.archive_path(&format!("{root}/lib/util.js")), Some("lib/util.js".into()));
        assert_eq!(mount.archive_path(&format!("{root}x/lib")), None);
        assert_eq!(mount.archive_path("/elsewhere/app.js"), None);
        assert_eq!(
            mount.archive_path(&format!(r"\\?\{}\lib", root.replace('/', "\\"))),
            Some("lib".into())
        );
    }

    #[test]
    fn routes_reads() {
        let (dir, mut mount) = mounted();
        let root = mount.root().to_owned();

        assert_eq!(mount.read_file(&format!("{root}/app.js")).unwrap(), b"main()");
        assert_eq!(
            mount.read_to_string(&format!("{root}/lib/util.js"), "utf8").unwrap(),
            "exports.x = 1"
        );
        assert!(mount.stat(&format!("{root}/lib")).unwrap().is_dir());
        let script = format!("{root}/app.js");
        assert_eq!(mount.canonicalize(&script).unwrap(), script);

        // the archive shadows the directory it lives in
        assert!(!mount.exists(&format!("{root}/outside.txt")));

        let host_dir = dir.path().parent().unwrap().to_string_lossy().into_owned();
        assert!(mount.exists(&host_dir));
        assert!(mount.stat(&host_dir).unwrap().is_dir());
    }

    #[test]
    fn resolves_archive_argument() {
        let path = resolve_archive_file("bundle").unwrap();
        assert!(path.is_absolute());
        assert_eq!(path.extension().unwrap(), "zip");

        let path = resolve_archive_file("bundle.app").unwrap();
        assert_eq!(path.extension().unwrap(), "app");
    }
}
