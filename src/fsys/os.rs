//! Real filesystem rooted at a directory

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use super::{DirEntry, EntryKind, Fs, FileMeta};

/// [`Fs`] implementation over a real directory.
///
/// Symlinks are reported as [`EntryKind::Other`] and never followed.
#[derive(Debug, Clone)]
pub struct OsFs {
    root: PathBuf,
}

impl OsFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }
}

fn kind_of(ft: fs::FileType) -> EntryKind {
    if ft.is_file() {
        EntryKind::File
    } else if ft.is_dir() {
        EntryKind::Dir
    } else {
        EntryKind::Other
    }
}

impl Fs for OsFs {
    fn metadata(&self, path: &str) -> io::Result<FileMeta> {
        let meta = fs::symlink_metadata(self.resolve(path))?;
        Ok(FileMeta {
            kind: kind_of(meta.file_type()),
            len: meta.len(),
        })
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(self.resolve(path))? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let kind = kind_of(entry.file_type()?);
            entries.push(DirEntry { name, kind });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(path))
    }

    fn read_prefix(&self, path: &str, limit: usize) -> io::Result<Vec<u8>> {
        let file = fs::File::open(self.resolve(path))?;
        let mut buf = Vec::with_capacity(limit.min(64 * 1024));
        file.take(limit as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn write(&self, path: &str, data: &[u8]) -> io::Result<()> {
        fs::write(self.resolve(path), data)
    }

    fn create_dir_all(&self, path: &str) -> io::Result<()> {
        fs::create_dir_all(self.resolve(path))
    }
}
