//! In-memory filesystem fixture for tests

use std::collections::{BTreeMap, BTreeSet};
use std::io;

use parking_lot::Mutex;

use super::{DirEntry, EntryKind, Fs, FileMeta};

/// [`Fs`] backed by a map of path to contents.
///
/// Directories exist implicitly for every file ancestor, plus any created
/// explicitly with `create_dir_all`.
#[derive(Debug, Default)]
pub struct MemFs {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

impl Inner {
    fn is_dir(&self, path: &str) -> bool {
        if path.is_empty() {
            return true;
        }
        if self.dirs.contains(path) {
            return true;
        }
        let prefix = format!("{path}/");
        self.files.keys().any(|k| k.starts_with(&prefix))
            || self.dirs.iter().any(|d| d.starts_with(&prefix))
    }
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(path, contents)` pairs
    pub fn with_files<I, P, B>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, B)>,
        P: Into<String>,
        B: Into<Vec<u8>>,
    {
        let fs = Self::new();
        {
            let mut inner = fs.inner.lock();
            for (path, data) in files {
                inner.files.insert(path.into(), data.into());
            }
        }
        fs
    }

    /// Snapshot of all file paths in sorted order
    pub fn paths(&self) -> Vec<String> {
        self.inner.lock().files.keys().cloned().collect()
    }
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no such path: {path:?}"))
}

impl Fs for MemFs {
    fn metadata(&self, path: &str) -> io::Result<FileMeta> {
        let inner = self.inner.lock();
        if let Some(data) = inner.files.get(path) {
            return Ok(FileMeta {
                kind: EntryKind::File,
                len: data.len() as u64,
            });
        }
        if inner.is_dir(path) {
            return Ok(FileMeta {
                kind: EntryKind::Dir,
                len: 0,
            });
        }
        Err(not_found(path))
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let inner = self.inner.lock();
        if !inner.is_dir(path) {
            return Err(not_found(path));
        }

        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };

        let mut names: BTreeMap<String, EntryKind> = BTreeMap::new();
        for key in inner.files.keys().chain(inner.dirs.iter()) {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            match rest.split_once('/') {
                Some((head, _)) => {
                    names.insert(head.to_string(), EntryKind::Dir);
                }
                None => {
                    let kind = if inner.files.contains_key(key) {
                        EntryKind::File
                    } else {
                        EntryKind::Dir
                    };
                    // A dir name may already be recorded from a deeper key
                    names.entry(rest.to_string()).or_insert(kind);
                }
            }
        }

        Ok(names
            .into_iter()
            .map(|(name, kind)| DirEntry { name, kind })
            .collect())
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        self.inner
            .lock()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    fn read_prefix(&self, path: &str, limit: usize) -> io::Result<Vec<u8>> {
        let mut data = self.read(path)?;
        data.truncate(limit);
        Ok(data)
    }

    fn write(&self, path: &str, data: &[u8]) -> io::Result<()> {
        self.inner
            .lock()
            .files
            .insert(path.to_string(), data.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, path: &str) -> io::Result<()> {
        if !path.is_empty() {
            self.inner.lock().dirs.insert(path.to_string());
        }
        Ok(())
    }
}
