//! Filtered walk engine
//!
//! Drives a recursive walk over an [`Fs`], applies the checker chain to
//! every visited entry and collects surviving regular files, up to a hard
//! file-count cap. The walk itself is single-threaded; deterministic
//! output order comes from the case-insensitive sort applied afterwards.

use globset::GlobMatcher;
use tracing::debug;

use crate::checkers::{CheckOutcome, CheckRequest, Checkers, Seen};
use crate::error::WalkError;
use crate::fileset::FileSet;
use crate::fsys::{join_rel, Fs};

/// Walks file systems and filters discovered files through checkers.
///
/// A [`Seen`] checker is always installed first, so walking overlapping
/// patterns into the same walker never duplicates entries.
pub struct Walker {
    checkers: Checkers,
    max_files: usize,
    files: FileSet,
}

impl Walker {
    pub fn new(checks: Checkers, max_files: usize) -> Self {
        let mut checkers = Checkers::new().with(Seen::new());
        checkers.extend(checks);

        Self {
            checkers,
            max_files,
            files: FileSet::new(),
        }
    }

    /// Files collected so far, in discovery order
    pub fn files(&self) -> &FileSet {
        &self.files
    }

    /// Consume the walker, yielding the collected set
    pub fn into_files(self) -> FileSet {
        self.files
    }

    /// Walk the tree under the filesystem root, collecting regular files
    /// that match `pattern` and pass every checker.
    ///
    /// Directories are visited for prune decisions whether or not they
    /// match the pattern; files must match. The walk aborts once the
    /// collected count exceeds the cap.
    pub fn walk(&mut self, fs: &dyn Fs, pattern: &GlobMatcher) -> Result<(), WalkError> {
        self.walk_dir(fs, "", pattern)
    }

    fn walk_dir(
        &mut self,
        fs: &dyn Fs,
        dir: &str,
        pattern: &GlobMatcher,
    ) -> Result<(), WalkError> {
        let entries = fs.read_dir(dir).map_err(|e| WalkError::Io {
            path: dir.to_string(),
            source: e,
        })?;

        for entry in entries {
            let path = join_rel(dir, &entry.name);
            let is_dir = entry.kind.is_dir();

            // Symlinks and other non-regular entries are never packed
            if !is_dir && !entry.kind.is_file() {
                debug!("  - {path:?}: not a regular file");
                continue;
            }

            if !is_dir && !pattern.is_match(&path) {
                continue;
            }

            let outcome = self.checkers.check(&CheckRequest {
                fs,
                set: &self.files,
                path: &path,
                is_dir,
            });

            match outcome {
                CheckOutcome::Abort(reason) => {
                    debug!("  - {path:?}: aborting: {reason}");
                    return Err(WalkError::Aborted { reason });
                }
                CheckOutcome::Prune(reason) => {
                    debug!("  - {path:?}: pruned: {reason}");
                    continue;
                }
                CheckOutcome::Skip(reason) => {
                    debug!("  - {path:?}: skipped: {reason}");
                    continue;
                }
                CheckOutcome::Ok => {}
            }

            if is_dir {
                self.walk_dir(fs, &path, pattern)?;
            } else {
                self.files.insert(path.clone());
                debug!("  - {path:?}: included");

                if self.files.len() > self.max_files {
                    return Err(WalkError::Aborted {
                        reason: format!("max files reached: {}", self.max_files),
                    });
                }
            }
        }

        Ok(())
    }
}
