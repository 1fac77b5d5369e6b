//! File filtering chain
//!
//! Every path the walker (or the unpack pipeline) discovers runs through an
//! ordered chain of checkers; the first non-ok outcome wins. Outcomes are a
//! small sum type instead of sentinel errors so callers pattern-match
//! directly on what to do with the entry.

use crate::fileset::FileSet;
use crate::fsys::Fs;

mod binary;
mod ignore;
mod seen;
mod size;

pub use binary::Binary;
pub use ignore::Ignore;
pub use seen::Seen;
pub use size::Size;

/// Decision for a single discovered path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Entry passes; files are collected, directories descended
    Ok,
    /// Drop this entry, continue with siblings
    Skip(String),
    /// Drop this directory and its whole subtree
    Prune(String),
    /// Terminate the entire walk
    Abort(String),
}

impl CheckOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, CheckOutcome::Ok)
    }

    /// The reason attached to a non-ok outcome
    pub fn reason(&self) -> Option<&str> {
        match self {
            CheckOutcome::Ok => None,
            CheckOutcome::Skip(r) | CheckOutcome::Prune(r) | CheckOutcome::Abort(r) => Some(r),
        }
    }
}

/// Everything a checker may look at for one decision
pub struct CheckRequest<'a> {
    /// Filesystem the entry lives in
    pub fs: &'a dyn Fs,
    /// Files collected so far
    pub set: &'a FileSet,
    /// Relative forward-slash path of the entry
    pub path: &'a str,
    /// Whether the entry is a directory
    pub is_dir: bool,
}

/// A single filtering rule
pub trait Checker: Send + Sync {
    fn check(&self, req: &CheckRequest<'_>) -> CheckOutcome;
}

/// Ordered chain of checkers; evaluation stops at the first non-ok outcome
#[derive(Default)]
pub struct Checkers(Vec<Box<dyn Checker>>);

impl Checkers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, checker: impl Checker + 'static) {
        self.0.push(Box::new(checker));
    }

    pub fn with(mut self, checker: impl Checker + 'static) -> Self {
        self.push(checker);
        self
    }

    /// Append every checker from `other`, preserving order
    pub fn extend(&mut self, other: Checkers) {
        self.0.extend(other.0);
    }

    pub fn check(&self, req: &CheckRequest<'_>) -> CheckOutcome {
        for checker in &self.0 {
            let outcome = checker.check(req);
            if !outcome.is_ok() {
                return outcome;
            }
        }
        CheckOutcome::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsys::MemFs;

    struct Always(CheckOutcome);

    impl Checker for Always {
        fn check(&self, _req: &CheckRequest<'_>) -> CheckOutcome {
            self.0.clone()
        }
    }

    #[test]
    fn test_first_non_ok_wins() {
        let chain = Checkers::new()
            .with(Always(CheckOutcome::Ok))
            .with(Always(CheckOutcome::Skip("first".into())))
            .with(Always(CheckOutcome::Abort("second".into())));

        let fs = MemFs::new();
        let set = FileSet::new();
        let req = CheckRequest {
            fs: &fs,
            set: &set,
            path: "x",
            is_dir: false,
        };

        assert_eq!(chain.check(&req), CheckOutcome::Skip("first".into()));
    }

    #[test]
    fn test_empty_chain_passes() {
        let chain = Checkers::new();
        let fs = MemFs::new();
        let set = FileSet::new();
        let req = CheckRequest {
            fs: &fs,
            set: &set,
            path: "x",
            is_dir: false,
        };
        assert!(chain.check(&req).is_ok());
    }
}
