//! Gitignore-rule filtering

use super::{CheckOutcome, CheckRequest, Checker};
use crate::patterns::IgnoreMatcher;

/// Applies a compiled gitignore-style rule set.
///
/// A matching directory prunes its whole subtree; a matching file is
/// skipped on its own. The matched rule is carried in the reason for
/// dry-run diagnostics.
pub struct Ignore {
    matcher: IgnoreMatcher,
}

impl Ignore {
    pub fn new(matcher: IgnoreMatcher) -> Self {
        Self { matcher }
    }
}

impl Checker for Ignore {
    fn check(&self, req: &CheckRequest<'_>) -> CheckOutcome {
        match self.matcher.ignored(req.path, req.is_dir) {
            Some(rule) => {
                let reason = format!("in ignore patterns ({rule:?})");
                if req.is_dir {
                    CheckOutcome::Prune(reason)
                } else {
                    CheckOutcome::Skip(reason)
                }
            }
            None => CheckOutcome::Ok,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fileset::FileSet;
    use crate::fsys::MemFs;
    use crate::patterns::Patterns;

    fn check(ignore: &Ignore, path: &str, is_dir: bool) -> CheckOutcome {
        let fs = MemFs::new();
        let set = FileSet::new();
        ignore.check(&CheckRequest {
            fs: &fs,
            set: &set,
            path,
            is_dir,
        })
    }

    #[test]
    fn test_dir_match_prunes() {
        let matcher = Patterns::new([".git/"]).build_matcher().unwrap();
        let ignore = Ignore::new(matcher);

        assert!(matches!(check(&ignore, ".git", true), CheckOutcome::Prune(_)));
        assert!(check(&ignore, "src", true).is_ok());
    }

    #[test]
    fn test_file_match_skips() {
        let matcher = Patterns::new(["*.log"]).build_matcher().unwrap();
        let ignore = Ignore::new(matcher);

        assert!(matches!(
            check(&ignore, "debug.log", false),
            CheckOutcome::Skip(_)
        ));
        assert!(check(&ignore, "main.rs", false).is_ok());
    }

    #[test]
    fn test_negation_readmits() {
        let matcher = Patterns::new(["*.log", "!keep.log"]).build_matcher().unwrap();
        let ignore = Ignore::new(matcher);

        assert!(matches!(
            check(&ignore, "other.log", false),
            CheckOutcome::Skip(_)
        ));
        assert!(check(&ignore, "keep.log", false).is_ok());
    }

    #[test]
    fn test_reason_names_rule() {
        let matcher = Patterns::new(["*.tmp"]).build_matcher().unwrap();
        let ignore = Ignore::new(matcher);

        let outcome = check(&ignore, "x.tmp", false);
        assert!(outcome.reason().unwrap().contains("*.tmp"));
    }
}
