//! Path and pattern utilities
//!
//! Search patterns are forward-slash paths or globs (`*`, `?`, `[`, `{`),
//! never absolute and never containing a `..` segment. Plain directory
//! paths are normalized into `**`-style recursive globs before walking.
//! Ignore patterns compile into a gitignore-style matcher.

use globset::{GlobBuilder, GlobMatcher};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::Match;

use crate::error::PatternError;
use crate::fsys::Fs;

/// A collection of path and gitignore-style patterns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patterns(Vec<String>);

impl Patterns {
    pub fn new(patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(patterns.into_iter().map(Into::into).collect())
    }

    pub fn push(&mut self, pattern: impl Into<String>) {
        self.0.push(pattern.into());
    }

    pub fn extend(&mut self, other: Patterns) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drop empty and whitespace-only patterns
    pub fn trim_empty(self) -> Self {
        Self(self.0.into_iter().filter(|p| !p.trim().is_empty()).collect())
    }

    /// Validate every pattern in the collection
    pub fn validate(&self) -> Result<(), PatternError> {
        self.0.iter().try_for_each(|p| validate(p))
    }

    /// Normalize every pattern against the walk root
    pub fn normalized(&self, fs: &dyn Fs) -> Self {
        Self(self.0.iter().map(|p| normalize(p, fs)).collect())
    }

    /// Compile into a gitignore-style matcher
    pub fn build_matcher(&self) -> Result<IgnoreMatcher, PatternError> {
        IgnoreMatcher::compile(self.iter())
    }
}

impl<S: Into<String>> FromIterator<S> for Patterns {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// Reject patterns containing `..` segments or absolute paths
pub fn validate(pattern: &str) -> Result<(), PatternError> {
    let slashed = pattern.replace('\\', "/");

    if slashed.split('/').any(|seg| seg == "..") {
        return Err(PatternError::Traversal {
            pattern: pattern.to_string(),
        });
    }

    if slashed.starts_with('/') {
        return Err(PatternError::Absolute {
            pattern: pattern.to_string(),
        });
    }

    Ok(())
}

/// True if the pattern contains glob meta characters
pub fn contains_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Convert simple directory paths to recursive glob patterns.
///
/// `.` becomes `**`, a trailing-slash path or an existing directory under
/// the root becomes `dir/**`. Patterns already carrying glob meta are left
/// unchanged; plain files and non-existent paths pass through as-is.
pub fn normalize(pattern: &str, fs: &dyn Fs) -> String {
    let pattern = pattern.replace('\\', "/");

    if contains_meta(&pattern) {
        return pattern;
    }

    let trailing_slash = pattern.ends_with('/');
    let cleaned = clean(&pattern);

    if cleaned.is_empty() || cleaned == "." {
        return "**".to_string();
    }

    if trailing_slash || fs.is_dir(&cleaned) {
        return format!("{cleaned}/**");
    }

    cleaned
}

/// Drop `.` segments and empty segments from a slash path
fn clean(path: &str) -> String {
    path.split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Convert file extensions to negated ignore patterns (`go` -> `!*.go`).
///
/// Appended after a `*`, `!*/` pair, the net effect is "include only files
/// with these extensions".
pub fn extensions_to_patterns(extensions: &[String]) -> Patterns {
    extensions.iter().map(|ext| format!("!*.{ext}")).collect()
}

/// Compile a search pattern into a glob matcher (`**` crosses separators,
/// `*` and `?` do not)
pub fn compile_glob(pattern: &str) -> Result<GlobMatcher, PatternError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| PatternError::Glob {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Compiled gitignore-style rule set.
///
/// Later rules override earlier ones, `!` negates, a trailing `/` restricts
/// the rule to directories, `#` starts a comment.
pub struct IgnoreMatcher {
    inner: Gitignore,
}

impl IgnoreMatcher {
    pub fn compile<'a>(lines: impl Iterator<Item = &'a str>) -> Result<Self, PatternError> {
        let mut builder = GitignoreBuilder::new("");

        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            builder
                .add_line(None, line)
                .map_err(|e| PatternError::Ignore {
                    pattern: line.to_string(),
                    reason: e.to_string(),
                })?;
        }

        let inner = builder.build().map_err(|e| PatternError::Ignore {
            pattern: String::new(),
            reason: e.to_string(),
        })?;

        Ok(Self { inner })
    }

    /// Returns the matching rule when the path is ignored.
    ///
    /// A path inside an ignored directory counts as ignored even when no
    /// rule names it directly.
    pub fn ignored(&self, path: &str, is_dir: bool) -> Option<&str> {
        match self.inner.matched_path_or_any_parents(path, is_dir) {
            Match::Ignore(glob) => Some(glob.original()),
            Match::Whitelist(_) | Match::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsys::MemFs;

    #[test]
    fn test_validate_rejects_traversal() {
        assert!(matches!(
            validate("../foo"),
            Err(PatternError::Traversal { .. })
        ));
        assert!(matches!(
            validate("foo/../bar"),
            Err(PatternError::Traversal { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_absolute() {
        assert!(matches!(
            validate("/etc/passwd"),
            Err(PatternError::Absolute { .. })
        ));
    }

    #[test]
    fn test_validate_accepts_relative() {
        assert!(validate("src/**").is_ok());
        assert!(validate("a..b/file").is_ok());
    }

    #[test]
    fn test_normalize_dot() {
        let fs = MemFs::new();
        assert_eq!(normalize(".", &fs), "**");
        assert_eq!(normalize("./", &fs), "**");
    }

    #[test]
    fn test_normalize_meta_unchanged() {
        let fs = MemFs::new();
        assert_eq!(normalize("src/**/*.rs", &fs), "src/**/*.rs");
        assert_eq!(normalize("*.go", &fs), "*.go");
    }

    #[test]
    fn test_normalize_trailing_slash() {
        let fs = MemFs::new();
        assert_eq!(normalize("src/", &fs), "src/**");
    }

    #[test]
    fn test_normalize_existing_dir() {
        let fs = MemFs::with_files([("src/main.rs", "")]);
        assert_eq!(normalize("src", &fs), "src/**");
    }

    #[test]
    fn test_normalize_plain_file() {
        let fs = MemFs::with_files([("README.md", "")]);
        assert_eq!(normalize("README.md", &fs), "README.md");
        assert_eq!(normalize("missing.txt", &fs), "missing.txt");
    }

    #[test]
    fn test_extensions_to_patterns() {
        let pats = extensions_to_patterns(&["go".to_string(), "rs".to_string()]);
        let v: Vec<_> = pats.iter().collect();
        assert_eq!(v, vec!["!*.go", "!*.rs"]);
    }

    #[test]
    fn test_glob_separator_rules() {
        let m = compile_glob("*.go").unwrap();
        assert!(m.is_match("main.go"));
        assert!(!m.is_match("vendor/lib.go"));

        let m = compile_glob("**").unwrap();
        assert!(m.is_match("main.go"));
        assert!(m.is_match("vendor/lib.go"));

        let m = compile_glob("src/**").unwrap();
        assert!(m.is_match("src/a/b.rs"));
        assert!(!m.is_match("other/b.rs"));
    }

    #[test]
    fn test_matcher_negation_order() {
        let m = IgnoreMatcher::compile(["*.log", "!keep.log"].into_iter()).unwrap();
        assert!(m.ignored("debug.log", false).is_some());
        assert!(m.ignored("keep.log", false).is_none());
    }

    #[test]
    fn test_matcher_dir_only_rule() {
        let m = IgnoreMatcher::compile([".git/"].into_iter()).unwrap();
        assert!(m.ignored(".git", true).is_some());
        assert!(m.ignored(".git", false).is_none());
        // Files under an ignored directory are ignored too
        assert!(m.ignored(".git/config", false).is_some());
    }

    #[test]
    fn test_matcher_reports_rule() {
        let m = IgnoreMatcher::compile(["target/", "*.tmp"].into_iter()).unwrap();
        assert_eq!(m.ignored("x.tmp", false), Some("*.tmp"));
    }

    #[test]
    fn test_matcher_extension_gate() {
        let m =
            IgnoreMatcher::compile(["*", "!*/", "!*.go"].into_iter()).unwrap();
        assert!(m.ignored("README.md", false).is_some());
        assert!(m.ignored("main.go", false).is_none());
        assert!(m.ignored("vendor", true).is_none());
        assert!(m.ignored("vendor/lib.go", false).is_none());
    }

    #[test]
    fn test_patterns_trim_empty() {
        let pats = Patterns::new(["a", "", "  ", "b"]).trim_empty();
        let v: Vec<_> = pats.iter().collect();
        assert_eq!(v, vec!["a", "b"]);
    }
}
