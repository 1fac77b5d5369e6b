//! Error types for aggr
//!
//! This module defines the error hierarchy covering:
//! - Search and ignore pattern validation
//! - Configuration errors (size parsing, ignore files, output creation)
//! - Walk failures and aborts
//! - Stream format violations during unpack
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors should be actionable - include the offending value
//! - Preserve error chains for debugging

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the aggr application
#[derive(Error, Debug)]
pub enum AggrError {
    /// Pattern validation or compilation errors
    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Walk errors
    #[error("Walk error: {0}")]
    Walk(#[from] WalkError),

    /// Codec errors (pack/unpack pipelines)
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Aborted by the user at a confirmation prompt
    #[error("Aborted by user")]
    Aborted,
}

/// Pattern validation and compilation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Pattern contains a `..` segment
    #[error("relative path traversal ({pattern:?}) is not allowed")]
    Traversal { pattern: String },

    /// Pattern is an absolute path
    #[error("absolute paths ({pattern:?}) are not allowed")]
    Absolute { pattern: String },

    /// Glob failed to compile
    #[error("invalid glob {pattern:?}: {reason}")]
    Glob { pattern: String, reason: String },

    /// Ignore rules failed to compile
    #[error("invalid ignore rule {pattern:?}: {reason}")]
    Ignore { pattern: String, reason: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Humanized size value failed to parse
    #[error("invalid size value {value:?}")]
    SizeParse { value: String },

    /// Explicitly named ignore file does not exist
    #[error("ignore file {path:?} does not exist")]
    IgnoreFileMissing { path: PathBuf },

    /// Ignore file exists but could not be read
    #[error("reading ignore file {path:?}: {source}")]
    IgnoreFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Output file or directory could not be created
    #[error("creating output {path:?}: {source}")]
    OutputCreate {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Walk errors
#[derive(Error, Debug)]
pub enum WalkError {
    /// A checker or the file-count cap aborted the walk
    #[error("walk aborted: {reason}")]
    Aborted { reason: String },

    /// Filesystem error while walking
    #[error("walking {path:?}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Stream format violations detected by the parser
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A begin marker appeared while a file block was already open
    #[error("nested begin marker inside block for {path:?}")]
    NestedBegin { path: String },

    /// An end marker appeared with no open file block
    #[error("end marker without matching begin for {path:?}")]
    UnmatchedEnd { path: String },

    /// An end marker named a different path than the open block
    #[error("end marker for {found:?} does not match open block {expected:?}")]
    MismatchedEnd { expected: String, found: String },

    /// EOF was reached inside an open file block
    #[error("unterminated file block for {path:?}")]
    UnterminatedFile { path: String },
}

/// Pack/unpack pipeline errors
#[derive(Error, Debug)]
pub enum CodecError {
    /// Stream format violation
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Failed to read a file while packing
    #[error("reading {path:?}: {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },

    /// Failed to write a file while unpacking
    #[error("writing {path:?}: {source}")]
    FileWrite {
        path: String,
        source: std::io::Error,
    },

    /// Failed to read the archive stream
    #[error("reading archive: {0}")]
    ArchiveRead(#[source] std::io::Error),

    /// Failed to write to the output sink
    #[error("writing output: {0}")]
    OutputWrite(#[source] std::io::Error),

    /// A sibling task failed and this one was canceled
    #[error("worker canceled")]
    Canceled,
}

/// Result type alias for AggrError
pub type Result<T> = std::result::Result<T, AggrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err = PatternError::Traversal {
            pattern: "../x".into(),
        };
        let top: AggrError = err.into();
        assert!(matches!(top, AggrError::Pattern(_)));
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::MismatchedEnd {
            expected: "a.txt".into(),
            found: "b.txt".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("a.txt"));
        assert!(msg.contains("b.txt"));
    }
}
