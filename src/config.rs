//! Configuration types for aggr
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Validated runtime options
//! - Process-wide defaults
//! - Humanized size parsing (`500kb`, `1 mb`, `2MiB`)

use clap::Parser;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Process-wide defaults, exposed as a single record
pub struct Defaults {
    /// Application name (also the config directory name)
    pub name: &'static str,
    /// Ignore file probed in the working and config directories
    pub ignore_file: &'static str,
    /// Search pattern used when none are given
    pub pattern: &'static str,
    /// Exclude patterns that are always applied
    pub excludes: &'static [&'static str],
    /// Patterns applied unless `--hidden` is set
    pub hidden: &'static [&'static str],
    /// Maximum size of files to include
    pub max_size: &'static str,
    /// Maximum number of files to include
    pub max_files: usize,
    /// Output file for pack mode
    pub output: &'static str,
}

pub const DEFAULTS: Defaults = Defaults {
    name: "aggr",
    ignore_file: ".aggrignore",
    pattern: ".",
    excludes: &[".git/"],
    hidden: &[".*"],
    max_size: "1 mb",
    max_files: 1000,
    output: "pack.aggr",
};

/// Aggregate files into a single stream and unpack them back
#[derive(Parser, Debug, Clone)]
#[command(
    name = "aggr",
    version,
    about = "Aggregate and unpack files",
    long_about = "aggr recursively aggregates files from the given paths or patterns \
                  (the current directory if none are given) into a single text stream, \
                  and unpacks such a stream back into the original directory structure.",
    after_help = "EXAMPLES:\n    \
        aggr -o pack.aggr\n    \
        aggr 'src/**' -x rs -o sources.aggr\n    \
        aggr -u pack.aggr -o extracted/"
)]
pub struct CliArgs {
    /// Search patterns for pack mode; the archive file for unpack mode
    #[arg(value_name = "PATTERNS")]
    pub args: Vec<String>,

    /// Unpack from a packed file (exactly one file argument required)
    #[arg(short = 'u', long)]
    pub unpack: bool,

    /// Output file (pack) or directory (unpack). '-' or empty means stdout
    /// on pack; unpack defaults to '<archive>-<hash>'
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<String>,

    /// Root directory the walk runs inside
    #[arg(short = 'C', long, default_value = ".", value_name = "DIR")]
    pub root: PathBuf,

    /// Path to the ignore file. Empty string disables ignore-file loading;
    /// when not passed, defaults are probed
    #[arg(short = 'f', long, value_name = "FILE")]
    pub ignore_file: Option<String>,

    /// Restrict to these file extensions (can be repeated or comma-separated)
    #[arg(
        short = 'x',
        long = "extensions",
        value_name = "EXT",
        value_delimiter = ',',
        action = clap::ArgAction::Append
    )]
    pub extensions: Vec<String>,

    /// Additional gitignore-style patterns (can be repeated)
    #[arg(short = 'i', long = "ignore", value_name = "PATTERN", action = clap::ArgAction::Append)]
    pub ignore: Vec<String>,

    /// Include hidden files and directories
    #[arg(short = 'a', long)]
    pub hidden: bool,

    /// Include binary files
    #[arg(short = 'b', long)]
    pub binary: bool,

    /// Max file size to include (e.g. `500kb`, `1 mb`)
    #[arg(short = 's', long, default_value = DEFAULTS.max_size, value_name = "SIZE")]
    pub size: String,

    /// Maximum number of files to include
    #[arg(short = 'm', long, default_value_t = DEFAULTS.max_files, value_name = "NUM")]
    pub max: usize,

    /// Show which files would be processed without writing anything
    #[arg(short = 'd', long)]
    pub dry: bool,

    /// Number of parallel workers to use
    #[arg(short = 'j', long, default_value_t = default_parallel(), value_name = "NUM")]
    pub parallel: usize,
}

/// Filtering and processing rules for a run
#[derive(Debug, Clone)]
pub struct Rules {
    /// Root directory the walk runs inside
    pub root: PathBuf,
    /// Ignore file: None probes defaults, Some("") disables, Some(path)
    /// must exist
    pub ignore_file: Option<String>,
    /// Extra gitignore-style patterns
    pub patterns: Vec<String>,
    /// Extensions to restrict to
    pub extensions: Vec<String>,
    /// Include hidden files and directories
    pub hidden: bool,
    /// Maximum number of files to collect
    pub max: usize,
    /// Maximum file size, humanized
    pub size: String,
    /// Include binary files
    pub binary: bool,
}

/// Validated runtime options
#[derive(Debug, Clone)]
pub struct Options {
    /// Output file (pack) or directory (unpack); None means the mode default
    pub output: Option<String>,
    /// Unpack instead of pack
    pub unpack: bool,
    /// No writes, verbose decision logging
    pub dry: bool,
    /// Worker count for the pipelines
    pub parallel: usize,
    /// Filtering rules
    pub rules: Rules,
}

impl Options {
    pub fn from_args(args: &CliArgs) -> Self {
        Self {
            output: args.output.clone(),
            unpack: args.unpack,
            dry: args.dry,
            parallel: args.parallel.max(1),
            rules: Rules {
                root: args.root.clone(),
                ignore_file: args.ignore_file.clone(),
                patterns: args.ignore.clone(),
                extensions: args.extensions.clone(),
                hidden: args.hidden,
                max: args.max,
                size: args.size.clone(),
                binary: args.binary,
            },
        }
    }

    /// Output path for pack mode, with the default applied
    pub fn pack_output(&self) -> String {
        self.output
            .clone()
            .unwrap_or_else(|| DEFAULTS.output.to_string())
    }

    /// True when the pack output goes to stdout
    pub fn is_stdout(&self) -> bool {
        matches!(self.pack_output().as_str(), "" | "-")
    }
}

fn default_parallel() -> usize {
    // Pipelines are I/O bound, so oversubscribe the cores
    4 * num_cpus::get().max(1)
}

/// Parse a humanized byte size.
///
/// Decimal suffixes (`kb`, `mb`, `gb`) are 1000-based, binary suffixes
/// (`kib`, `mib`, `gib`) are 1024-based; matching is case-insensitive and
/// whitespace between number and suffix is allowed. A bare number is bytes.
pub fn parse_size(value: &str) -> Result<u64, ConfigError> {
    let err = || ConfigError::SizeParse {
        value: value.to_string(),
    };

    let trimmed = value.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(split);

    let amount: f64 = number.trim().parse().map_err(|_| err())?;
    if amount < 0.0 || !amount.is_finite() {
        return Err(err());
    }

    let multiplier: u64 = match suffix.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" => 1000,
        "m" | "mb" => 1000 * 1000,
        "g" | "gb" => 1000 * 1000 * 1000,
        "ki" | "kib" => 1 << 10,
        "mi" | "mib" => 1 << 20,
        "gi" | "gib" => 1 << 30,
        _ => return Err(err()),
    };

    Ok((amount * multiplier as f64) as u64)
}
