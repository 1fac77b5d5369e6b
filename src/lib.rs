//! aggr - pack a filtered file tree into one text stream and back
//!
//! A tool that walks a filesystem tree, selects a filtered subset of
//! regular files, concatenates their contents into a single self-describing
//! text stream, and inverts that stream back into the original hierarchy.
//!
//! # Features
//!
//! - **Filtered walk**: gitignore-style rules, extension gates, size caps,
//!   binary detection and a hard file-count cap, applied through an ordered
//!   checker chain.
//!
//! - **Self-describing stream**: begin/end marker framing with escaping, so
//!   archives survive packing files that themselves contain marker lines.
//!
//! - **Parallel pipelines**: packing encodes files concurrently but emits
//!   blocks in deterministic sorted order; unpacking fans parsed chunks out
//!   to writer workers over a bounded channel.
//!
//! # Architecture
//!
//! ```text
//! pack:    patterns ──> walk(Fs, checkers) ──> sorted FileSet
//!                                                   │
//!                               ┌───────────────────┤
//!                               ▼                   ▼
//!                          encoder workers    (dry: skip)
//!                               │
//!                               ▼
//!                        ordered writeback ──> blocks + tree footer
//!
//! unpack:  archive ──> parser ──> chunk channel ──> writer workers
//!                                 (bounded 2P)       │
//!                                                    ▼
//!                                          checkers + file writes
//! ```
//!
//! # Example
//!
//! ```bash
//! # Pack all Rust sources under the current directory
//! aggr -x rs -o sources.aggr
//!
//! # Unpack the archive elsewhere
//! aggr -u sources.aggr -o extracted/
//! ```

pub mod checkers;
pub mod codec;
pub mod config;
pub mod error;
pub mod fileset;
pub mod fsys;
pub mod hash;
pub mod packer;
pub mod patterns;
pub mod tree;
pub mod walker;

pub use config::{CliArgs, Options, DEFAULTS};
pub use error::{AggrError, Result};
pub use fileset::FileSet;
pub use packer::{AcceptAll, Confirm, Packer};
