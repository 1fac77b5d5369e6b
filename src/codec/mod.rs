//! Packed stream codec
//!
//! A packed archive is a sequence of file blocks, each framed by begin/end
//! marker lines, followed by an advisory footer (tree rendering and file
//! count). Payload lines that would collide with the marker are escaped by
//! inserting a backslash; payloads are canonicalized to end with exactly
//! one newline. All payload operations work on raw bytes so non-UTF-8
//! content survives a `--binary` round trip.

use std::sync::Arc;

use crate::fsys::Fs;

mod pack;
mod parser;
mod unpack;

pub use parser::parse_stream;

/// Marker prefix framing every file block
pub const MARKER: &str = "// === AGGR:";

/// Escape form: a backslash inserted before the space after `// ===`
const MARKER_ESCAPE: &str = "// ===\\ AGGR:";

/// One file's data handed from the parser to a writer worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub path: String,
    pub data: Vec<u8>,
}

/// Marker strings and tokens of the packed stream format
#[derive(Debug, Clone)]
pub struct Markers {
    marker: String,
    escape: String,
    begin_prefix: String,
    end_prefix: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            marker: MARKER.to_string(),
            escape: MARKER_ESCAPE.to_string(),
            begin_prefix: format!("{MARKER} BEGIN:"),
            end_prefix: format!("{MARKER} END:"),
        }
    }
}

impl Markers {
    pub fn begin_prefix(&self) -> &str {
        &self.begin_prefix
    }

    pub fn end_prefix(&self) -> &str {
        &self.end_prefix
    }

    /// Escape payload lines that would parse as markers.
    ///
    /// Only lines whose leading-whitespace-trimmed prefix equals the marker
    /// are rewritten, and only the marker occurrence itself is replaced.
    pub fn escape(&self, data: &[u8]) -> Vec<u8> {
        rewrite_lines(data, self.marker.as_bytes(), self.escape.as_bytes())
    }

    /// Inverse of [`Markers::escape`]
    pub fn unescape(&self, data: &[u8]) -> Vec<u8> {
        rewrite_lines(data, self.escape.as_bytes(), self.marker.as_bytes())
    }
}

fn rewrite_lines(data: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut first = true;

    for line in data.split(|&b| b == b'\n') {
        if !first {
            out.push(b'\n');
        }
        first = false;

        let indent = line
            .iter()
            .take_while(|&&b| b == b' ' || b == b'\t')
            .count();

        if line[indent..].starts_with(from) {
            out.extend_from_slice(&line[..indent]);
            out.extend_from_slice(to);
            out.extend_from_slice(&line[indent + from.len()..]);
        } else {
            out.extend_from_slice(line);
        }
    }

    out
}

/// Strip all trailing newlines, then append exactly one
pub fn canonical(data: &[u8]) -> Vec<u8> {
    let end = data
        .iter()
        .rposition(|&b| b != b'\n')
        .map_or(0, |idx| idx + 1);

    let mut out = Vec::with_capacity(end + 1);
    out.extend_from_slice(&data[..end]);
    out.push(b'\n');
    out
}

/// Converts between file sets and packed streams.
///
/// Packing encodes up to `parallel` files concurrently and writes blocks in
/// file-set order; unpacking fans parsed chunks out to `parallel` writer
/// workers. In dry mode no payloads are read or written.
pub struct Aggregator {
    markers: Markers,
    fs: Arc<dyn Fs>,
    dry: bool,
    parallel: usize,
}

impl Aggregator {
    /// `fs` is the root the packed files are read from (and line counts
    /// are taken from in dry runs). `parallel` is clamped to at least 1.
    pub fn new(fs: Arc<dyn Fs>, dry: bool, parallel: usize) -> Self {
        Self {
            markers: Markers::default(),
            fs,
            dry,
            parallel: parallel.max(1),
        }
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }
}
