//! Binary content detection
//!
//! Sniffs a bounded prefix of the file, like magic-byte file type
//! detection: only the first few kilobytes are read, so the check stays
//! cheap even for large files.

use super::{CheckOutcome, CheckRequest, Checker};

/// Bytes sniffed from the start of each file
const SNIFF_LEN: usize = 8192;

/// Fraction of control bytes above which content counts as binary
const MAX_CONTROL_RATIO: f64 = 0.30;

/// Skips files whose content looks binary: a NUL byte anywhere in the
/// sniffed prefix, or a high ratio of control bytes. Directories and
/// unreadable paths pass through.
#[derive(Debug, Default)]
pub struct Binary;

impl Binary {
    pub fn new() -> Self {
        Self
    }
}

impl Checker for Binary {
    fn check(&self, req: &CheckRequest<'_>) -> CheckOutcome {
        if req.is_dir {
            return CheckOutcome::Ok;
        }

        let Ok(prefix) = req.fs.read_prefix(req.path, SNIFF_LEN) else {
            return CheckOutcome::Ok;
        };

        if is_binary(&prefix) {
            return CheckOutcome::Skip("detected as binary".to_string());
        }

        CheckOutcome::Ok
    }
}

/// Heuristic over a content prefix.
///
/// High-bit bytes are not counted as control bytes, so UTF-8 multi-byte
/// text stays textual.
pub fn is_binary(prefix: &[u8]) -> bool {
    if prefix.is_empty() {
        return false;
    }

    if prefix.contains(&0) {
        return true;
    }

    let control = prefix
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\n' | b'\r' | b'\t' | 0x0c))
        .count();

    control as f64 / prefix.len() as f64 > MAX_CONTROL_RATIO
}
