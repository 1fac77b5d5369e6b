//! Per-file size cap

use humansize::{format_size, DECIMAL};

use super::{CheckOutcome, CheckRequest, Checker};

/// Skips regular files strictly larger than the configured limit.
/// Directories pass through, as do paths whose size cannot be read.
#[derive(Debug)]
pub struct Size {
    max_bytes: u64,
}

impl Size {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

impl Checker for Size {
    fn check(&self, req: &CheckRequest<'_>) -> CheckOutcome {
        if req.is_dir {
            return CheckOutcome::Ok;
        }

        let Ok(meta) = req.fs.metadata(req.path) else {
            return CheckOutcome::Ok;
        };

        if meta.kind.is_file() && meta.len > self.max_bytes {
            return CheckOutcome::Skip(format!(
                "larger than max size {}",
                format_size(self.max_bytes, DECIMAL)
            ));
        }

        CheckOutcome::Ok
    }
}
