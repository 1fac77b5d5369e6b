//! Duplicate suppression across overlapping patterns

use super::{CheckOutcome, CheckRequest, Checker};

/// Skips paths that are already in the growing file set.
///
/// Installed first in every walk chain so overlapping search patterns stay
/// idempotent.
#[derive(Debug, Default)]
pub struct Seen;

impl Seen {
    pub fn new() -> Self {
        Self
    }
}

impl Checker for Seen {
    fn check(&self, req: &CheckRequest<'_>) -> CheckOutcome {
        if req.set.contains(req.path) {
            CheckOutcome::Skip("already included".to_string())
        } else {
            CheckOutcome::Ok
        }
    }
}
