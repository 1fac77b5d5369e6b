//! Packed stream parser
//!
//! A line-at-a-time state machine with two states: outside any block, or
//! inside the block opened by the last begin marker. Payload lines are
//! buffered verbatim (including their newlines); everything outside a
//! block, footer included, is discarded.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{CodecError, ParseError};

use super::{Chunk, Markers};

/// Read a packed stream, handing each completed block to `emit`.
///
/// `emit` returns false when the downstream has gone away; the parser then
/// stops with [`CodecError::Canceled`]. The cancellation flag is polled
/// between lines so a failing sibling task ends the parse promptly.
pub fn parse_stream(
    markers: &Markers,
    reader: &mut dyn BufRead,
    cancel: &AtomicBool,
    mut emit: impl FnMut(Chunk) -> bool,
) -> Result<(), CodecError> {
    let begin = markers.begin_prefix().as_bytes();
    let end = markers.end_prefix().as_bytes();

    let mut line = Vec::new();
    let mut buf = Vec::new();
    let mut current: Option<String> = None;

    loop {
        if cancel.load(Ordering::Relaxed) {
            return Err(CodecError::Canceled);
        }

        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .map_err(CodecError::ArchiveRead)?;
        if n == 0 {
            break;
        }

        if line.starts_with(begin) {
            if let Some(path) = current {
                return Err(ParseError::NestedBegin { path }.into());
            }
            current = Some(trim_token(&line[begin.len()..]));
            buf.clear();
        } else if line.starts_with(end) {
            let found = trim_token(&line[end.len()..]);
            match current.take() {
                None => return Err(ParseError::UnmatchedEnd { path: found }.into()),
                Some(expected) if expected != found => {
                    return Err(ParseError::MismatchedEnd { expected, found }.into());
                }
                Some(path) => {
                    let chunk = Chunk {
                        path,
                        data: buf.clone(),
                    };
                    if !emit(chunk) {
                        return Err(CodecError::Canceled);
                    }
                }
            }
        } else if current.is_some() {
            buf.extend_from_slice(&line);
        }
    }

    if let Some(path) = current {
        return Err(ParseError::UnterminatedFile { path }.into());
    }

    Ok(())
}

fn trim_token(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &[u8]) -> Result<Vec<Chunk>, CodecError> {
        let markers = Markers::default();
        let cancel = AtomicBool::new(false);
        let mut chunks = Vec::new();
        let mut reader = input;
        parse_stream(&markers, &mut reader, &cancel, |c| {
            chunks.push(c);
            true
        })?;
        Ok(chunks)
    }

    #[test]
    fn test_single_block() {
        let input = b"// === AGGR: BEGIN: a.txt\nhello\n// === AGGR: END: a.txt\n\n";
        let chunks = parse(input).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].path, "a.txt");
        assert_eq!(chunks[0].data, b"hello\n");
    }

    #[test]
    fn test_footer_is_ignored() {
        let input =
            "// === AGGR: BEGIN: a\nx\n// === AGGR: END: a\n\n\ntree\n.\n\u{2514}\u{2500}\u{2500} a\n\n1 files\n"
                .as_bytes();
        let chunks = parse(input).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_content_outside_blocks_discarded() {
        let input = b"junk before\n// === AGGR: BEGIN: a\nx\n// === AGGR: END: a\njunk after\n";
        let chunks = parse(input).unwrap();
        assert_eq!(chunks[0].data, b"x\n");
    }

    #[test]
    fn test_nested_begin_fails() {
        let input = b"// === AGGR: BEGIN: a\n// === AGGR: BEGIN: b\n";
        let err = parse(input).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Parse(ParseError::NestedBegin { .. })
        ));
    }

    #[test]
    fn test_unmatched_end_fails() {
        let input = b"// === AGGR: END: a\n";
        let err = parse(input).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Parse(ParseError::UnmatchedEnd { .. })
        ));
    }

    #[test]
    fn test_mismatched_end_fails() {
        let input = b"// === AGGR: BEGIN: a\nx\n// === AGGR: END: b\n";
        let err = parse(input).unwrap_err();
        match err {
            CodecError::Parse(ParseError::MismatchedEnd { expected, found }) => {
                assert_eq!(expected, "a");
                assert_eq!(found, "b");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_block_fails() {
        let input = b"// === AGGR: BEGIN: a\nx\n";
        let err = parse(input).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Parse(ParseError::UnterminatedFile { .. })
        ));
    }

    #[test]
    fn test_escaped_marker_is_payload() {
        let input =
            b"// === AGGR: BEGIN: a\n// ===\\ AGGR: BEGIN: inner\n// === AGGR: END: a\n";
        let chunks = parse(input).unwrap();
        assert_eq!(chunks[0].data, b"// ===\\ AGGR: BEGIN: inner\n");
    }

    #[test]
    fn test_path_whitespace_trimmed() {
        let input = b"// === AGGR: BEGIN:   spaced.txt  \nx\n// === AGGR: END: spaced.txt\n";
        let chunks = parse(input).unwrap();
        assert_eq!(chunks[0].path, "spaced.txt");
    }

    #[test]
    fn test_cancellation_between_lines() {
        let markers = Markers::default();
        let cancel = AtomicBool::new(true);
        let mut reader: &[u8] = b"// === AGGR: BEGIN: a\n";
        let err = parse_stream(&markers, &mut reader, &cancel, |_| true).unwrap_err();
        assert!(matches!(err, CodecError::Canceled));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse(b"").unwrap().is_empty());
    }
}
