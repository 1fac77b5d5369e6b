//! Pack pipeline: parallel per-file encode, ordered writeback, footer
//!
//! Encoders pull indices from a shared counter and park finished blocks in
//! a pre-sized slot vector, so the emitted stream order always equals the
//! file-set order no matter how encoding is scheduled.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use crossbeam_channel::bounded;
use tracing::debug;

use crate::error::CodecError;
use crate::fileset::FileSet;
use crate::tree;

use super::{canonical, Aggregator};

impl Aggregator {
    /// Write the packed representation of the file set.
    ///
    /// In dry mode only the footer is written; otherwise every file block
    /// is emitted first, in file-set order.
    pub fn pack(&self, set: &FileSet, writer: &mut dyn Write) -> Result<(), CodecError> {
        if !self.dry {
            self.pack_blocks(set, writer)?;
        }
        self.write_footer(set, writer)
    }

    fn pack_blocks(&self, set: &FileSet, writer: &mut dyn Write) -> Result<(), CodecError> {
        let paths: Vec<&str> = set.iter().collect();
        if paths.is_empty() {
            return Ok(());
        }

        let workers = self.parallel.min(paths.len());
        let next = AtomicUsize::new(0);
        let cancel = AtomicBool::new(false);
        let (tx, rx) = bounded::<(usize, Result<Vec<u8>, CodecError>)>(paths.len());

        let mut blocks: Vec<Option<Vec<u8>>> = Vec::new();
        blocks.resize_with(paths.len(), || None);
        let mut first_err: Option<CodecError> = None;

        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                let cancel = &cancel;
                let paths = &paths;

                scope.spawn(move || loop {
                    if cancel.load(Ordering::Relaxed) {
                        break;
                    }
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    if index >= paths.len() {
                        break;
                    }

                    let result = self.encode_file(paths[index]);
                    if result.is_err() {
                        cancel.store(true, Ordering::Relaxed);
                    }
                    if tx.send((index, result)).is_err() {
                        break;
                    }
                });
            }
            drop(tx);

            for (index, result) in rx.iter() {
                match result {
                    Ok(block) => blocks[index] = Some(block),
                    Err(e) => {
                        if first_err.is_none() {
                            first_err = Some(e);
                        }
                    }
                }
            }
        });

        if let Some(e) = first_err {
            return Err(e);
        }

        debug!("encoded {} blocks", blocks.len());

        for block in blocks.into_iter().flatten() {
            writer.write_all(&block).map_err(CodecError::OutputWrite)?;
        }

        Ok(())
    }

    /// The packed block for a single file: begin line, escaped canonical
    /// payload, end line, blank separator
    fn encode_file(&self, path: &str) -> Result<Vec<u8>, CodecError> {
        let data = self.fs.read(path).map_err(|e| CodecError::FileRead {
            path: path.to_string(),
            source: e,
        })?;

        let payload = self.markers.escape(&canonical(&data));

        let mut block = Vec::with_capacity(payload.len() + 2 * path.len() + 64);
        block.extend_from_slice(self.markers.begin_prefix().as_bytes());
        block.push(b' ');
        block.extend_from_slice(path.as_bytes());
        block.push(b'\n');
        block.extend_from_slice(&payload);
        block.extend_from_slice(self.markers.end_prefix().as_bytes());
        block.push(b' ');
        block.extend_from_slice(path.as_bytes());
        block.extend_from_slice(b"\n\n");

        Ok(block)
    }

    fn write_footer(&self, set: &FileSet, writer: &mut dyn Write) -> Result<(), CodecError> {
        writer
            .write_all(b"\ntree\n")
            .map_err(CodecError::OutputWrite)?;

        let annotate = if self.dry { Some(&*self.fs) } else { None };
        writer
            .write_all(tree::generate(set, annotate).as_bytes())
            .map_err(CodecError::OutputWrite)?;

        writer
            .write_all(format!("\n{} files\n", set.len()).as_bytes())
            .map_err(CodecError::OutputWrite)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::fsys::MemFs;

    fn pack_to_string(fs: MemFs, paths: &[&str], dry: bool, parallel: usize) -> String {
        let set: FileSet = paths.iter().copied().collect();
        let aggregator = Aggregator::new(Arc::new(fs), dry, parallel);
        let mut out = Vec::new();
        aggregator.pack(&set, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_two_file_stream() {
        let fs = MemFs::with_files([("a.txt", "hello\n"), ("dir/b.txt", "x")]);
        let out = pack_to_string(fs, &["a.txt", "dir/b.txt"], false, 2);

        let expected = concat!(
            "// === AGGR: BEGIN: a.txt\n",
            "hello\n",
            "// === AGGR: END: a.txt\n",
            "\n",
            "// === AGGR: BEGIN: dir/b.txt\n",
            "x\n",
            "// === AGGR: END: dir/b.txt\n",
            "\n",
            "\ntree\n",
            ".\n",
            "├── a.txt\n",
            "└── dir\n",
            "    └── b.txt\n",
            "\n2 files\n",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_order_is_deterministic_across_parallelism() {
        let files: Vec<(String, String)> = (0..20)
            .map(|i| (format!("f{i:02}.txt"), format!("content {i}\n")))
            .collect();
        let paths: Vec<&str> = files.iter().map(|(p, _)| p.as_str()).collect();

        let outputs: Vec<String> = [1, 4, 16]
            .into_iter()
            .map(|parallel| {
                let fs = MemFs::with_files(files.clone());
                pack_to_string(fs, &paths, false, parallel)
            })
            .collect();

        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(outputs[1], outputs[2]);
    }

    #[test]
    fn test_empty_set_writes_footer_only() {
        let out = pack_to_string(MemFs::new(), &[], false, 4);
        assert_eq!(out, "\ntree\n.\n\n0 files\n");
    }

    #[test]
    fn test_dry_skips_blocks_and_annotates() {
        let fs = MemFs::with_files([("a.txt", "one\ntwo\n")]);
        let out = pack_to_string(fs, &["a.txt"], true, 4);
        assert!(!out.contains("BEGIN:"));
        assert!(out.contains("a.txt (#2)"));
        assert!(out.ends_with("\n1 files\n"));
    }

    #[test]
    fn test_missing_file_fails() {
        let set: FileSet = ["ghost.txt"].into_iter().collect();
        let aggregator = Aggregator::new(Arc::new(MemFs::new()), false, 2);
        let mut out = Vec::new();
        let err = aggregator.pack(&set, &mut out).unwrap_err();
        assert!(matches!(err, CodecError::FileRead { .. }));
    }

    #[test]
    fn test_marker_content_is_escaped() {
        let fs = MemFs::with_files([("tricky.txt", "// === AGGR: BEGIN: inner\n")]);
        let out = pack_to_string(fs, &["tricky.txt"], false, 1);
        assert!(out.contains("// ===\\ AGGR: BEGIN: inner\n"));
    }
}
