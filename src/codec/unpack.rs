//! Unpack pipeline: one parser, a bounded chunk channel, writer workers
//!
//! The parser feeds chunks into a channel with capacity `2 * parallel`
//! (backpressure when workers are saturated). Workers decode, run the
//! checker chain, record surviving paths in a shared sink and write the
//! files. The first error cancels the pipeline: the parser notices the
//! flag between lines and closes the channel, remaining workers drain and
//! exit before the error is reported.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::bounded;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::checkers::{CheckRequest, Checkers};
use crate::error::CodecError;
use crate::fileset::FileSet;
use crate::fsys::{parent_rel, Fs};
use crate::patterns;

use super::{canonical, parse_stream, Aggregator, Chunk};

impl Aggregator {
    /// Unpack an archive file into the destination filesystem.
    ///
    /// Returns the set of files written (or that would be written in dry
    /// mode). Duplicate archive entries are all written; the last one wins.
    pub fn unpack(
        &self,
        archive: &Path,
        dest: &dyn Fs,
        checkers: &Checkers,
    ) -> Result<FileSet, CodecError> {
        let file = File::open(archive).map_err(CodecError::ArchiveRead)?;
        self.unpack_reader(&mut BufReader::new(file), dest, checkers)
    }

    /// Unpack from any buffered reader (the archive may come from stdin or
    /// a test fixture)
    pub fn unpack_reader(
        &self,
        reader: &mut dyn BufRead,
        dest: &dyn Fs,
        checkers: &Checkers,
    ) -> Result<FileSet, CodecError> {
        let (tx, rx) = bounded::<Chunk>(2 * self.parallel);
        let cancel = AtomicBool::new(false);
        let sink = Mutex::new(FileSet::new());
        let first_err: Mutex<Option<CodecError>> = Mutex::new(None);

        thread::scope(|scope| {
            for _ in 0..self.parallel {
                let rx = rx.clone();
                let cancel = &cancel;
                let sink = &sink;
                let first_err = &first_err;

                scope.spawn(move || {
                    for chunk in rx.iter() {
                        if let Err(e) = self.write_chunk(chunk, dest, checkers, sink) {
                            record_first(first_err, e);
                            cancel.store(true, Ordering::Relaxed);
                            break;
                        }
                    }
                });
            }
            drop(rx);

            let parsed = parse_stream(&self.markers, reader, &cancel, |chunk| {
                tx.send(chunk).is_ok()
            });
            drop(tx);

            match parsed {
                // A canceled parse means a worker already recorded the error
                Err(CodecError::Canceled) | Ok(()) => {}
                Err(e) => record_first(&first_err, e),
            }
        });

        match first_err.into_inner() {
            Some(e) => Err(e),
            None => Ok(sink.into_inner()),
        }
    }

    /// Decode one chunk, apply checkers, and write it unless dry
    fn write_chunk(
        &self,
        chunk: Chunk,
        dest: &dyn Fs,
        checkers: &Checkers,
        sink: &Mutex<FileSet>,
    ) -> Result<(), CodecError> {
        if chunk.path.is_empty() || patterns::validate(&chunk.path).is_err() {
            warn!("  - {:?}: unsafe path, skipped", chunk.path);
            return Ok(());
        }

        let data = canonical(&self.markers.unescape(&chunk.data));

        {
            let mut sink = sink.lock();
            let outcome = checkers.check(&CheckRequest {
                fs: dest,
                set: &sink,
                path: &chunk.path,
                is_dir: false,
            });
            if let Some(reason) = outcome.reason() {
                debug!("  - {:?}: {reason}", chunk.path);
                return Ok(());
            }
            sink.insert(chunk.path.clone());
        }

        if self.dry {
            return Ok(());
        }

        let parent = parent_rel(&chunk.path);
        if !parent.is_empty() {
            dest.create_dir_all(parent)
                .map_err(|e| CodecError::FileWrite {
                    path: chunk.path.clone(),
                    source: e,
                })?;
        }

        dest.write(&chunk.path, &data)
            .map_err(|e| CodecError::FileWrite {
                path: chunk.path,
                source: e,
            })
    }
}

fn record_first(slot: &Mutex<Option<CodecError>>, err: CodecError) {
    let mut guard = slot.lock();
    if guard.is_none() {
        *guard = Some(err);
    }
}
