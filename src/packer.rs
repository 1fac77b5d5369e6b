//! Pack/unpack orchestration
//!
//! Wires the pattern utilities, checker chain, walk engine and codec
//! together for one invocation. The confirmation prompt for pre-existing
//! unpack destinations is a seam so hosts (and tests) decide interactively
//! or not.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::checkers::{Binary, Checkers, Ignore, Size};
use crate::codec::Aggregator;
use crate::config::{parse_size, Options, DEFAULTS};
use crate::error::{AggrError, ConfigError, Result};
use crate::fileset::FileSet;
use crate::fsys::{Fs, OsFs};
use crate::hash;
use crate::patterns::{self, Patterns};
use crate::walker::Walker;

/// Decides whether a pre-existing unpack destination may be overwritten
pub trait Confirm {
    fn confirm_overwrite(&self, dir: &Path) -> bool;
}

/// Accepts every overwrite; for non-interactive hosts and tests
pub struct AcceptAll;

impl Confirm for AcceptAll {
    fn confirm_overwrite(&self, _dir: &Path) -> bool {
        true
    }
}

/// Orchestrates file packing and unpacking
pub struct Packer {
    options: Options,
}

impl Packer {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Aggregate files matching the search patterns into the configured
    /// output. Returns the packed file set in emission order.
    pub fn pack(&self, search_patterns: &[String]) -> Result<FileSet> {
        let rules = &self.options.rules;

        let search = if search_patterns.is_empty() {
            Patterns::new([DEFAULTS.pattern])
        } else {
            Patterns::new(search_patterns.iter().map(String::as_str))
        };

        search.validate()?;

        let root: Arc<dyn Fs> = Arc::new(OsFs::new(&rules.root));
        let search = search.normalized(&*root);
        debug!("normalized search patterns: {:?}", search.iter().collect::<Vec<_>>());

        let max_bytes = parse_size(&rules.size)?;

        let ignore_patterns = self.pack_ignore_patterns()?;
        if !ignore_patterns.is_empty() {
            debug!("the following patterns will be applied:");
            for pattern in ignore_patterns.iter() {
                debug!("  - {pattern}");
            }
        }

        let mut checks = Checkers::new()
            .with(Ignore::new(ignore_patterns.build_matcher()?))
            .with(Size::new(max_bytes));
        if !rules.binary {
            checks.push(Binary::new());
        }

        let mut walker = Walker::new(checks, rules.max);

        for pattern in search.iter() {
            debug!("processing pattern: {pattern}");
            let glob = patterns::compile_glob(pattern)?;
            walker.walk(&*root, &glob)?;
        }

        let mut files = walker.into_files();
        files.sort();

        let aggregator = Aggregator::new(root, self.options.dry, self.options.parallel);

        let to_stdout = self.options.dry || self.options.is_stdout();
        if to_stdout {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            aggregator.pack(&files, &mut writer)?;
        } else {
            let output = self.options.pack_output();
            let mut writer = fs::File::create(&output).map_err(|e| ConfigError::OutputCreate {
                path: PathBuf::from(&output),
                source: e,
            })?;
            aggregator.pack(&files, &mut writer)?;
            writer.flush().map_err(AggrError::Io)?;
            info!("Successfully packed {} files into {}", files.len(), output);
        }

        Ok(files)
    }

    /// Extract an archive into the configured (or derived) output
    /// directory. Returns the set of files written, or listed in dry mode.
    pub fn unpack(&self, archive: &Path, confirm: &dyn Confirm) -> Result<FileSet> {
        let rules = &self.options.rules;

        let mut ignore_patterns = Patterns::new(rules.patterns.iter().map(String::as_str));
        if !rules.extensions.is_empty() {
            let mut extras = Patterns::new(["*", "!*/"]);
            extras.extend(patterns::extensions_to_patterns(&rules.extensions));
            debug!("adding file extension patterns: {:?}", extras.iter().collect::<Vec<_>>());
            ignore_patterns.extend(extras);
        }

        if !ignore_patterns.is_empty() {
            debug!("using ignore patterns:");
            for pattern in ignore_patterns.iter() {
                debug!("  - {pattern}");
            }
        }

        let checkers = Checkers::new().with(Ignore::new(ignore_patterns.build_matcher()?));

        let output = match &self.options.output {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => {
                let contents = fs::read(archive)?;
                let base = archive
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| DEFAULTS.name.to_string());
                PathBuf::from(format!("{base}-{}", hash::short_hash(&contents)))
            }
        };

        if output.is_dir() && !confirm.confirm_overwrite(&output) {
            return Err(AggrError::Aborted);
        }

        if !self.options.dry {
            fs::create_dir_all(&output).map_err(|e| ConfigError::OutputCreate {
                path: output.clone(),
                source: e,
            })?;
        }

        let dest = OsFs::new(&output);
        let aggregator = Aggregator::new(
            Arc::new(OsFs::new(&output)),
            self.options.dry,
            self.options.parallel,
        );

        let files = aggregator.unpack(archive, &dest, &checkers)?;

        if self.options.dry {
            if files.is_empty() {
                warn!("No files would be unpacked");
            } else {
                info!("Unpacking files:");
                for file in files.iter() {
                    debug!("  - {file:?}");
                }
            }
            return Ok(files);
        }

        info!(
            "Successfully unpacked {} files from {:?} to {:?}",
            files.len(),
            archive,
            output
        );

        Ok(files)
    }

    /// Aggregated ignore patterns for pack, in precedence order: ignore
    /// file lines, extension restrictions, built-in defaults, the running
    /// executable, the output file, user patterns, hidden defaults.
    fn pack_ignore_patterns(&self) -> Result<Patterns> {
        let rules = &self.options.rules;
        let mut ignore_patterns = Patterns::default();

        match self.resolve_ignore_file()? {
            Some(path) => {
                let text = fs::read_to_string(&path).map_err(|e| ConfigError::IgnoreFileRead {
                    path: path.clone(),
                    source: e,
                })?;
                let lines = Patterns::new(text.lines()).trim_empty();
                debug!("ignore file {:?}: {} patterns", path, lines.len());
                ignore_patterns.extend(lines);
            }
            None => debug!("no ignore file loaded"),
        }

        if !rules.extensions.is_empty() {
            let mut extras = Patterns::new(["*", "!*/"]);
            extras.extend(patterns::extensions_to_patterns(&rules.extensions));
            debug!("file extension patterns: {:?}", extras.iter().collect::<Vec<_>>());
            ignore_patterns.extend(extras);
        }

        ignore_patterns.extend(Patterns::new(DEFAULTS.excludes.iter().copied()));

        // Never pack the running executable or the archive being written
        if let Ok(exe) = std::env::current_exe() {
            ignore_patterns.push(exe.to_string_lossy().into_owned());
        }
        if !self.options.is_stdout() {
            ignore_patterns.push(self.options.pack_output());
        }

        ignore_patterns.extend(Patterns::new(rules.patterns.iter().map(String::as_str)));

        if !rules.hidden {
            ignore_patterns.extend(Patterns::new(DEFAULTS.hidden.iter().copied()));
        }

        Ok(ignore_patterns)
    }

    /// Resolve the ignore file: an explicitly named one must exist, an
    /// explicit empty string disables loading, otherwise probe
    /// `./.aggrignore`, `$HOME/.config/aggr/.aggrignore`, `./.gitignore`.
    fn resolve_ignore_file(&self) -> Result<Option<PathBuf>> {
        match &self.options.rules.ignore_file {
            Some(path) if path.is_empty() => Ok(None),
            Some(path) => {
                let path = PathBuf::from(path);
                if path.is_file() {
                    Ok(Some(path))
                } else {
                    Err(ConfigError::IgnoreFileMissing { path }.into())
                }
            }
            None => {
                let mut candidates = vec![PathBuf::from(DEFAULTS.ignore_file)];
                if let Some(home) = home::home_dir() {
                    candidates.push(
                        home.join(".config")
                            .join(DEFAULTS.name)
                            .join(DEFAULTS.ignore_file),
                    );
                }
                candidates.push(PathBuf::from(".gitignore"));

                Ok(candidates.into_iter().find(|p| p.is_file()))
            }
        }
    }
}
