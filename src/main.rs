//! aggr - file aggregator
//!
//! Entry point for the CLI application.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;

use aggr::config::{CliArgs, Options, DEFAULTS};
use aggr::packer::{Confirm, Packer};
use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    setup_logging(args.dry);

    let options = Options::from_args(&args);
    let packer = Packer::new(options);

    if args.unpack {
        if args.args.len() != 1 {
            bail!(
                "when unpacking, exactly one file argument is required, received {}: {:?}",
                args.args.len(),
                args.args
            );
        }
        packer
            .unpack(Path::new(&args.args[0]), &StdinPrompt)
            .context("Unpack failed")?;
    } else {
        let patterns = if args.args.is_empty() {
            vec![DEFAULTS.pattern.to_string()]
        } else {
            args.args.clone()
        };
        packer.pack(&patterns).context("Pack failed")?;
    }

    Ok(())
}

fn setup_logging(dry: bool) {
    // Dry runs log every filtering decision
    let filter = if dry {
        EnvFilter::new("aggr=debug")
    } else {
        EnvFilter::new("aggr=info")
    };

    // Logs go to stderr; stdout carries the stream when packing to '-'
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

/// Interactive y/N prompt on stdin
struct StdinPrompt;

impl Confirm for StdinPrompt {
    fn confirm_overwrite(&self, dir: &Path) -> bool {
        eprintln!("The folder {dir:?} already exists.");
        eprintln!("This may overwrite existing files. Proceed with caution.");
        eprint!("Continue? (y/N): ");
        let _ = io::stderr().flush();

        let mut response = String::new();
        if io::stdin().lock().read_line(&mut response).is_err() {
            return false;
        }
        response.trim().eq_ignore_ascii_case("y")
    }
}
