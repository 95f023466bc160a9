//! Command-line entry point.
//!
//! Resolves the archive list (explicit paths, or a scan of the input
//! directory), then runs each archive through the pipeline as its own
//! unit of work: one corrupt archive is reported and the rest of the
//! batch still runs.

use anyhow::{Result, bail};
use clap::Parser;

use zip2md::{Cli, locate_archives, process_archive};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let archives = if cli.archives.is_empty() {
        locate_archives(&cli.scan_dir)?
    } else {
        cli.archives.clone()
    };

    if archives.is_empty() {
        if !cli.is_quiet() {
            eprintln!("no archives found in {}", cli.scan_dir.display());
        }
        return Ok(());
    }

    let mut failed = 0usize;
    for archive in &archives {
        match process_archive(archive, cli.output_root(), cli.is_quiet()).await {
            Ok(folder) => {
                if !cli.is_quiet() {
                    println!("{} -> {}", archive.display(), folder.display());
                }
            }
            Err(err) => {
                failed += 1;
                eprintln!("error: {}: {:#}", archive.display(), err);
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} archives failed", archives.len());
    }
    Ok(())
}
