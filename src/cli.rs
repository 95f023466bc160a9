use std::path::{Path, PathBuf};

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "zip2md")]
#[command(version)]
#[command(about = "Render zipped source trees as single-file Markdown overviews", long_about = None)]
#[command(after_help = "Examples:\n  \
  zip2md                      process every .zip in the current directory\n  \
  zip2md repo.zip             process one archive\n  \
  zip2md -d inbox -o reports  scan inbox/, write output folders under reports/")]
pub struct Cli {
    /// Archives to process (default: every .zip in the scan directory)
    #[arg(value_name = "ARCHIVES")]
    pub archives: Vec<PathBuf>,

    /// Directory to scan for archives
    #[arg(short = 'd', long = "dir", value_name = "DIR", default_value = ".")]
    pub scan_dir: PathBuf,

    /// Root directory for output folders (default: the scan directory)
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_root: Option<PathBuf>,

    /// Suppress progress and per-archive output
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn output_root(&self) -> &Path {
        self.output_root.as_deref().unwrap_or(&self.scan_dir)
    }
}
