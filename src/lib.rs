//! # zip2md
//!
//! Renders zipped source trees as single-file Markdown overviews.
//!
//! For each archive, the pipeline derives a timestamp label from the
//! archive's central directory (the latest per-entry modification time),
//! moves the archive into a `{name}_{label}` folder, unpacks it into an
//! `extracted/` subdirectory there, and walks the unpacked tree writing
//! one Markdown block per directory: a depth-matched heading, a `##`
//! subsection per file, and file bodies fenced when the extension is
//! recognized as code.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     for archive in zip2md::locate_archives(Path::new("."))? {
//!         let folder = zip2md::process_archive(&archive, Path::new("."), true).await?;
//!         println!("{}", folder.display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod io;
pub mod overview;
pub mod pipeline;
pub mod zip;

pub use cli::Cli;
pub use io::{LocalFileReader, ReadAt};
pub use pipeline::{locate_archives, process_archive};
pub use zip::{ArchiveEntry, DosDateTime, ZipReader, latest_modified};
