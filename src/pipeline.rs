//! Per-archive orchestration: label, move, unpack, render.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::io::LocalFileReader;
use crate::overview;
use crate::zip::{self, ZipReader};

/// Non-recursive scan of `dir` for `.zip` files, sorted by name.
///
/// Sorting only fixes the batch order; archives are processed one at a
/// time regardless.
pub fn locate_archives(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut archives = Vec::new();

    let listing =
        std::fs::read_dir(dir).with_context(|| format!("cannot scan {}", dir.display()))?;
    for entry in listing {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "zip") {
            archives.push(path);
        }
    }

    archives.sort();
    Ok(archives)
}

/// Run one archive through the whole pipeline.
///
/// The archive's central directory supplies the timestamp label, the
/// archive is moved into a fresh (or reused) `{name}_{label}` folder
/// under `output_root`, unpacked into `extracted/`, and the unpacked
/// tree is rendered to `{name}_overview.md` in the same folder.
///
/// Returns the per-archive folder. Every failure propagates; batch
/// isolation happens in the caller.
pub async fn process_archive(archive: &Path, output_root: &Path, quiet: bool) -> Result<PathBuf> {
    let file_name = archive
        .file_name()
        .ok_or_else(|| anyhow!("{} has no file name", archive.display()))?
        .to_owned();
    let base = archive
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    // The label comes from metadata alone; nothing is decompressed until
    // the archive sits in its final home.
    let probe = ZipReader::new(Arc::new(LocalFileReader::new(archive)?));
    let label = zip::latest_modified(&probe.entries().await?)?.label();
    drop(probe);

    let folder = output_root.join(format!("{base}_{label}"));
    // Reused without error when a previous run already created it.
    fs::create_dir_all(&folder)
        .await
        .with_context(|| format!("cannot create {}", folder.display()))?;

    let moved = folder.join(&file_name);
    move_file(archive, &moved).await?;

    let reader = ZipReader::new(Arc::new(LocalFileReader::new(&moved)?));
    let entries = reader.entries().await?;
    let extracted = folder.join("extracted");
    reader.unpack(&entries, &extracted).await?;

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(overview::count_files(&extracted).await?);
        bar.set_style(progress_style());
        bar.set_prefix(file_name.to_string_lossy().into_owned());
        bar
    };

    let document = folder.join(format!("{base}_overview.md"));
    let file = fs::File::create(&document)
        .await
        .with_context(|| format!("cannot create {}", document.display()))?;
    let mut out = BufWriter::new(file);
    overview::write_overview(&extracted, &mut out, &progress).await?;
    out.flush().await?;
    progress.finish();

    Ok(folder)
}

/// Move `from` to `to`: a plain rename, with a copy-then-delete fallback
/// for output roots on another filesystem.
async fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).await.is_ok() {
        return Ok(());
    }

    fs::copy(from, to)
        .await
        .with_context(|| format!("cannot move {} to {}", from.display(), to.display()))?;
    fs::remove_file(from).await?;
    Ok(())
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template("Processing {prefix}: [{bar:40}] {pos}/{len} files")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}
