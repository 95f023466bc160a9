//! Tree walking and Markdown rendering, interleaved: each directory block
//! is written as the walk reaches it, so no intermediate tree is built.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Extensions rendered inside a language-tagged code fence.
pub const CODE_EXTENSIONS: &[&str] = &["py", "js", "css", "html"];

/// Walk `root` depth-first and write one Markdown block per directory.
///
/// Children are visited in alphabetical order, directories and files
/// alike. A directory at depth `n` below `root` gets a heading of level
/// `n + 1`; each of its files gets a `##` subheading, a blank line, the
/// rendered body, and a blank line. Every block closes with a bare fence
/// line whether or not a fence was opened inside it - the established
/// overview format carries that asymmetry, and consumers depend on it.
///
/// The progress bar ticks once per file rendered.
pub async fn write_overview<W>(root: &Path, out: &mut W, progress: &ProgressBar) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let level = dir
            .strip_prefix(root)
            .map_or(0, |rel| rel.components().count());
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (subdirs, files) = list_sorted(&dir).await?;

        let heading = format!("{} {}\n\n", "#".repeat(level + 1), name);
        out.write_all(heading.as_bytes()).await?;

        for file in &files {
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            out.write_all(format!("## {file_name}\n\n").as_bytes()).await?;
            out.write_all(render_file(file).await?.as_bytes()).await?;
            out.write_all(b"\n\n").await?;
            progress.inc(1);
        }

        out.write_all(b"```\n").await?;

        // Reverse push so the alphabetically first subdirectory is the
        // next one popped.
        for sub in subdirs.into_iter().rev() {
            pending.push(sub);
        }
    }

    Ok(())
}

/// Render one file body.
///
/// Strict UTF-8 decoding doubles as the binary classifier: a failed
/// decode yields a fixed placeholder body, while any other read failure
/// propagates. Recognized code extensions are fenced and tagged;
/// `md` and everything else pass through verbatim, so Markdown inside
/// the archive keeps its own structure in the rendered document.
pub async fn render_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;

    let Ok(text) = String::from_utf8(bytes) else {
        return Ok(format!(
            "Unable to display content for {}. Binary or unsupported text encoding.",
            path.display()
        ));
    };

    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if CODE_EXTENSIONS.contains(&ext) => Ok(format!("```{ext}\n{text}\n```")),
        _ => Ok(text),
    }
}

/// Number of files under `root`, for sizing the progress bar.
pub async fn count_files(root: &Path) -> Result<u64> {
    let mut pending = vec![root.to_path_buf()];
    let mut count = 0u64;

    while let Some(dir) = pending.pop() {
        let (subdirs, files) = list_sorted(&dir).await?;
        count += files.len() as u64;
        pending.extend(subdirs);
    }

    Ok(count)
}

/// Immediate children of `dir`, split into directories and files, each
/// list sorted by path.
async fn list_sorted(dir: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut subdirs = Vec::new();
    let mut files = Vec::new();

    let mut listing = fs::read_dir(dir)
        .await
        .with_context(|| format!("cannot list {}", dir.display()))?;
    while let Some(entry) = listing.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            subdirs.push(entry.path());
        } else {
            files.push(entry.path());
        }
    }

    subdirs.sort();
    files.sort();
    Ok((subdirs, files))
}
