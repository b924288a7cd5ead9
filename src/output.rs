//! Terminal and JSON output for the command-line front end

use crate::chunk::Chunk;
use crate::engine::SearchPage;
use crate::index::stats::{IndexStats, format_size};
use crate::index::types::RefreshStats;
use crate::listing::DirEntryInfo;
use serde::Serialize;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn stdout(color: bool) -> StandardStream {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

/// Pretty-printed JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)
}

/// Print one page of hits as `path:offset  score`
pub fn print_search_page(page: &SearchPage, color: bool) -> io::Result<()> {
    let mut stdout = stdout(color);

    if page.hits.is_empty() {
        writeln!(stdout, "No matches ({} total)", page.total)?;
        return Ok(());
    }

    for hit in &page.hits {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        write!(stdout, "{}", hit.path)?;
        stdout.reset()?;
        write!(stdout, ":")?;
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(stdout, "{}", hit.char_offset)?;
        stdout.reset()?;
        writeln!(stdout, "  ({:.3})", hit.score)?;
    }

    let shown_to = page.skip + page.hits.len();
    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
    write!(stdout, "Showing {}-{} of {}", page.skip + 1, shown_to, page.total)?;
    if page.has_more() {
        write!(stdout, " (next page: --skip {})", shown_to)?;
    }
    stdout.reset()?;
    writeln!(stdout)?;
    Ok(())
}

/// Print a chunk with its range header
pub fn print_chunk(chunk: &Chunk, path: &str, offset: usize, color: bool) -> io::Result<()> {
    let mut stdout = stdout(color);

    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
    writeln!(stdout, "File: {}", path)?;
    stdout.reset()?;
    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
    writeln!(
        stdout,
        "Range: {}-{} (offset {}) [Max: 0-{}]",
        chunk.start, chunk.end, offset, chunk.total_chars
    )?;
    stdout.reset()?;
    writeln!(stdout, "{}", chunk.text)?;
    Ok(())
}

/// Print directory entries, folders first
pub fn print_listing(dir: &str, entries: &[DirEntryInfo], color: bool) -> io::Result<()> {
    let mut stdout = stdout(color);
    writeln!(stdout, "Directory: {}", if dir.is_empty() { "/" } else { dir })?;
    writeln!(stdout)?;

    let (folders, files): (Vec<&DirEntryInfo>, Vec<&DirEntryInfo>) =
        entries.iter().partition(|e| e.is_dir());

    if !folders.is_empty() {
        writeln!(stdout, "Folders:")?;
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Blue)).set_bold(true))?;
        for folder in &folders {
            writeln!(stdout, "  {}/", folder.name)?;
        }
        stdout.reset()?;
        writeln!(stdout)?;
    }

    if !files.is_empty() {
        writeln!(stdout, "Files:")?;
        for file in &files {
            write!(stdout, "  {}", file.name)?;
            stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            writeln!(stdout, " ({} bytes)", file.size.unwrap_or(0))?;
            stdout.reset()?;
        }
    }

    if entries.is_empty() {
        writeln!(stdout, "(empty directory)")?;
    }

    writeln!(stdout)?;
    writeln!(stdout, "Total: {} folders, {} files", folders.len(), files.len())?;
    Ok(())
}

/// Print the outcome of an index pass
pub fn print_refresh(stats: &RefreshStats, color: bool) -> io::Result<()> {
    let mut stdout = stdout(color);
    if stats.is_noop() {
        writeln!(stdout, "Index up to date (version {}, {} documents)", stats.version, stats.documents)?;
        return Ok(());
    }

    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(stdout, "Indexed version {}", stats.version)?;
    stdout.reset()?;
    writeln!(
        stdout,
        ": {} added, {} changed, {} removed, {} skipped ({} documents)",
        stats.added, stats.changed, stats.removed, stats.skipped, stats.documents
    )?;
    Ok(())
}

/// Display index statistics
pub fn print_stats(stats: &IndexStats, color: bool) -> io::Result<()> {
    let mut stdout = stdout(color);

    stdout.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(stdout, "Index Statistics")?;
    writeln!(stdout, "================")?;
    stdout.reset()?;
    writeln!(stdout)?;
    writeln!(stdout, "Root path:        {}", stats.root_path.display())?;
    match &stats.index_dir {
        Some(dir) => writeln!(stdout, "Index location:   {}", dir.display())?,
        None => writeln!(stdout, "Index location:   (memory only)")?,
    }
    writeln!(stdout, "Snapshot version: {}", stats.version)?;
    writeln!(stdout, "Document count:   {}", stats.doc_count)?;
    writeln!(stdout, "Distinct terms:   {}", stats.term_count)?;
    writeln!(stdout, "Occurrences:      {}", stats.occurrence_count)?;
    writeln!(stdout, "Source size:      {}", format_size(stats.source_bytes))?;
    if let Some(bytes) = stats.index_bytes {
        writeln!(stdout, "Index size:       {}", format_size(bytes))?;
    }
    Ok(())
}
