//! Reading of raw event CSV fragments and writing of the consolidated file.
//!
//! Event exports carry a header row, and columns are selected by header
//! name rather than position, so the reader accepts both the wide raw
//! per-session export and the 11-column consolidated file. No filtering
//! happens here; non-playback rows flow through to the consolidator.

use super::models::{raw, EventRecord};
use anyhow::{bail, Context, Result};
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Lists the event CSV fragments under `dir`, sorted by path so batch
/// order is deterministic across runs.
pub fn discover_event_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("Error walking event data dir {:?}", dir))?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "csv")
        {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Reads one event file into raw positional rows.
///
/// Every canonical column must appear in the file's header; extra columns
/// are ignored. Fields keep their text form, empty fields included.
pub fn read_event_file(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .from_path(path)
        .with_context(|| format!("Error opening event file {:?}", path))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Error reading header of {:?}", path))?
        .clone();
    let mut column_indexes = [0usize; raw::FIELD_COUNT];
    for (field, index) in raw::HEADER.iter().zip(column_indexes.iter_mut()) {
        *index = match headers.iter().position(|h| h == *field) {
            Some(position) => position,
            None => bail!("Event file {:?} is missing column {:?}", path, field),
        };
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Error reading row of {:?}", path))?;
        let row = column_indexes
            .iter()
            .map(|&index| record.get(index).unwrap_or_default().to_string())
            .collect();
        rows.push(row);
    }
    debug!("Read {} rows from {:?}", rows.len(), path);
    Ok(rows)
}

/// Reads all event fragments under `dir`, one batch per file.
pub fn read_event_batches(dir: &Path) -> Result<Vec<Vec<Vec<String>>>> {
    let files = discover_event_files(dir)?;
    if files.is_empty() {
        bail!("No event CSV files found under {:?}", dir);
    }
    files.iter().map(|path| read_event_file(path)).collect()
}

/// Writes the canonical record set back out as the single consolidated
/// event file, header first, all fields quoted.
pub fn write_consolidated(path: &Path, records: &[EventRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_path(path)
        .with_context(|| format!("Error creating consolidated file {:?}", path))?;

    writer.write_record(raw::HEADER)?;
    for record in records {
        writer.write_record([
            record.artist.clone(),
            record.first_name.clone(),
            record.gender.clone(),
            record.item_in_session.to_string(),
            record.last_name.clone(),
            record.length.to_string(),
            record.level.as_str().to_string(),
            record.location.clone(),
            record.session_id.to_string(),
            record.song.clone(),
            record.user_id.to_string(),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("Error writing consolidated file {:?}", path))?;
    Ok(())
}
