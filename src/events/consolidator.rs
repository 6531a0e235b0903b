//! Consolidation of raw event batches into one canonical record sequence.
//!
//! The consolidator is pure: it performs no I/O and only turns ordered
//! batches of raw text rows into ordered, type-coerced [`EventRecord`]s.
//! Rows describing non-playback events (empty artist) are dropped, and rows
//! that cannot be coerced are skipped and counted rather than failing the
//! whole pass.

use super::models::{raw, EventRecord, Level};
use thiserror::Error;
use tracing::warn;

/// A raw event row cannot be coerced into an [`EventRecord`].
#[derive(Debug, Error)]
pub enum MalformedRecordError {
    #[error("expected {expected} fields, got {actual}")]
    FieldCount { expected: usize, actual: usize },

    #[error("field {field} is not an integer: {value:?}")]
    NotAnInteger { field: &'static str, value: String },

    #[error("field {field} is not a number: {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("unknown level: {0:?}")]
    UnknownLevel(String),
}

/// Counters for one consolidation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsolidationSummary {
    /// Records emitted.
    pub consolidated: usize,
    /// Rows dropped because the artist field was empty.
    pub non_playback: usize,
    /// Rows skipped because a field could not be coerced.
    pub malformed: usize,
}

/// Merges ordered raw batches into one ordered canonical sequence.
pub struct Consolidator;

impl Consolidator {
    /// Consolidates `batches` into canonical records, preserving the input
    /// order within and across batches.
    pub fn consolidate(batches: &[Vec<Vec<String>>]) -> (Vec<EventRecord>, ConsolidationSummary) {
        let mut records = Vec::new();
        let mut summary = ConsolidationSummary::default();

        for batch in batches {
            for row in batch {
                if row.get(raw::ARTIST).is_some_and(|artist| artist.is_empty()) {
                    summary.non_playback += 1;
                    continue;
                }
                match coerce_row(row) {
                    Ok(record) => {
                        records.push(record);
                        summary.consolidated += 1;
                    }
                    Err(err) => {
                        warn!("Skipping malformed event row: {err}");
                        summary.malformed += 1;
                    }
                }
            }
        }

        (records, summary)
    }
}

fn coerce_row(row: &[String]) -> Result<EventRecord, MalformedRecordError> {
    if row.len() != raw::FIELD_COUNT {
        return Err(MalformedRecordError::FieldCount {
            expected: raw::FIELD_COUNT,
            actual: row.len(),
        });
    }

    Ok(EventRecord {
        artist: row[raw::ARTIST].clone(),
        first_name: row[raw::FIRST_NAME].clone(),
        gender: row[raw::GENDER].clone(),
        item_in_session: parse_int(raw::HEADER[raw::ITEM_IN_SESSION], &row[raw::ITEM_IN_SESSION])?,
        last_name: row[raw::LAST_NAME].clone(),
        length: parse_float(raw::HEADER[raw::LENGTH], &row[raw::LENGTH])?,
        level: Level::from_str(&row[raw::LEVEL])
            .ok_or_else(|| MalformedRecordError::UnknownLevel(row[raw::LEVEL].clone()))?,
        location: row[raw::LOCATION].clone(),
        session_id: parse_int(raw::HEADER[raw::SESSION_ID], &row[raw::SESSION_ID])?,
        song: row[raw::SONG].clone(),
        user_id: parse_int(raw::HEADER[raw::USER_ID], &row[raw::USER_ID])?,
    })
}

fn parse_int(field: &'static str, value: &str) -> Result<i64, MalformedRecordError> {
    value
        .trim()
        .parse()
        .map_err(|_| MalformedRecordError::NotAnInteger {
            field,
            value: value.to_string(),
        })
}

fn parse_float(field: &'static str, value: &str) -> Result<f64, MalformedRecordError> {
    value
        .trim()
        .parse()
        .map_err(|_| MalformedRecordError::NotANumber {
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playback_row(artist: &str, session_id: &str, item: &str) -> Vec<String> {
        vec![
            artist.to_string(),
            "Sylvie".to_string(),
            "F".to_string(),
            item.to_string(),
            "Cruz".to_string(),
            "495.3073".to_string(),
            "free".to_string(),
            "San Francisco-Oakland-Hayward, CA".to_string(),
            session_id.to_string(),
            "Music Matters".to_string(),
            "10".to_string(),
        ]
    }

    #[test]
    fn test_consolidate_coerces_types() {
        let batches = vec![vec![playback_row("Faithless", "338", "4")]];
        let (records, summary) = Consolidator::consolidate(&batches);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.artist, "Faithless");
        assert_eq!(record.session_id, 338);
        assert_eq!(record.item_in_session, 4);
        assert_eq!(record.user_id, 10);
        assert_eq!(record.level, Level::Free);
        assert!((record.length - 495.3073).abs() < 1e-9);
        assert_eq!(
            summary,
            ConsolidationSummary {
                consolidated: 1,
                non_playback: 0,
                malformed: 0
            }
        );
    }

    #[test]
    fn test_consolidate_drops_non_playback_rows() {
        let batches = vec![vec![
            playback_row("", "338", "3"),
            playback_row("Faithless", "338", "4"),
        ]];
        let (records, summary) = Consolidator::consolidate(&batches);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].artist, "Faithless");
        assert_eq!(summary.non_playback, 1);
    }

    #[test]
    fn test_consolidate_skips_and_counts_malformed_rows() {
        let mut bad_session = playback_row("Faithless", "338", "4");
        bad_session[raw::SESSION_ID] = "not-a-number".to_string();
        let mut bad_length = playback_row("Faithless", "338", "5");
        bad_length[raw::LENGTH] = "long".to_string();
        let mut bad_level = playback_row("Faithless", "338", "6");
        bad_level[raw::LEVEL] = "premium".to_string();
        let short_row = vec!["Faithless".to_string()];

        let batches = vec![vec![
            bad_session,
            bad_length,
            bad_level,
            short_row,
            playback_row("Faithless", "338", "4"),
        ]];
        let (records, summary) = Consolidator::consolidate(&batches);

        assert_eq!(records.len(), 1);
        assert_eq!(summary.malformed, 4);
        assert_eq!(summary.consolidated, 1);
    }

    #[test]
    fn test_consolidate_preserves_order_across_batches() {
        let batches = vec![
            vec![
                playback_row("Faithless", "338", "0"),
                playback_row("Faithless", "338", "1"),
            ],
            vec![playback_row("Faithless", "338", "2")],
        ];
        let (records, _) = Consolidator::consolidate(&batches);

        let items: Vec<i64> = records.iter().map(|r| r.item_in_session).collect();
        assert_eq!(items, vec![0, 1, 2]);
    }
}
