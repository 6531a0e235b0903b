//! Fan-out of canonical records into the projection tables.
//!
//! Each record is written independently to all three projections, one row
//! per projection, keyed by (partition key, clustering key). Writes are
//! upserts: a key collision fully overwrites the previous row. A failed
//! write is isolated and counted; there is no retry and no rollback of the
//! record's rows in the other projections.

use crate::events::EventRecord;
use crate::projections::schema::{SESSION_HISTORY, SONGPLAY_HISTORY, USER_HISTORY};
use rusqlite::{params, Connection, Statement};
use thiserror::Error;
use tracing::{info, warn};

/// A single projection write failed.
#[derive(Debug, Error)]
#[error("Could not write {projection} row: {source}")]
pub struct WriteError {
    pub projection: &'static str,
    #[source]
    source: rusqlite::Error,
}

/// Counters for one load pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Records consumed from the canonical sequence.
    pub records: usize,
    /// Projection rows written.
    pub rows_written: usize,
    /// Projection writes that failed and were skipped.
    pub write_failures: usize,
}

/// Writes canonical records into the three projection tables.
pub struct ProjectionLoader<'conn> {
    session_history: Statement<'conn>,
    songplay_history: Statement<'conn>,
    user_history: Statement<'conn>,
}

impl<'conn> ProjectionLoader<'conn> {
    /// Prepares the upsert statements. Fails if the projection tables have
    /// not been provisioned.
    pub fn new(conn: &'conn Connection) -> Result<Self, WriteError> {
        let prepare = |table: &'static str, sql: String| {
            conn.prepare(&sql).map_err(|source| WriteError {
                projection: table,
                source,
            })
        };
        Ok(Self {
            session_history: prepare(SESSION_HISTORY.table_name, SESSION_HISTORY.upsert_sql())?,
            songplay_history: prepare(SONGPLAY_HISTORY.table_name, SONGPLAY_HISTORY.upsert_sql())?,
            user_history: prepare(USER_HISTORY.table_name, USER_HISTORY.upsert_sql())?,
        })
    }

    /// Loads the full record sequence, one write per record per projection.
    pub fn load(&mut self, records: &[EventRecord]) -> LoadSummary {
        let mut summary = LoadSummary::default();
        for record in records {
            summary.records += 1;
            for result in [
                self.write_session_history(record),
                self.write_songplay_history(record),
                self.write_user_history(record),
            ] {
                match result {
                    Ok(()) => summary.rows_written += 1,
                    Err(err) => {
                        warn!("{err}");
                        summary.write_failures += 1;
                    }
                }
            }
        }
        info!(
            "Loaded {} records: {} rows written, {} write failures",
            summary.records, summary.rows_written, summary.write_failures
        );
        summary
    }

    fn write_session_history(&mut self, record: &EventRecord) -> Result<(), WriteError> {
        self.session_history
            .execute(params![
                record.session_id,
                record.item_in_session,
                record.artist,
                record.song,
                record.length,
            ])
            .map_err(|source| WriteError {
                projection: SESSION_HISTORY.table_name,
                source,
            })?;
        Ok(())
    }

    fn write_songplay_history(&mut self, record: &EventRecord) -> Result<(), WriteError> {
        self.songplay_history
            .execute(params![
                record.user_id,
                record.session_id,
                record.item_in_session,
                record.artist,
                record.song,
                record.first_name,
                record.last_name,
            ])
            .map_err(|source| WriteError {
                projection: SONGPLAY_HISTORY.table_name,
                source,
            })?;
        Ok(())
    }

    fn write_user_history(&mut self, record: &EventRecord) -> Result<(), WriteError> {
        self.user_history
            .execute(params![
                record.song,
                record.user_id,
                record.first_name,
                record.last_name,
            ])
            .map_err(|source| WriteError {
                projection: USER_HISTORY.table_name,
                source,
            })?;
        Ok(())
    }
}
