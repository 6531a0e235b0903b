//! The three fixed reads, one per projection.
//!
//! Each query is a direct equality read on its projection's partition key,
//! ordered by the clustering key where the query cares about order. A key
//! that matches no row is an empty result, not an error.

use crate::projections::schema::{SESSION_HISTORY, SONGPLAY_HISTORY, USER_HISTORY};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

/// A projection read failed. The diagnostic is surfaced to the operator
/// alongside an empty result; stale data is never substituted.
#[derive(Debug, Error)]
#[error("Query against {projection} failed: {source}")]
pub struct QueryError {
    pub projection: &'static str,
    #[source]
    source: rusqlite::Error,
}

/// What played at one session item.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlay {
    pub artist: String,
    pub song: String,
    pub length: f64,
}

/// One play within a user's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongPlay {
    pub artist: String,
    pub song: String,
    pub first_name: String,
    pub last_name: String,
}

/// A user who played a song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
    pub first_name: String,
    pub last_name: String,
}

/// Issues the fixed parameterized reads against the projection tables.
pub struct QueryExecutor<'conn> {
    conn: &'conn Connection,
}

impl<'conn> QueryExecutor<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// The artist, song and length heard at `item_in_session` of
    /// `session_id`. At most one row exists for the full key.
    pub fn session_lookup(
        &self,
        session_id: i64,
        item_in_session: i64,
    ) -> Result<Option<SessionPlay>, QueryError> {
        self.conn
            .query_row(
                &format!(
                    "SELECT artist, song, length FROM {} \
                     WHERE session_id = ?1 AND item_in_session = ?2",
                    SESSION_HISTORY.table_name
                ),
                params![session_id, item_in_session],
                |row| {
                    Ok(SessionPlay {
                        artist: row.get(0)?,
                        song: row.get(1)?,
                        length: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(|source| QueryError {
                projection: SESSION_HISTORY.table_name,
                source,
            })
    }

    /// Every play of `user_id` within `session_id`, ordered by item index.
    pub fn songplay_lookup(
        &self,
        user_id: i64,
        session_id: i64,
    ) -> Result<Vec<SongPlay>, QueryError> {
        let run = || -> rusqlite::Result<Vec<SongPlay>> {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT artist, song, first_name, last_name FROM {} \
                 WHERE user_id = ?1 AND session_id = ?2 ORDER BY item_in_session",
                SONGPLAY_HISTORY.table_name
            ))?;
            let rows = stmt
                .query_map(params![user_id, session_id], |row| {
                    Ok(SongPlay {
                        artist: row.get(0)?,
                        song: row.get(1)?,
                        first_name: row.get(2)?,
                        last_name: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        };
        run().map_err(|source| QueryError {
            projection: SONGPLAY_HISTORY.table_name,
            source,
        })
    }

    /// Every user who played `song`, one entry per user id.
    pub fn listeners_of(&self, song: &str) -> Result<Vec<Listener>, QueryError> {
        let run = || -> rusqlite::Result<Vec<Listener>> {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT first_name, last_name FROM {} WHERE song = ?1 ORDER BY user_id",
                USER_HISTORY.table_name
            ))?;
            let rows = stmt
                .query_map(params![song], |row| {
                    Ok(Listener {
                        first_name: row.get(0)?,
                        last_name: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        };
        run().map_err(|source| QueryError {
            projection: USER_HISTORY.table_name,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventRecord, Level};
    use crate::projections::loader::ProjectionLoader;
    use crate::projections::provisioner::ensure_projection_tables;

    fn record(
        user_id: i64,
        session_id: i64,
        item_in_session: i64,
        first_name: &str,
        song: &str,
    ) -> EventRecord {
        EventRecord {
            artist: "Faithless".to_string(),
            first_name: first_name.to_string(),
            gender: "F".to_string(),
            item_in_session,
            last_name: "Cruz".to_string(),
            length: 495.3073,
            level: Level::Paid,
            location: "Atlanta-Sandy Springs-Roswell, GA".to_string(),
            session_id,
            song: song.to_string(),
            user_id,
        }
    }

    fn loaded_conn(records: &[EventRecord]) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_projection_tables(&conn).unwrap();
        let summary = ProjectionLoader::new(&conn).unwrap().load(records);
        assert_eq!(summary.write_failures, 0);
        conn
    }

    #[test]
    fn test_session_lookup_round_trip() {
        let mut faithless = record(10, 338, 4, "Sylvie", "Music Matters");
        faithless.length = 495.3;
        let conn = loaded_conn(&[faithless]);

        let play = QueryExecutor::new(&conn)
            .session_lookup(338, 4)
            .unwrap()
            .unwrap();
        assert_eq!(play.artist, "Faithless");
        assert_eq!(play.song, "Music Matters");
        assert!((play.length - 495.3).abs() < 1e-9);
    }

    #[test]
    fn test_session_lookup_missing_key_is_none() {
        let conn = loaded_conn(&[]);
        assert!(QueryExecutor::new(&conn)
            .session_lookup(338, 4)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_songplay_lookup_orders_by_item_in_session() {
        // Loaded out of order on purpose.
        let conn = loaded_conn(&[
            record(10, 182, 2, "Sylvie", "Third"),
            record(10, 182, 0, "Sylvie", "First"),
            record(10, 182, 1, "Sylvie", "Second"),
        ]);

        let plays = QueryExecutor::new(&conn).songplay_lookup(10, 182).unwrap();
        let songs: Vec<&str> = plays.iter().map(|p| p.song.as_str()).collect();
        assert_eq!(songs, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_songplay_lookup_filters_both_partition_fields() {
        let conn = loaded_conn(&[
            record(10, 182, 0, "Sylvie", "Keep"),
            record(10, 183, 0, "Sylvie", "Other session"),
            record(11, 182, 0, "Jacqueline", "Other user"),
        ]);

        let plays = QueryExecutor::new(&conn).songplay_lookup(10, 182).unwrap();
        assert_eq!(plays.len(), 1);
        assert_eq!(plays[0].song, "Keep");
    }

    #[test]
    fn test_listeners_of_returns_each_user_once() {
        let song = "All Hands Against His Own";
        // User 80 played the song in two different sessions.
        let conn = loaded_conn(&[
            record(80, 611, 0, "Tegan", song),
            record(80, 987, 3, "Tegan", song),
            record(95, 152, 1, "Sara", song),
        ]);

        let listeners = QueryExecutor::new(&conn).listeners_of(song).unwrap();
        assert_eq!(
            listeners,
            vec![
                Listener {
                    first_name: "Tegan".to_string(),
                    last_name: "Cruz".to_string()
                },
                Listener {
                    first_name: "Sara".to_string(),
                    last_name: "Cruz".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_listeners_of_unknown_song_is_empty() {
        let conn = loaded_conn(&[record(10, 182, 0, "Sylvie", "Music Matters")]);
        let listeners = QueryExecutor::new(&conn)
            .listeners_of("No Such Song")
            .unwrap();
        assert!(listeners.is_empty());
    }
}
