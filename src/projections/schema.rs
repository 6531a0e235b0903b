//! Projection table definitions for the listening-history queries.
//!
//! Each projection is a denormalized table shaped to answer exactly one
//! query: its partition key matches the query's equality predicates so a
//! lookup addresses a single partition, and its clustering key both makes
//! rows within a partition uniquely addressable and scans in the order the
//! query wants its output. On the SQLite store the partition and clustering
//! keys concatenate into the composite primary key, and the upsert relies
//! on `INSERT OR REPLACE` for last-write-wins on key collision.

use rusqlite::Connection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
        }
    }
}

/// One column of a projection table.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: SqlType,
}

const fn text(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        sql_type: SqlType::Text,
    }
}

const fn integer(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        sql_type: SqlType::Integer,
    }
}

const fn real(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        sql_type: SqlType::Real,
    }
}

/// Declarative description of one projection table.
///
/// The key fields mirror the target query: `partition_key` carries the
/// query's equality predicates, `clustering_key` its uniqueness/ordering,
/// and `payload` the remaining selected output fields.
pub struct ProjectionSchema {
    pub table_name: &'static str,
    pub partition_key: &'static [ColumnDef],
    pub clustering_key: &'static [ColumnDef],
    pub payload: &'static [ColumnDef],
}

impl ProjectionSchema {
    /// Key columns in primary-key order: partition key, then clustering key.
    pub fn key_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.partition_key.iter().chain(self.clustering_key.iter())
    }

    /// All columns in table order: key columns, then payload.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.key_columns().chain(self.payload.iter())
    }

    pub fn create_table_sql(&self) -> String {
        let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (", self.table_name);
        for (index, column) in self.columns().enumerate() {
            if index > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&format!("{} {}", column.name, column.sql_type.as_sql()));
        }
        let key_names: Vec<&str> = self.key_columns().map(|c| c.name).collect();
        sql.push_str(&format!(", PRIMARY KEY ({}))", key_names.join(", ")));
        sql
    }

    pub fn drop_table_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.table_name)
    }

    /// Upsert statement over all columns; a row with the same key is fully
    /// overwritten.
    pub fn upsert_sql(&self) -> String {
        let column_names: Vec<&str> = self.columns().map(|c| c.name).collect();
        let placeholders: Vec<String> = (1..=column_names.len())
            .map(|index| format!("?{}", index))
            .collect();
        format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            self.table_name,
            column_names.join(", "),
            placeholders.join(", ")
        )
    }

    /// Returns whether the projection table exists in the store.
    pub fn exists(&self, conn: &Connection) -> rusqlite::Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [self.table_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

/// Lookup of artist, song and length by session and item index.
pub const SESSION_HISTORY: ProjectionSchema = ProjectionSchema {
    table_name: "session_history",
    partition_key: &[integer("session_id")],
    clustering_key: &[integer("item_in_session")],
    payload: &[text("artist"), text("song"), real("length")],
};

/// Plays of one user within one session, scanned in item order.
pub const SONGPLAY_HISTORY: ProjectionSchema = ProjectionSchema {
    table_name: "songplay_history",
    partition_key: &[integer("user_id"), integer("session_id")],
    clustering_key: &[integer("item_in_session")],
    payload: &[
        text("artist"),
        text("song"),
        text("first_name"),
        text("last_name"),
    ],
};

/// Distinct listeners of one song; user_id clusters so each listener
/// appears once no matter how often they played it.
pub const USER_HISTORY: ProjectionSchema = ProjectionSchema {
    table_name: "user_history",
    partition_key: &[text("song")],
    clustering_key: &[integer("user_id")],
    payload: &[text("first_name"), text("last_name")],
};

pub const ALL_PROJECTIONS: [&ProjectionSchema; 3] =
    [&SESSION_HISTORY, &SONGPLAY_HISTORY, &USER_HISTORY];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_sql_concatenates_keys() {
        assert_eq!(
            SESSION_HISTORY.create_table_sql(),
            "CREATE TABLE IF NOT EXISTS session_history (session_id INTEGER, \
             item_in_session INTEGER, artist TEXT, song TEXT, length REAL, \
             PRIMARY KEY (session_id, item_in_session))"
        );
    }

    #[test]
    fn test_composite_partition_key_precedes_clustering_key() {
        let key_names: Vec<&str> = SONGPLAY_HISTORY.key_columns().map(|c| c.name).collect();
        assert_eq!(key_names, vec!["user_id", "session_id", "item_in_session"]);
    }

    #[test]
    fn test_upsert_sql_covers_all_columns() {
        assert_eq!(
            USER_HISTORY.upsert_sql(),
            "INSERT OR REPLACE INTO user_history (song, user_id, first_name, last_name) \
             VALUES (?1, ?2, ?3, ?4)"
        );
    }

    #[test]
    fn test_all_projections_create_successfully() {
        let conn = Connection::open_in_memory().unwrap();
        for projection in ALL_PROJECTIONS {
            conn.execute(&projection.create_table_sql(), []).unwrap();
            assert!(projection.exists(&conn).unwrap());
        }
    }
}
