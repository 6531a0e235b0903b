//! Idempotent provisioning and best-effort teardown of projection tables.

use super::schema::ALL_PROJECTIONS;
use rusqlite::Connection;
use thiserror::Error;
use tracing::{info, warn};

/// A projection table could not be created. Fatal: the pipeline must not
/// start loading against a partial schema.
#[derive(Debug, Error)]
#[error("Could not provision projection table {table}: {source}")]
pub struct ProvisioningError {
    pub table: &'static str,
    #[source]
    source: rusqlite::Error,
}

/// Creates every projection table if absent. Safe to call against a store
/// that already holds the tables from a prior run.
pub fn ensure_projection_tables(conn: &Connection) -> Result<(), ProvisioningError> {
    for projection in ALL_PROJECTIONS {
        conn.execute(&projection.create_table_sql(), [])
            .map_err(|source| ProvisioningError {
                table: projection.table_name,
                source,
            })?;
    }
    info!("Provisioned {} projection tables", ALL_PROJECTIONS.len());
    Ok(())
}

/// Drops every projection table. Failures are logged and swallowed;
/// teardown never fails the run.
pub fn drop_projection_tables(conn: &Connection) {
    for projection in ALL_PROJECTIONS {
        if let Err(err) = conn.execute(&projection.drop_table_sql(), []) {
            warn!(
                "Could not drop projection table {}: {err}",
                projection.table_name
            );
        }
    }
}
