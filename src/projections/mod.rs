//! Query-driven denormalized projections of the listening history.
//!
//! Three independent schema+writer pairs share one canonical record
//! stream; each table's keys are derived from the single query it serves.

mod loader;
mod provisioner;
mod query;
mod schema;

pub use loader::{LoadSummary, ProjectionLoader, WriteError};
pub use provisioner::{drop_projection_tables, ensure_projection_tables, ProvisioningError};
pub use query::{Listener, QueryError, QueryExecutor, SessionPlay, SongPlay};
pub use schema::{
    ColumnDef, ProjectionSchema, SqlType, ALL_PROJECTIONS, SESSION_HISTORY, SONGPLAY_HISTORY,
    USER_HISTORY,
};
