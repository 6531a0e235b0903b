//! Raw event ingestion and consolidation.
//!
//! Per-session event CSV fragments are read into ordered raw batches, then
//! consolidated into one canonical, type-coerced record sequence that the
//! projection loader consumes.

mod consolidator;
mod models;
mod reader;

pub use consolidator::{ConsolidationSummary, Consolidator, MalformedRecordError};
pub use models::{raw, EventRecord, Level};
pub use reader::{discover_event_files, read_event_batches, read_event_file, write_consolidated};
