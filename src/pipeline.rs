//! Sequential pipeline orchestration: consolidate, provision, load, query.
//!
//! Stages run strictly in order on one blocking store connection. Row-level
//! failures are aggregated into the report; schema-level failures abort the
//! run before any load happens.

use crate::config::{AppConfig, QueryParams};
use crate::events::{read_event_batches, write_consolidated, ConsolidationSummary, Consolidator};
use crate::projections::{
    drop_projection_tables, ensure_projection_tables, Listener, LoadSummary, ProjectionLoader,
    QueryExecutor, SessionPlay, SongPlay,
};
use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{error, info};

/// Answers to the three fixed acceptance queries.
#[derive(Debug, Default)]
pub struct QueryAnswers {
    pub session_play: Option<SessionPlay>,
    pub songplays: Vec<SongPlay>,
    pub listeners: Vec<Listener>,
}

/// Outcome of one full rebuild.
#[derive(Debug)]
pub struct PipelineReport {
    pub consolidation: ConsolidationSummary,
    pub load: LoadSummary,
    pub answers: QueryAnswers,
}

/// Runs one full batch rebuild against `conn` and answers the configured
/// queries.
pub fn run(config: &AppConfig, conn: &Connection) -> Result<PipelineReport> {
    let batches = read_event_batches(&config.event_data_dir)?;
    info!(
        "Read {} event file(s) from {:?}",
        batches.len(),
        config.event_data_dir
    );

    let (records, consolidation) = Consolidator::consolidate(&batches);
    info!(
        "Consolidated {} records ({} non-playback dropped, {} malformed skipped)",
        consolidation.consolidated, consolidation.non_playback, consolidation.malformed
    );

    if let Some(out) = &config.consolidated_out {
        write_consolidated(out, &records)?;
        info!("Wrote consolidated event file to {:?}", out);
    }

    ensure_projection_tables(conn)?;

    let load = ProjectionLoader::new(conn)
        .context("Could not prepare projection writers")?
        .load(&records);

    let answers = run_queries(conn, &config.queries);

    Ok(PipelineReport {
        consolidation,
        load,
        answers,
    })
}

/// Issues the three acceptance queries. A failed query is logged and
/// answered with an empty result; stale data is never substituted.
fn run_queries(conn: &Connection, params: &QueryParams) -> QueryAnswers {
    let executor = QueryExecutor::new(conn);
    let mut answers = QueryAnswers::default();

    match executor.session_lookup(params.session_id, params.item_in_session) {
        Ok(play) => answers.session_play = play,
        Err(err) => error!("{err}"),
    }
    match executor.songplay_lookup(params.user_id, params.user_session_id) {
        Ok(plays) => answers.songplays = plays,
        Err(err) => error!("{err}"),
    }
    match executor.listeners_of(&params.song) {
        Ok(listeners) => answers.listeners = listeners,
        Err(err) => error!("{err}"),
    }

    answers
}

/// Best-effort teardown: drops the projection tables, logging failures
/// without propagating them.
pub fn teardown(conn: &Connection) {
    drop_projection_tables(conn);
    info!("Dropped projection tables");
}
