//! Fixed-interval trigger for the pipeline.
//!
//! Cycles are awaited inline, so cycles never overlap. Ticks missed while a
//! cycle runs collapse into one overdue tick that fires as soon as it ends.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::pipeline::{CycleOutcome, Pipeline};
use crate::state::RunCounters;

/// Runs a cycle on every tick until `shutdown` resolves, then returns the final counters.
/// The first tick fires immediately. Shutdown is only observed between cycles.
pub async fn run_scheduler<F>(pipeline: &Pipeline, period: Duration, shutdown: F) -> RunCounters
where
    F: Future<Output = ()>,
{
    let mut counters = RunCounters::default();
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    info!(interval_secs = period.as_secs(), "Scheduler started");

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Shutdown requested, stopping scheduler");
                break;
            }
            _ = ticker.tick() => {
                info!(
                    cycle = counters.cycle_count + 1,
                    total_fetched = counters.total_candidates_fetched,
                    "Fetching companies"
                );

                match pipeline.run_cycle(&mut counters).await {
                    CycleOutcome::Completed(summary) => {
                        if let Ok(json) = serde_json::to_string(&summary) {
                            debug!(summary = %json, "Cycle summary");
                        }
                    }
                    CycleOutcome::Aborted { stage, error } => {
                        debug!(stage = ?stage, code = error.code(), "Output files left unchanged");
                    }
                }

                info!("-----------------------------------------------");
            }
        }
    }

    counters
}
