//! Cycle orchestration: one fetch → validate → classify → persist pass.
//!
//! Flow: build prompt → every fetcher concurrently → merge → both board
//!       probes concurrently → classify → write output files.
//!
//! `run_cycle` is the single error boundary: whatever fails inside a cycle is
//! logged and reported as `CycleOutcome::Aborted`, never propagated.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::boards::BoardProbe;
use crate::classifier::{classify, Classification};
use crate::errors::AppError;
use crate::llm_client::prompts::build_discovery_prompt;
use crate::llm_client::CandidateFetcher;
use crate::models::candidate::CompanyCandidate;
use crate::sink::OutputSink;
use crate::state::RunCounters;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Everything one cycle needs. Built once at startup and shared by every tick.
pub struct Pipeline {
    pub fetchers: Vec<Arc<dyn CandidateFetcher>>,
    pub greenhouse: BoardProbe,
    pub lever: BoardProbe,
    pub sink: OutputSink,
    /// Companies the backends are told to leave out.
    pub exclusions: Vec<CompanyCandidate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStage {
    Fetch,
    Persist,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendCount {
    pub backend: &'static str,
    pub candidates: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub backends: Vec<BackendCount>,
    pub candidates: usize,
    pub classification: Classification,
    pub elapsed_ms: i64,
}

#[derive(Debug)]
pub enum CycleOutcome {
    Completed(CycleSummary),
    Aborted { stage: CycleStage, error: AppError },
}

// ────────────────────────────────────────────────────────────────────────────
// Cycle
// ────────────────────────────────────────────────────────────────────────────

impl Pipeline {
    /// Runs one cycle. Never fails; the outcome says how far it got.
    pub async fn run_cycle(&self, counters: &mut RunCounters) -> CycleOutcome {
        let cycle = counters.begin_cycle();
        let span = info_span!("cycle", n = cycle, id = %Uuid::new_v4());

        async move {
            info!(
                total_fetched = counters.total_candidates_fetched,
                "Cycle started"
            );

            match self.execute(cycle, counters).await {
                Ok(summary) => {
                    info!(
                        candidates = summary.candidates,
                        elapsed_ms = summary.elapsed_ms,
                        "Cycle completed"
                    );
                    CycleOutcome::Completed(summary)
                }
                Err((stage, err)) => {
                    error!(
                        cycle,
                        stage = ?stage,
                        code = err.code(),
                        error = %err,
                        "Cycle aborted"
                    );
                    CycleOutcome::Aborted { stage, error: err }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        cycle: u64,
        counters: &mut RunCounters,
    ) -> Result<CycleSummary, (CycleStage, AppError)> {
        let started_at = Utc::now();

        // Step 1: Ask every backend for candidates
        let prompt = build_discovery_prompt(&self.exclusions);
        let results = join_all(self.fetchers.iter().map(|fetcher| {
            let prompt = prompt.as_str();
            async move { (fetcher.name(), fetcher.fetch(prompt).await) }
        }))
        .await;

        let mut backends = Vec::with_capacity(results.len());
        let mut candidates = Vec::new();
        for (backend, result) in results {
            let batch = result
                .map_err(|source| (CycleStage::Fetch, AppError::Upstream { backend, source }))?;

            if batch.is_empty() {
                warn!(backend, rejected = batch.rejected, "Backend returned no usable candidates");
            } else {
                info!(
                    backend,
                    candidates = batch.len(),
                    rejected = batch.rejected,
                    "Candidates fetched"
                );
            }

            for candidate in &batch.candidates {
                debug!(
                    backend,
                    company = %candidate.company_name,
                    board = %candidate.registered_name,
                    "Candidate proposed"
                );
            }

            backends.push(BackendCount {
                backend,
                candidates: batch.len(),
                rejected: batch.rejected,
            });
            candidates.extend(batch.candidates);
        }
        counters.record_fetched(candidates.len());

        // Step 2: Probe both platforms with the proposed company names
        let names: Vec<String> = candidates.iter().map(|c| c.company_name.clone()).collect();
        let (greenhouse, lever) = tokio::join!(
            self.greenhouse.validate(&names),
            self.lever.validate(&names)
        );

        // Step 3: Classify
        let classification = classify(&greenhouse.found, &lever.found);
        info!(
            both = classification.both.len(),
            only_greenhouse = classification.only_greenhouse.len(),
            only_lever = classification.only_lever.len(),
            total = classification.total(),
            "Companies classified"
        );

        // Step 4: Persist
        self.sink
            .write(&classification)
            .map_err(|err| (CycleStage::Persist, err))?;

        Ok(CycleSummary {
            cycle,
            started_at,
            backends,
            candidates: candidates.len(),
            elapsed_ms: (Utc::now() - started_at).num_milliseconds(),
            classification,
        })
    }
}
