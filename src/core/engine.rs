use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::core::{
    blossom,
    error::{CycleError, PreconditionViolation},
    graph::CompatibilityGraph,
    mapper::map_result,
};
use crate::models::{CycleId, CycleRecord, CycleStage, ExclusionHistory, MatchingResult, Signup};
use crate::services::{HistoryStore, Notifier, SignupSource, StoreError};

/// Outcome of a successful cycle run
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: CycleId,
    pub run_id: Uuid,
    pub stage: CycleStage,
    /// True when the cycle was already committed and its stored result was
    /// announced again instead of being recomputed
    pub replayed: bool,
    pub result: MatchingResult,
}

/// Pair the signups of one cycle against an exclusion history snapshot
///
/// This is the pure part of a run: build the compatibility graph, drop
/// previously used pairs, solve, map back to participants. Zero signups
/// short-circuit to an empty result without touching the solver.
pub fn pair_signups(
    cycle: CycleId,
    signups: Vec<Signup>,
    history: &ExclusionHistory,
) -> Result<MatchingResult, CycleError> {
    if signups.is_empty() {
        return Ok(MatchingResult::default());
    }

    let signup_count = signups.len();
    let graph = CompatibilityGraph::build(signups)
        .map_err(|source| CycleError::Precondition {
            cycle,
            stage: CycleStage::SignupsFrozen,
            source,
        })?
        .exclude(history);

    if graph.vertex_count() != signup_count {
        return Err(CycleError::Precondition {
            cycle,
            stage: CycleStage::GraphBuilt,
            source: PreconditionViolation::GraphSizeMismatch {
                signups: signup_count,
                vertices: graph.vertex_count(),
            },
        });
    }

    let matching = blossom::solve(graph.vertex_count(), &graph.edge_indices())
        .map_err(|source| CycleError::Solver { cycle, source })?;
    let result =
        map_result(&graph, &matching).map_err(|source| CycleError::Solver { cycle, source })?;

    tracing::info!(
        "Cycle {}: {} eligible edges, {} pairs, {} unmatched",
        cycle,
        graph.edges().len(),
        result.pairs.len(),
        result.unmatched.len()
    );

    Ok(result)
}

/// Runs pairing cycles end to end
///
/// # Pipeline Stages
/// 1. Skip straight to announcement if the cycle is already committed
/// 2. Require frozen signups, then read signups and the history snapshot
/// 3. Build graph, filter, solve, map
/// 4. Commit pairs and the processed marker in one step
/// 5. Announce
///
/// The engine does not serialise runs; callers must not run the same
/// activity concurrently.
#[derive(Clone)]
pub struct PairingEngine {
    signups: Arc<dyn SignupSource>,
    history: Arc<dyn HistoryStore>,
    notifier: Arc<dyn Notifier>,
}

impl PairingEngine {
    pub fn new(
        signups: Arc<dyn SignupSource>,
        history: Arc<dyn HistoryStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            signups,
            history,
            notifier,
        }
    }

    /// Run (or replay) the pairing cycle `cycle`
    ///
    /// Fatal errors are logged with the cycle and stage reached before being
    /// returned.
    pub async fn run_cycle(&self, cycle: CycleId) -> Result<CycleReport, CycleError> {
        tracing::info!("Starting pairing cycle {}", cycle);

        let outcome = self.execute(cycle).await;
        match &outcome {
            Ok(report) => tracing::info!(
                cycle = %report.cycle,
                run_id = %report.run_id,
                replayed = report.replayed,
                "Pairing cycle finished with {} pairs and {} unmatched",
                report.result.pairs.len(),
                report.result.unmatched.len()
            ),
            Err(e) => tracing::error!(
                cycle = %e.cycle(),
                stage = %e.stage(),
                history_committed = e.history_committed(),
                "Pairing cycle aborted: {}",
                e
            ),
        }
        outcome
    }

    async fn execute(&self, cycle: CycleId) -> Result<CycleReport, CycleError> {
        let store_err =
            |stage: CycleStage| move |source: StoreError| CycleError::Store { cycle, stage, source };

        if let Some(record) = self
            .history
            .committed_cycle(cycle)
            .await
            .map_err(store_err(CycleStage::SignupsOpen))?
        {
            tracing::warn!(
                "Cycle {} was already committed by run {}, replaying stored result",
                cycle,
                record.run_id
            );
            self.announce(cycle, &record.result).await?;
            return Ok(CycleReport {
                cycle,
                run_id: record.run_id,
                stage: CycleStage::Notified,
                replayed: true,
                result: record.result,
            });
        }

        if self.signups.registration_open(cycle).await {
            return Err(CycleError::Precondition {
                cycle,
                stage: CycleStage::SignupsOpen,
                source: PreconditionViolation::SignupsOpen,
            });
        }

        let signups = self
            .signups
            .get_signups(cycle)
            .await
            .map_err(store_err(CycleStage::SignupsFrozen))?;
        let history = self
            .history
            .snapshot()
            .await
            .map_err(store_err(CycleStage::SignupsFrozen))?;

        tracing::info!(
            "Cycle {}: {} signups, {} pairs in exclusion history",
            cycle,
            signups.len(),
            history.len()
        );

        let result = pair_signups(cycle, signups, &history)?;

        let record = CycleRecord {
            cycle,
            run_id: Uuid::new_v4(),
            result,
            committed_at: Utc::now(),
        };
        self.history
            .commit(&record)
            .await
            .map_err(store_err(CycleStage::Matched))?;

        tracing::info!(
            "Cycle {}: committed {} new pairs to history (run {})",
            cycle,
            record.result.pairs.len(),
            record.run_id
        );

        self.announce(cycle, &record.result).await?;

        Ok(CycleReport {
            cycle,
            run_id: record.run_id,
            stage: CycleStage::Notified,
            replayed: false,
            result: record.result,
        })
    }

    async fn announce(&self, cycle: CycleId, result: &MatchingResult) -> Result<(), CycleError> {
        self.notifier
            .announce(cycle, result)
            .await
            .map_err(|source| CycleError::Notification { cycle, source })
    }
}
