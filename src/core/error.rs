use crate::models::{CycleId, CycleStage, ParticipantId};
use crate::services::{NotifyError, StoreError};
use thiserror::Error;

/// Malformed input to a pairing run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionViolation {
    #[error("registration is still open, signups are not frozen")]
    SignupsOpen,

    #[error("participant {0} signed up more than once")]
    DuplicateParticipant(ParticipantId),

    #[error("graph has {vertices} vertices for {signups} signups")]
    GraphSizeMismatch { signups: usize, vertices: usize },
}

/// Errors raised by the maximum matching solver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    #[error("duplicate vertex: {0}")]
    DuplicateVertex(String),

    #[error("edge references unknown vertex {vertex} (graph has {vertex_count} vertices)")]
    UnknownVertex { vertex: String, vertex_count: usize },

    #[error("self loop on vertex {0}")]
    SelfLoop(String),

    #[error("duplicate edge {0} - {1}")]
    DuplicateEdge(String, String),

    #[error("solver produced an invalid matching: {0}")]
    InvalidMatching(String),
}

/// Fatal failure of a cycle run
///
/// Every variant carries the cycle and is reported with the stage it reached.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("cycle {cycle}: precondition violated: {source}")]
    Precondition {
        cycle: CycleId,
        stage: CycleStage,
        #[source]
        source: PreconditionViolation,
    },

    #[error("cycle {cycle}: solver failed: {source}")]
    Solver {
        cycle: CycleId,
        #[source]
        source: SolverError,
    },

    #[error("cycle {cycle}: store failure at {stage}: {source}")]
    Store {
        cycle: CycleId,
        stage: CycleStage,
        #[source]
        source: StoreError,
    },

    #[error("cycle {cycle}: notification failed after history commit: {source}")]
    Notification {
        cycle: CycleId,
        #[source]
        source: NotifyError,
    },
}

impl CycleError {
    pub fn cycle(&self) -> CycleId {
        match self {
            CycleError::Precondition { cycle, .. }
            | CycleError::Solver { cycle, .. }
            | CycleError::Store { cycle, .. }
            | CycleError::Notification { cycle, .. } => *cycle,
        }
    }

    /// Last stage the run reached before failing
    pub fn stage(&self) -> CycleStage {
        match self {
            CycleError::Precondition { stage, .. } | CycleError::Store { stage, .. } => *stage,
            CycleError::Solver { .. } => CycleStage::GraphBuilt,
            CycleError::Notification { .. } => CycleStage::HistoryCommitted,
        }
    }

    /// True when the exclusion history may already contain this cycle's pairs
    pub fn history_committed(&self) -> bool {
        matches!(self, CycleError::Notification { .. })
    }
}
