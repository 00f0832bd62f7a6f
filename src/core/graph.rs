use std::collections::HashSet;

use crate::core::error::PreconditionViolation;
use crate::models::{ExclusionHistory, ParticipantId, Signup, TimeslotId};

/// Edge between two vertex indices (`low < high`) with their shared timeslots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibleEdge {
    pub low: usize,
    pub high: usize,
    pub common_timeslots: Vec<TimeslotId>,
}

/// Undirected graph over the signups of one cycle
///
/// Vertex `i` is `signups[i]`; the signup order fixed by the caller is kept so
/// that the solver sees vertices in a stable order.
#[derive(Debug, Clone)]
pub struct CompatibilityGraph {
    signups: Vec<Signup>,
    edges: Vec<CompatibleEdge>,
}

impl CompatibilityGraph {
    /// Build the graph with an edge for every pair sharing a timeslot
    ///
    /// Pairwise comparison is O(n²), which is fine for a weekly sign-up list.
    pub fn build(signups: Vec<Signup>) -> Result<Self, PreconditionViolation> {
        let mut seen = HashSet::with_capacity(signups.len());
        for signup in &signups {
            if !seen.insert(&signup.participant_id) {
                return Err(PreconditionViolation::DuplicateParticipant(
                    signup.participant_id.clone(),
                ));
            }
        }

        let mut edges = Vec::new();
        for (i, a) in signups.iter().enumerate() {
            for (j, b) in signups.iter().enumerate().skip(i + 1) {
                let common_timeslots = a.common_timeslots(b);
                if !common_timeslots.is_empty() {
                    edges.push(CompatibleEdge {
                        low: i,
                        high: j,
                        common_timeslots,
                    });
                }
            }
        }

        tracing::debug!(
            "Built compatibility graph: {} vertices, {} edges",
            signups.len(),
            edges.len()
        );

        Ok(Self { signups, edges })
    }

    /// Drop every edge whose pair was already used in a prior cycle
    pub fn exclude(mut self, history: &ExclusionHistory) -> Self {
        let before = self.edges.len();
        let signups = &self.signups;
        self.edges.retain(|edge| {
            !history.contains(
                &signups[edge.low].participant_id,
                &signups[edge.high].participant_id,
            )
        });

        tracing::debug!(
            "Exclusion filter removed {} of {} edges",
            before - self.edges.len(),
            before
        );
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.signups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signups.is_empty()
    }

    pub fn signups(&self) -> &[Signup] {
        &self.signups
    }

    pub fn participant(&self, vertex: usize) -> &ParticipantId {
        &self.signups[vertex].participant_id
    }

    pub fn edges(&self) -> &[CompatibleEdge] {
        &self.edges
    }

    /// Edge list in the shape the solver takes
    pub fn edge_indices(&self) -> Vec<(usize, usize)> {
        self.edges.iter().map(|e| (e.low, e.high)).collect()
    }

    pub fn edge_between(&self, a: usize, b: usize) -> Option<&CompatibleEdge> {
        let (low, high) = (a.min(b), a.max(b));
        self.edges.iter().find(|e| e.low == low && e.high == high)
    }
}
