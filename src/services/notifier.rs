use async_trait::async_trait;
use std::sync::Arc;

use super::{Notifier, NotifyError, ParticipantDirectory};
use crate::models::{CycleId, MatchingResult, ParticipantId};

/// Notifier that announces results as structured log events
///
/// Delivery to chat channels lives outside this service; downstream
/// consumers pick the events up from the log stream.
pub struct LogNotifier {
    directory: Arc<dyn ParticipantDirectory>,
}

impl LogNotifier {
    pub fn new(directory: Arc<dyn ParticipantDirectory>) -> Self {
        Self { directory }
    }

    /// Falls back to the raw id when the directory does not know a participant
    async fn name_of(&self, id: &ParticipantId) -> String {
        match self.directory.resolve(id).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!("Could not resolve participant {}: {}", id, e);
                id.to_string()
            }
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn announce(&self, cycle: CycleId, result: &MatchingResult) -> Result<(), NotifyError> {
        if result.pairs.is_empty() {
            tracing::info!(cycle = %cycle, "No pairs this cycle");
        }

        for pair in &result.pairs {
            let first = self.name_of(&pair.first).await;
            let second = self.name_of(&pair.second).await;
            let timeslots: Vec<u16> = pair.common_timeslots.iter().map(|t| t.0).collect();
            tracing::info!(
                cycle = %cycle,
                first = %first,
                second = %second,
                english = pair.english,
                timeslots = ?timeslots,
                "Pair announced"
            );
        }

        if !result.unmatched.is_empty() {
            let mut names = Vec::with_capacity(result.unmatched.len());
            for id in &result.unmatched {
                names.push(self.name_of(id).await);
            }
            tracing::info!(cycle = %cycle, unmatched = ?names, "Participants without a pair");
        }

        Ok(())
    }
}
