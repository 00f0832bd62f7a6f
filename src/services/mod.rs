//! Collaborators of the pairing engine
//!
//! The engine only talks to these traits. `postgres` backs all of the storage
//! traits in production, `memory` backs them in tests.

pub mod cache;
pub mod memory;
pub mod notifier;
pub mod postgres;
pub mod scheduler;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CycleId, CycleRecord, ExclusionHistory, MatchingResult, ParticipantId, Signup};

pub use cache::CachedDirectory;
pub use memory::{InMemoryDirectory, InMemoryHistoryStore, InMemorySignupSource, RecordingNotifier};
pub use notifier::LogNotifier;
pub use postgres::PostgresStore;
pub use scheduler::{next_run_after, run_weekly, ScheduleError};

/// Errors from the signup source, directory and history store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Cycle {0} is already committed")]
    AlreadyCommitted(CycleId),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Errors from the notification dispatcher
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Supplies the frozen signups of a cycle
#[async_trait]
pub trait SignupSource: Send + Sync {
    /// Whether participants can still sign up for `cycle`
    async fn registration_open(&self, cycle: CycleId) -> bool;

    /// Stable snapshot of the cycle's signups, in signup order
    async fn get_signups(&self, cycle: CycleId) -> Result<Vec<Signup>, StoreError>;
}

/// Resolves participant ids to display names
#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    async fn resolve(&self, id: &ParticipantId) -> Result<String, StoreError>;
}

/// Durable exclusion history plus the per-cycle processed marker
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Every pair used by any committed cycle
    async fn snapshot(&self) -> Result<ExclusionHistory, StoreError>;

    /// The committed record of `cycle`, if it has been processed
    async fn committed_cycle(&self, cycle: CycleId) -> Result<Option<CycleRecord>, StoreError>;

    /// Atomically add the record's pairs to the history and mark the cycle
    /// processed. Fails with `AlreadyCommitted` if the marker exists.
    async fn commit(&self, record: &CycleRecord) -> Result<(), StoreError>;
}

/// Announces a cycle's result
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn announce(&self, cycle: CycleId, result: &MatchingResult) -> Result<(), NotifyError>;
}

/// Warn about signups offering fewer than `min_timeslots` timeslots
///
/// Short signups are still paired. Returns how many were found.
pub fn warn_short_signups(cycle: CycleId, signups: &[Signup], min_timeslots: usize) -> usize {
    let mut short = 0;
    for signup in signups.iter().filter(|s| s.timeslots.len() < min_timeslots) {
        tracing::warn!(
            "Participant {} signed up for {} with only {} timeslots",
            signup.participant_id,
            cycle,
            signup.timeslots.len()
        );
        short += 1;
    }
    short
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_signups_counted_below_minimum_only() {
        let cycle = CycleId::new(2025, 33).unwrap();
        let signups = vec![
            Signup::new("two", cycle, [1, 2]),
            Signup::new("three", cycle, [1, 2, 3]),
            Signup::new("none", cycle, Vec::<u16>::new()),
        ];
        assert_eq!(warn_short_signups(cycle, &signups, 3), 2);
        assert_eq!(warn_short_signups(cycle, &signups, 2), 1);
        assert_eq!(warn_short_signups(cycle, &[], 3), 0);
    }
}
