//! In-memory collaborators for tests and local runs.
//!
//! Nothing here is persisted; all state is lost when the process exits. The
//! history store can be told to fail snapshots or commits to exercise the
//! engine's abort paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::{
    warn_short_signups, HistoryStore, Notifier, NotifyError, ParticipantDirectory, SignupSource,
    StoreError,
};
use crate::config::RegistrationSettings;
use crate::models::{
    CycleId, CycleRecord, ExclusionHistory, MatchingResult, Participant, ParticipantId, Signup,
};

fn poison_err<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

/// Signup source backed by a map of cycle -> signups
#[derive(Debug)]
pub struct InMemorySignupSource {
    signups: RwLock<HashMap<CycleId, Vec<Signup>>>,
    registration_open: AtomicBool,
    min_timeslots: usize,
}

impl Default for InMemorySignupSource {
    fn default() -> Self {
        Self {
            signups: RwLock::default(),
            registration_open: AtomicBool::new(false),
            min_timeslots: RegistrationSettings::default().min_timeslots,
        }
    }
}

impl InMemorySignupSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_timeslots(mut self, min_timeslots: usize) -> Self {
        self.min_timeslots = min_timeslots;
        self
    }

    pub fn with_signups(signups: Vec<Signup>) -> Self {
        let source = Self::new();
        for signup in signups {
            source.add(signup);
        }
        source
    }

    /// Append a signup to its cycle, keeping insertion order
    pub fn add(&self, signup: Signup) {
        let mut signups = self.signups.write().unwrap_or_else(PoisonError::into_inner);
        signups.entry(signup.cycle).or_default().push(signup);
    }

    pub fn set_registration_open(&self, open: bool) {
        self.registration_open.store(open, Ordering::SeqCst);
    }
}

#[async_trait]
impl SignupSource for InMemorySignupSource {
    async fn registration_open(&self, _cycle: CycleId) -> bool {
        self.registration_open.load(Ordering::SeqCst)
    }

    async fn get_signups(&self, cycle: CycleId) -> Result<Vec<Signup>, StoreError> {
        let signups = self
            .signups
            .read()
            .map_err(poison_err)?
            .get(&cycle)
            .cloned()
            .unwrap_or_default();
        warn_short_signups(cycle, &signups, self.min_timeslots);
        Ok(signups)
    }
}

/// History store keeping the exclusion set and cycle markers in memory
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    state: RwLock<HistoryState>,
    fail_snapshot: AtomicBool,
    fail_commit: AtomicBool,
}

#[derive(Debug, Default)]
struct HistoryState {
    history: ExclusionHistory,
    cycles: HashMap<CycleId, CycleRecord>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(history: ExclusionHistory) -> Self {
        let store = Self::new();
        store
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .history = history;
        store
    }

    pub fn fail_snapshot(&self, fail: bool) {
        self.fail_snapshot.store(fail, Ordering::SeqCst);
    }

    pub fn fail_commit(&self, fail: bool) {
        self.fail_commit.store(fail, Ordering::SeqCst);
    }

    pub fn committed_cycles(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cycles
            .len()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn snapshot(&self) -> Result<ExclusionHistory, StoreError> {
        if self.fail_snapshot.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("snapshot refused".to_string()));
        }
        Ok(self.state.read().map_err(poison_err)?.history.clone())
    }

    async fn committed_cycle(&self, cycle: CycleId) -> Result<Option<CycleRecord>, StoreError> {
        Ok(self.state.read().map_err(poison_err)?.cycles.get(&cycle).cloned())
    }

    async fn commit(&self, record: &CycleRecord) -> Result<(), StoreError> {
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("commit refused".to_string()));
        }
        let mut state = self.state.write().map_err(poison_err)?;
        if state.cycles.contains_key(&record.cycle) {
            return Err(StoreError::AlreadyCommitted(record.cycle));
        }
        for pair in &record.result.pairs {
            state.history.insert(pair.key());
        }
        state.cycles.insert(record.cycle, record.clone());
        Ok(())
    }
}

/// Directory backed by a fixed participant list
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    names: RwLock<HashMap<ParticipantId, String>>,
}

impl InMemoryDirectory {
    pub fn new(participants: impl IntoIterator<Item = Participant>) -> Self {
        Self {
            names: RwLock::new(
                participants
                    .into_iter()
                    .map(|p| (p.id, p.display_name))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl ParticipantDirectory for InMemoryDirectory {
    async fn resolve(&self, id: &ParticipantId) -> Result<String, StoreError> {
        self.names
            .read()
            .map_err(poison_err)?
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("participant {}", id)))
    }
}

/// Notifier that records every announcement
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    announcements: RwLock<Vec<(CycleId, MatchingResult)>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_delivery(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn announcements(&self) -> Vec<(CycleId, MatchingResult)> {
        self.announcements
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn announce(&self, cycle: CycleId, result: &MatchingResult) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery("delivery refused".to_string()));
        }
        self.announcements
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((cycle, result.clone()));
        Ok(())
    }
}
