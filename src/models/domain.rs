use chrono::{Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Opaque participant identity, owned by the external directory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Index into the list of timeslot options offered at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeslotId(pub u16);

/// One recurring round of the activity, identified by ISO week
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CycleId {
    pub year: i32,
    pub week: u32,
}

impl CycleId {
    /// Build a cycle id, rejecting weeks the ISO calendar of `year` lacks
    ///
    /// Only some years have a week 53.
    pub fn new(year: i32, week: u32) -> Option<Self> {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)?;
        Some(Self { year, week })
    }

    /// The ISO week containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// The ISO week of today (UTC)
    pub fn current() -> Self {
        Self::from_date(Utc::now().date_naive())
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

/// Participant as known by the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

/// A participant's opt-in for one cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signup {
    #[serde(rename = "participantId")]
    pub participant_id: ParticipantId,
    pub cycle: CycleId,
    pub timeslots: BTreeSet<TimeslotId>,
    #[serde(rename = "firstProblem", default)]
    pub first_problem: String,
    #[serde(rename = "secondProblem", default)]
    pub second_problem: String,
    #[serde(rename = "programmingLanguage", default)]
    pub programming_language: String,
    #[serde(default)]
    pub english: bool,
}

impl Signup {
    /// Signup with only the fields that matter for pairing
    pub fn new(
        participant_id: impl Into<ParticipantId>,
        cycle: CycleId,
        timeslots: impl IntoIterator<Item = u16>,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            cycle,
            timeslots: timeslots.into_iter().map(TimeslotId).collect(),
            first_problem: String::new(),
            second_problem: String::new(),
            programming_language: String::new(),
            english: false,
        }
    }

    /// Sorted timeslots both signups accept
    pub fn common_timeslots(&self, other: &Signup) -> Vec<TimeslotId> {
        self.timeslots.intersection(&other.timeslots).copied().collect()
    }

    pub fn is_compatible_with(&self, other: &Signup) -> bool {
        !self.timeslots.is_disjoint(&other.timeslots)
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Unordered participant pair, normalised so that `low <= high`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnorderedPair {
    low: ParticipantId,
    high: ParticipantId,
}

impl UnorderedPair {
    pub fn new(a: ParticipantId, b: ParticipantId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> &ParticipantId {
        &self.low
    }

    pub fn high(&self) -> &ParticipantId {
        &self.high
    }
}

/// Append-only set of pairs already used in some prior cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionHistory {
    pairs: HashSet<UnorderedPair>,
}

impl ExclusionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unordered lookup; `(a, b)` and `(b, a)` are the same pair
    pub fn contains(&self, a: &ParticipantId, b: &ParticipantId) -> bool {
        self.pairs.contains(&UnorderedPair::new(a.clone(), b.clone()))
    }

    /// Adding a pair already present is a no-op
    pub fn insert(&mut self, pair: UnorderedPair) -> bool {
        self.pairs.insert(pair)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn is_superset(&self, other: &ExclusionHistory) -> bool {
        self.pairs.is_superset(&other.pairs)
    }
}

impl FromIterator<UnorderedPair> for ExclusionHistory {
    fn from_iter<T: IntoIterator<Item = UnorderedPair>>(iter: T) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

/// Two participants paired for a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub first: ParticipantId,
    pub second: ParticipantId,
    #[serde(rename = "commonTimeslots")]
    pub common_timeslots: Vec<TimeslotId>,
    pub english: bool,
}

impl Pair {
    pub fn key(&self) -> UnorderedPair {
        UnorderedPair::new(self.first.clone(), self.second.clone())
    }

    pub fn involves(&self, id: &ParticipantId) -> bool {
        &self.first == id || &self.second == id
    }
}

/// Outcome of one pairing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingResult {
    pub pairs: Vec<Pair>,
    pub unmatched: Vec<ParticipantId>,
}

impl MatchingResult {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty() && self.unmatched.is_empty()
    }

    /// Number of participants covered by the result
    pub fn participant_count(&self) -> usize {
        self.pairs.len() * 2 + self.unmatched.len()
    }
}

/// Durable "cycle processed" marker written together with the new pairs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub cycle: CycleId,
    #[serde(rename = "runId")]
    pub run_id: uuid::Uuid,
    pub result: MatchingResult,
    #[serde(rename = "committedAt")]
    pub committed_at: chrono::DateTime<Utc>,
}

/// Stages a cycle run moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStage {
    SignupsOpen,
    SignupsFrozen,
    GraphBuilt,
    Matched,
    HistoryCommitted,
    Notified,
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CycleStage::SignupsOpen => "signups_open",
            CycleStage::SignupsFrozen => "signups_frozen",
            CycleStage::GraphBuilt => "graph_built",
            CycleStage::Matched => "matched",
            CycleStage::HistoryCommitted => "history_committed",
            CycleStage::Notified => "notified",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unordered_pair_normalises() {
        let ab = UnorderedPair::new("a".into(), "b".into());
        let ba = UnorderedPair::new("b".into(), "a".into());
        assert_eq!(ab, ba);
        assert_eq!(ab.low().as_str(), "a");
    }

    #[test]
    fn test_history_checks_both_orderings() {
        let history: ExclusionHistory = [UnorderedPair::new("x".into(), "y".into())]
            .into_iter()
            .collect();
        assert!(history.contains(&"x".into(), &"y".into()));
        assert!(history.contains(&"y".into(), &"x".into()));
        assert!(!history.contains(&"x".into(), &"z".into()));
    }

    #[test]
    fn test_cycle_id_bounds_and_display() {
        assert!(CycleId::new(2025, 0).is_none());
        assert!(CycleId::new(2025, 54).is_none());
        // 2025 has 52 ISO weeks, 2026 has 53
        assert!(CycleId::new(2025, 53).is_none());
        assert!(CycleId::new(2026, 53).is_some());
        let cycle = CycleId::new(2025, 3).unwrap();
        assert_eq!(cycle.to_string(), "2025-W03");
    }

    #[test]
    fn test_cycle_id_from_date_uses_iso_year() {
        // 2024-12-30 belongs to ISO week 1 of 2025
        let date = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(CycleId::from_date(date), CycleId { year: 2025, week: 1 });
    }

    #[test]
    fn test_common_timeslots_sorted() {
        let cycle = CycleId::new(2025, 10).unwrap();
        let a = Signup::new("a", cycle, [5, 1, 3]);
        let b = Signup::new("b", cycle, [3, 5, 7]);
        assert_eq!(a.common_timeslots(&b), vec![TimeslotId(3), TimeslotId(5)]);
        assert!(a.is_compatible_with(&b));
    }

    #[test]
    fn test_participant_count() {
        let result = MatchingResult {
            pairs: vec![Pair {
                first: "a".into(),
                second: "b".into(),
                common_timeslots: vec![],
                english: false,
            }],
            unmatched: vec!["c".into()],
        };
        assert_eq!(result.participant_count(), 3);
    }
}
