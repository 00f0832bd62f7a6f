//! Mock Pairs - weekly pairing service for mock technical interviews
//!
//! Each cycle (an ISO week) pairs the participants who signed up, so that
//! every pair shares at least one timeslot and no pair repeats one used in an
//! earlier cycle. Pairing is a maximum cardinality matching over the
//! compatibility graph, computed in-process with Edmonds' blossom algorithm.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use self::core::{maximum_matching, pair_signups, CycleError, CycleReport, PairingEngine};
pub use self::models::{CycleId, ExclusionHistory, MatchingResult, Pair, ParticipantId, Signup, UnorderedPair};
