// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CycleId, CycleRecord, CycleStage, ExclusionHistory, MatchingResult, Pair, Participant,
    ParticipantId, Signup, TimeslotId, UnorderedPair,
};
pub use requests::RunCycleRequest;
pub use responses::{CycleResponse, ErrorResponse, HealthResponse};
