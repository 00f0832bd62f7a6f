// Core pairing pipeline
pub mod blossom;
pub mod engine;
pub mod error;
pub mod graph;
pub mod mapper;

pub use blossom::{maximum_matching, solve, Matching};
pub use engine::{pair_signups, CycleReport, PairingEngine};
pub use error::{CycleError, PreconditionViolation, SolverError};
pub use graph::{CompatibilityGraph, CompatibleEdge};
pub use mapper::map_result;
