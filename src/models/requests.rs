use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to run (or replay) a pairing cycle
///
/// Both fields are optional; missing values default to the current ISO week.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RunCycleRequest {
    #[validate(range(min = 2000, max = 9999))]
    #[serde(default)]
    pub year: Option<i32>,
    #[validate(range(min = 1, max = 53))]
    #[serde(default)]
    pub week: Option<u32>,
}
