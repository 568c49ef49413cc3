use serde::{Deserialize, Serialize};

/// One graded attempt, appended to the owner's history and never changed.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pub problem_id: u32,
    pub timestamp: String, // RFC 3339
    pub passed: bool,
    pub score: u64, // delta awarded by this submission
}

impl Submission {
    pub fn from(problem_id: u32, passed: bool, score: u64) -> Self {
        Submission {
            problem_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
            passed,
            score,
        }
    }
}
