//! # Correction Outcome Module
//!
//! Result of one correction run, handed to whatever notifies the student.
//!
//! ## JSON Output Example
//!
//! Wrapped in an [`OutcomeResponse`], an outcome serializes as:
//!
//! ```json
//! {
//!   "success": true,
//!   "message": "Correction complete.",
//!   "data": {
//!     "student_id": "jane.doe@example.com",
//!     "mat_num": 123456,
//!     "per_exercise_results": [
//!       { "exercise_index": 0, "correct": [true, true], "var_names": ["F", "colour"], "percentage": 100 }
//!     ],
//!     "passed_exercises": [0],
//!     "blocked_exercises": [],
//!     "erroneous_exercises": [],
//!     "all_passed": false
//!   }
//! }
//! ```
//!
//! All exercise indices are 0-based.

use serde::Serialize;

/// Grading of one exercise during this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseResult {
    pub exercise_index: usize,
    /// One verdict per sub-task, in template order.
    pub correct: Vec<bool>,
    /// Sub-task names parallel to `correct`.
    pub var_names: Vec<String>,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct CorrectionOutcome {
    pub student_id: String,
    pub mat_num: i64,
    /// Exercises graded in this run.
    pub per_exercise_results: Vec<ExerciseResult>,
    /// Exercises that are passed, either just now or already before this run.
    pub passed_exercises: Vec<usize>,
    /// Exercises whose attempt budget is used up.
    pub blocked_exercises: Vec<usize>,
    /// Exercises whose submitted shape disagrees with the template.
    pub erroneous_exercises: Vec<usize>,
    /// Every template exercise is passed, counting earlier runs.
    pub all_passed: bool,
}

impl CorrectionOutcome {
    pub fn new(student_id: impl Into<String>, mat_num: i64) -> Self {
        Self {
            student_id: student_id.into(),
            mat_num,
            ..Default::default()
        }
    }

    /// Nothing was graded, passed, blocked or flagged in this run.
    pub fn is_empty(&self) -> bool {
        self.per_exercise_results.is_empty()
            && self.passed_exercises.is_empty()
            && self.blocked_exercises.is_empty()
            && self.erroneous_exercises.is_empty()
    }
}

/// Envelope with top-level `success` and `message` fields.
#[derive(Debug, Serialize)]
pub struct OutcomeResponse {
    success: bool,
    message: String,
    data: CorrectionOutcome,
}

impl From<CorrectionOutcome> for OutcomeResponse {
    fn from(outcome: CorrectionOutcome) -> Self {
        let message = if outcome.is_empty() {
            "Nothing was corrected."
        } else {
            "Correction complete."
        };
        OutcomeResponse {
            success: true,
            message: message.to_string(),
            data: outcome,
        }
    }
}
