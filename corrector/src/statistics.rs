//! # Statistics
//!
//! Read-only reporting over an attempt store: per student the matriculation numbers used and
//! per exercise the best score and attempt count, plus per exercise how many students
//! submitted and passed. Nothing here writes to the store.

use crate::attempts::state_machine::{self, AttemptStatus, PASS_PERCENTAGE};
use crate::error::CorrectorError;
use crate::traits::attempt_store::AttemptStore;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseStatistics {
    pub exercise_index: usize,
    /// Highest logged or stored percentage, `None` if never attempted.
    pub best_percentage: Option<u32>,
    /// Number of logged attempts.
    pub attempts: usize,
    /// Status of the stored record under the given attempt budget.
    pub status: AttemptStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentStatistics {
    pub student_id: String,
    /// Matriculation number of the most recent graded submission.
    pub last_mat_num: Option<i64>,
    pub distinct_mat_nums: usize,
    pub exercises: Vec<ExerciseStatistics>,
}

/// Students that submitted and passed one exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseSummary {
    pub exercise_index: usize,
    pub submitted: usize,
    pub passed: usize,
    /// Students that can no longer submit, either passed or out of attempts.
    pub closed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub students: Vec<StudentStatistics>,
    pub exercises: Vec<ExerciseSummary>,
    /// Students that used more than one matriculation number.
    pub multiple_mat_num_students: Vec<String>,
}

/// Collects statistics for `exercise_count` exercises.
pub async fn collect(
    store: &dyn AttemptStore,
    exercise_count: usize,
    max_attempts: usize,
) -> Result<Statistics, CorrectorError> {
    let mut students = Vec::new();
    let mut summaries: Vec<ExerciseSummary> = (0..exercise_count)
        .map(|exercise_index| ExerciseSummary {
            exercise_index,
            submitted: 0,
            passed: 0,
            closed: 0,
        })
        .collect();

    for student_id in store.students().await? {
        let mat_nums = store.mat_nums(&student_id).await?;
        let last_mat_num = mat_nums.last().map(|e| e.mat_num);
        let distinct_mat_nums = mat_nums
            .iter()
            .map(|e| e.mat_num)
            .collect::<BTreeSet<_>>()
            .len();

        let mut exercises = Vec::with_capacity(exercise_count);
        for (exercise_index, summary) in summaries.iter_mut().enumerate() {
            let log = store.log(&student_id, exercise_index).await?;
            let record = store
                .peek(&student_id, exercise_index)
                .await?
                .map(|r| r.resized(max_attempts));
            // Records written before logging existed have no log entries.
            let best_percentage = log
                .iter()
                .map(|e| e.percentage)
                .chain(record.as_ref().and_then(|r| r.best()))
                .max();
            let status = record
                .as_ref()
                .map_or(AttemptStatus::Fresh, state_machine::status);

            if best_percentage.is_some() {
                summary.submitted += 1;
            }
            if best_percentage == Some(PASS_PERCENTAGE) {
                summary.passed += 1;
            }
            if status.is_terminal() {
                summary.closed += 1;
            }

            exercises.push(ExerciseStatistics {
                exercise_index,
                best_percentage,
                attempts: log.len(),
                status,
            });
        }

        students.push(StudentStatistics {
            student_id,
            last_mat_num,
            distinct_mat_nums,
            exercises,
        });
    }

    let multiple_mat_num_students: Vec<String> = students
        .iter()
        .filter(|s| s.distinct_mat_nums > 1)
        .map(|s| s.student_id.clone())
        .collect();

    info!(
        students = students.len(),
        flagged = multiple_mat_num_students.len(),
        "Collected attempt statistics"
    );

    Ok(Statistics {
        students,
        exercises: summaries,
        multiple_mat_num_students,
    })
}
