//! # Corrector Library
//!
//! This crate provides the core logic for correcting parameterized spreadsheet exercises.
//! Every student receives numbers derived from their matriculation number and a set of dummy
//! values; the corrector regenerates that student's answer key, compares the submitted values
//! with tolerance, and tracks a bounded number of attempts per exercise.
//!
//! ## Key Concepts
//! - **CorrectionJob**: Corrects one submission against one template.
//! - **Comparators**: Pluggable strategies deciding whether one value matches (see [`comparators`]).
//! - **Evaluators**: Collaborators that resolve a template for one student (see [`evaluators`]).
//! - **Attempt stores**: Persistence of the per-exercise score slots and their audit trail
//!   (see [`stores`]).
//! - **Outcome**: Structured result handed to the notifier (see [`outcome`]).

pub mod attempts;
pub mod comparators;
pub mod error;
pub mod evaluators;
pub mod outcome;
pub mod parsers;
pub mod scorer;
pub mod solution;
pub mod statistics;
pub mod stores;
pub mod traits;
pub mod types;

use crate::attempts::record::{AttemptLogEntry, MatNumEntry};
use crate::attempts::state_machine::{self, AttemptStatus};
use crate::comparators::tolerance_comparator::ToleranceComparator;
use crate::error::CorrectorError;
use crate::outcome::{CorrectionOutcome, ExerciseResult};
use crate::scorer::compute_percentage;
use crate::solution::SolutionGenerator;
use crate::traits::attempt_store::AttemptStore;
use crate::traits::comparator::ValueComparator;
use crate::traits::evaluator::TemplateEvaluator;
use crate::types::{CellValue, ExerciseTemplate, StudentSubmission, validate_student_id};

use std::sync::Arc;
use tracing::{debug, info, warn};
use util::assignment_config::AssignmentConfig;

/// Corrects submissions of one assignment.
///
/// # Fields
/// - `template`: Parameterized answer template, with the attempt budget of the assignment.
/// - `config`: Assignment settings. The template's attempt budget is authoritative; the
///   config only supplies it when the template rows omit one.
/// - `store`: Where attempt records and their audit trail live.
/// - `generator`: Produces the student-specific answer key through the injected evaluator.
/// - `comparator`: Strategy for comparing one submitted value with one expected value.
pub struct CorrectionJob<'a> {
    template: ExerciseTemplate,
    config: AssignmentConfig,
    store: Arc<dyn AttemptStore>,
    generator: SolutionGenerator<'a>,
    comparator: Box<dyn ValueComparator + 'a>,
}

impl<'a> CorrectionJob<'a> {
    /// Create a new correction job.
    ///
    /// # Arguments
    /// * `template` - The assignment's answer template.
    /// * `config` - Assignment configuration.
    /// * `store` - Attempt store shared with other jobs of the same assignment.
    /// * `evaluator` - Collaborator resolving the template for one student.
    pub fn new<E: TemplateEvaluator + 'a>(
        template: ExerciseTemplate,
        config: AssignmentConfig,
        store: Arc<dyn AttemptStore>,
        evaluator: E,
    ) -> Self {
        Self {
            template,
            config,
            store,
            generator: SolutionGenerator::new(evaluator),
            comparator: Box::new(ToleranceComparator),
        }
    }

    /// Set a custom value comparator for this job.
    ///
    /// # Arguments
    /// * `comparator` - An implementation of the `ValueComparator` trait.
    pub fn with_comparator<C: ValueComparator + 'a>(mut self, comparator: C) -> Self {
        self.comparator = Box::new(comparator);
        self
    }

    pub fn template(&self) -> &ExerciseTemplate {
        &self.template
    }

    pub fn config(&self) -> &AssignmentConfig {
        &self.config
    }

    /// Correct one submission.
    ///
    /// # Returns
    /// * `Ok(CorrectionOutcome)` describing what was graded, passed, blocked or rejected.
    /// * `Err(CorrectorError)` if the submission cannot be corrected at all. A
    ///   [`CorrectorError::TemplateEvaluation`] is raised before anything is written.
    ///
    /// # Steps
    /// 1. Validates the student id and generates the student's answer key.
    /// 2. For every submitted exercise without empty cells, under that exercise's lock:
    ///    skips passed and blocked exercises, flags structural mismatches, compares the
    ///    values, records the percentage and appends the attempt log.
    /// 3. Records the matriculation number used if anything was graded.
    /// 4. Derives `all_passed` from the stored records of every template exercise.
    pub async fn correct(
        &mut self,
        submission: &StudentSubmission,
    ) -> Result<CorrectionOutcome, CorrectorError> {
        let student_id = submission.student_id.as_str();
        validate_student_id(student_id)?;
        if submission.mat_num < 0 {
            return Err(CorrectorError::InvalidSubmission(format!(
                "matriculation number {} is negative",
                submission.mat_num
            )));
        }
        self.template.validate()?;

        info!(
            student_id,
            mat_num = submission.mat_num,
            assignment = %self.config.codename,
            "Correcting submission"
        );

        let solutions =
            self.generator
                .generate(&self.template, submission.mat_num, &submission.dummy_values)?;

        let max_attempts = self.template.max_attempts;
        let mut outcome = CorrectionOutcome::new(student_id, submission.mat_num);

        for (exercise, answers) in submission.submitted_answers.iter().enumerate() {
            let Some(answers) = answers else {
                continue;
            };
            if answers.iter().any(CellValue::is_empty) {
                debug!(student_id, exercise, "Exercise has empty cells, skipping");
                continue;
            }

            let _lock = self.store.lock(student_id, exercise).await;
            let mut record = self.store.load(student_id, exercise, max_attempts).await?;

            match state_machine::status(&record) {
                AttemptStatus::Passed => {
                    debug!(student_id, exercise, "Already passed");
                    outcome.passed_exercises.push(exercise);
                    continue;
                }
                AttemptStatus::Blocked => {
                    debug!(student_id, exercise, "Attempts exhausted");
                    outcome.blocked_exercises.push(exercise);
                    continue;
                }
                AttemptStatus::Fresh | AttemptStatus::InProgress => {}
            }

            let Some(expected) = solutions.get(exercise) else {
                warn!(
                    student_id,
                    exercise,
                    "Submission contains an exercise the template does not declare (possible tampering)"
                );
                outcome.erroneous_exercises.push(exercise);
                continue;
            };
            if expected.len() != answers.len() {
                let mismatch = CorrectorError::StructuralMismatch {
                    exercise: exercise + 1,
                    submitted: answers.len(),
                    expected: expected.len(),
                };
                warn!(student_id, error = %mismatch, "Possible tampering with the workbook");
                outcome.erroneous_exercises.push(exercise);
                continue;
            }

            let correct: Vec<bool> = answers
                .iter()
                .zip(expected)
                .map(|(answer, solution)| {
                    self.comparator.compare(
                        answer,
                        &solution.value,
                        solution.tolerance_rel,
                        solution.tolerance_abs,
                    )
                })
                .collect();
            let percentage = compute_percentage(&correct);

            let transition = state_machine::evaluate_and_record(&mut record, percentage)?;
            self.store.save(student_id, exercise, &record).await?;
            if transition.slot.is_some() {
                self.store
                    .append_log(
                        student_id,
                        exercise,
                        AttemptLogEntry::now(percentage, submission.mat_num),
                    )
                    .await?;
            }

            info!(
                student_id,
                exercise,
                percentage,
                passed = transition.passed,
                blocked = transition.blocked,
                "Recorded attempt"
            );

            if transition.passed {
                outcome.passed_exercises.push(exercise);
            } else if transition.blocked {
                outcome.blocked_exercises.push(exercise);
            }

            outcome.per_exercise_results.push(ExerciseResult {
                exercise_index: exercise,
                correct,
                var_names: expected.iter().map(|s| s.name.clone()).collect(),
                percentage,
            });
        }

        if !outcome.per_exercise_results.is_empty() {
            self.store
                .append_mat_num(student_id, MatNumEntry::now(submission.mat_num))
                .await?;
        }

        outcome.all_passed = self.all_passed(student_id).await?;

        info!(
            student_id,
            graded = outcome.per_exercise_results.len(),
            passed = outcome.passed_exercises.len(),
            blocked = outcome.blocked_exercises.len(),
            erroneous = outcome.erroneous_exercises.len(),
            all_passed = outcome.all_passed,
            "Correction finished"
        );
        Ok(outcome)
    }

    /// Every template exercise is currently passed in the store.
    async fn all_passed(&self, student_id: &str) -> Result<bool, CorrectorError> {
        for exercise in 0..self.template.exercise_count() {
            let status = match self.store.peek(student_id, exercise).await? {
                Some(record) => state_machine::status(&record.resized(self.template.max_attempts)),
                None => AttemptStatus::Fresh,
            };
            if status != AttemptStatus::Passed {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempts::record::AttemptRecord;
    use crate::evaluators::FormulaEvaluator;
    use crate::stores::MemoryAttemptStore;
    use crate::types::SubtaskSpec;

    fn template() -> ExerciseTemplate {
        ExerciseTemplate::new(
            vec![
                vec![
                    SubtaskSpec::literal("F", 10.0, Some(5.0), None),
                    SubtaskSpec::literal("colour", "red", None, None),
                ],
                vec![SubtaskSpec::formula("twice", "=2 * a1", None, Some(0.01))],
            ],
            3,
            1,
        )
        .unwrap()
    }

    fn config() -> AssignmentConfig {
        AssignmentConfig {
            codename: "statics".to_string(),
            max_attempts: 3,
            dummy_count: 1,
            ..AssignmentConfig::default()
        }
    }

    fn submission(answers: Vec<Option<Vec<CellValue>>>) -> StudentSubmission {
        StudentSubmission {
            student_id: "jane.doe@example.com".to_string(),
            mat_num: 123456,
            dummy_values: vec![CellValue::Number(4.0)],
            submitted_answers: answers,
        }
    }

    fn job(store: Arc<MemoryAttemptStore>) -> CorrectionJob<'static> {
        CorrectionJob::new(template(), config(), store, FormulaEvaluator::new())
    }

    #[tokio::test]
    async fn test_grades_and_records_attempts() {
        let store = Arc::new(MemoryAttemptStore::new());
        let mut job = job(store.clone());

        let outcome = job
            .correct(&submission(vec![
                Some(vec!["10.4".into(), "Red".into()]),
                Some(vec![CellValue::Number(7.0)]),
            ]))
            .await
            .unwrap();

        assert_eq!(outcome.passed_exercises, vec![0]);
        assert_eq!(outcome.per_exercise_results.len(), 2);
        assert_eq!(outcome.per_exercise_results[0].percentage, 100);
        assert_eq!(outcome.per_exercise_results[0].var_names, vec!["F", "colour"]);
        assert_eq!(outcome.per_exercise_results[1].correct, vec![false]);
        assert_eq!(outcome.per_exercise_results[1].percentage, 0);
        assert!(!outcome.all_passed);

        let log = store.log("jane.doe@example.com", 0).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].mat_num, 123456);
        assert_eq!(store.mat_nums("jane.doe@example.com").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_untouched_and_incomplete_exercises_are_skipped() {
        let store = Arc::new(MemoryAttemptStore::new());
        let mut job = job(store.clone());

        let outcome = job
            .correct(&submission(vec![
                None,
                Some(vec![CellValue::Empty]),
            ]))
            .await
            .unwrap();

        assert!(outcome.is_empty());
        assert!(store.students().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_passed_is_cumulative() {
        let store = Arc::new(MemoryAttemptStore::new());
        let mut job = job(store.clone());

        job.correct(&submission(vec![Some(vec!["10".into(), "red".into()])]))
            .await
            .unwrap();
        let outcome = job
            .correct(&submission(vec![None, Some(vec![CellValue::Number(8.0)])]))
            .await
            .unwrap();

        assert_eq!(outcome.passed_exercises, vec![1]);
        assert!(outcome.all_passed);
    }

    #[tokio::test]
    async fn test_extra_exercise_is_erroneous() {
        let store = Arc::new(MemoryAttemptStore::new());
        let mut job = job(store.clone());

        let outcome = job
            .correct(&submission(vec![None, None, Some(vec![CellValue::Number(1.0)])]))
            .await
            .unwrap();

        assert_eq!(outcome.erroneous_exercises, vec![2]);
        assert!(outcome.per_exercise_results.is_empty());
        assert!(store.mat_nums("jane.doe@example.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_template_budget_is_not_replaced_by_config() {
        let store = Arc::new(MemoryAttemptStore::new());
        let template = ExerciseTemplate::new(template().exercises, 1, 1).unwrap();
        let mut job = CorrectionJob::new(template, config(), store.clone(), FormulaEvaluator::new());
        assert_eq!(job.template().max_attempts, 1);

        let first = job
            .correct(&submission(vec![Some(vec!["10".into(), "blue".into()])]))
            .await
            .unwrap();
        assert_eq!(first.blocked_exercises, vec![0]);

        let second = job
            .correct(&submission(vec![Some(vec!["10".into(), "red".into()])]))
            .await
            .unwrap();
        assert_eq!(second.blocked_exercises, vec![0]);
        assert!(second.passed_exercises.is_empty());
        assert_eq!(
            store.peek("jane.doe@example.com", 0).await.unwrap(),
            Some(AttemptRecord::from_slots(vec![50]))
        );
    }

    #[tokio::test]
    async fn test_custom_comparator() {
        struct AcceptAll;
        impl ValueComparator for AcceptAll {
            fn compare(&self, _: &CellValue, _: &CellValue, _: Option<f64>, _: Option<f64>) -> bool {
                true
            }
        }

        let store = Arc::new(MemoryAttemptStore::new());
        let mut job = job(store).with_comparator(AcceptAll);
        let outcome = job
            .correct(&submission(vec![Some(vec!["x".into(), "y".into()])]))
            .await
            .unwrap();
        assert_eq!(outcome.passed_exercises, vec![0]);
    }

    #[tokio::test]
    async fn test_invalid_inputs_fail_before_grading() {
        let store = Arc::new(MemoryAttemptStore::new());
        let mut job = job(store.clone());

        let mut bad_id = submission(vec![Some(vec!["10".into(), "red".into()])]);
        bad_id.student_id = "../x".to_string();
        assert!(matches!(
            job.correct(&bad_id).await,
            Err(CorrectorError::InvalidStudentId(_))
        ));

        let mut no_dummies = submission(vec![Some(vec!["10".into(), "red".into()])]);
        no_dummies.dummy_values.clear();
        assert!(matches!(
            job.correct(&no_dummies).await,
            Err(CorrectorError::TemplateEvaluation(_))
        ));

        assert!(store.students().await.unwrap().is_empty());
    }
}
