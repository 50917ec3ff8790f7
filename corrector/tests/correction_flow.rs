use corrector::CorrectionJob;
use corrector::attempts::record::AttemptRecord;
use corrector::error::{CorrectorError, ErrorCategory};
use corrector::evaluators::FormulaEvaluator;
use corrector::parsers::{JsonSubmissionParser, JsonTemplateParser};
use corrector::statistics;
use corrector::stores::FileAttemptStore;
use corrector::traits::attempt_store::AttemptStore;
use corrector::traits::parser::Parser;
use corrector::types::{CellValue, ExerciseTemplate, StudentSubmission, SubtaskSpec};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use util::assignment_config::AssignmentConfig;

const STUDENT: &str = "jane.doe@example.com";

fn config(max_attempts: usize) -> AssignmentConfig {
    AssignmentConfig {
        codename: "statics".to_string(),
        max_attempts,
        dummy_count: 0,
        ..AssignmentConfig::default()
    }
}

fn literal_template(max_attempts: usize) -> ExerciseTemplate {
    ExerciseTemplate::new(
        vec![
            vec![
                SubtaskSpec::literal("F", 10.0, Some(5.0), None),
                SubtaskSpec::literal("colour", "red", None, None),
            ],
            vec![
                SubtaskSpec::literal("x", 1.0, None, None),
                SubtaskSpec::literal("y", 2.0, None, None),
                SubtaskSpec::literal("z", 3.0, None, None),
            ],
        ],
        max_attempts,
        0,
    )
    .unwrap()
}

fn submission(answers: Vec<Option<Vec<CellValue>>>) -> StudentSubmission {
    StudentSubmission {
        student_id: STUDENT.to_string(),
        mat_num: 123456,
        dummy_values: vec![],
        submitted_answers: answers,
    }
}

fn file_store(root: &Path) -> Arc<FileAttemptStore> {
    Arc::new(FileAttemptStore::new(root))
}

fn read_slots(root: &Path, exercise_number: usize) -> Vec<u32> {
    let path = root
        .join(STUDENT)
        .join(format!("exercise_{exercise_number}_attempts.json"));
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn passed_exercise_is_not_regraded() {
    let tmp = TempDir::new().unwrap();
    let store = file_store(tmp.path());
    let mut job = CorrectionJob::new(literal_template(3), config(3), store, FormulaEvaluator::new());

    let first = job
        .correct(&submission(vec![Some(vec!["10.4".into(), "Red".into()])]))
        .await
        .unwrap();
    assert_eq!(first.passed_exercises, vec![0]);
    assert_eq!(first.per_exercise_results[0].correct, vec![true, true]);
    assert_eq!(read_slots(tmp.path(), 1), vec![100, 0, 0]);

    let second = job
        .correct(&submission(vec![Some(vec!["999".into(), "blue".into()])]))
        .await
        .unwrap();
    assert_eq!(second.passed_exercises, vec![0]);
    assert!(second.per_exercise_results.is_empty());
    assert_eq!(read_slots(tmp.path(), 1), vec![100, 0, 0]);
}

#[tokio::test]
async fn three_failures_block_the_exercise() {
    let tmp = TempDir::new().unwrap();
    let store = file_store(tmp.path());
    store
        .save(STUDENT, 0, &AttemptRecord::from_slots(vec![40, 60, 0]))
        .await
        .unwrap();
    let mut job = CorrectionJob::new(literal_template(3), config(3), store, FormulaEvaluator::new());

    // one of two correct
    let outcome = job
        .correct(&submission(vec![Some(vec!["10".into(), "blue".into()])]))
        .await
        .unwrap();
    assert_eq!(outcome.blocked_exercises, vec![0]);
    assert_eq!(outcome.per_exercise_results[0].percentage, 50);
    assert_eq!(read_slots(tmp.path(), 1), vec![40, 60, 50]);

    let again = job
        .correct(&submission(vec![Some(vec!["10".into(), "red".into()])]))
        .await
        .unwrap();
    assert_eq!(again.blocked_exercises, vec![0]);
    assert!(again.per_exercise_results.is_empty());
}

#[tokio::test]
async fn reduced_budget_truncates_stored_record() {
    let tmp = TempDir::new().unwrap();
    let store = file_store(tmp.path());
    store
        .save(STUDENT, 1, &AttemptRecord::from_slots(vec![10, 20, 0, 0, 0]))
        .await
        .unwrap();
    let mut job = CorrectionJob::new(literal_template(5), config(3), store, FormulaEvaluator::new());

    let outcome = job
        .correct(&submission(vec![None, Some(vec![1.0.into(), 2.0.into(), 3.0.into()])]))
        .await
        .unwrap();

    assert_eq!(outcome.passed_exercises, vec![1]);
    assert_eq!(read_slots(tmp.path(), 2), vec![10, 20, 100]);
}

#[tokio::test]
async fn structural_mismatch_is_reported_not_graded() {
    let tmp = TempDir::new().unwrap();
    let store = file_store(tmp.path());
    let mut job = CorrectionJob::new(literal_template(3), config(3), store, FormulaEvaluator::new());

    let outcome = job
        .correct(&submission(vec![None, Some(vec![1.0.into(), 2.0.into()])]))
        .await
        .unwrap();

    assert_eq!(outcome.erroneous_exercises, vec![1]);
    assert!(outcome.per_exercise_results.is_empty());
    assert!(!tmp.path().join(STUDENT).join("exercise_2_attempts.json").exists());
}

#[tokio::test]
async fn failed_answer_key_mutates_nothing() {
    let tmp = TempDir::new().unwrap();
    let store = file_store(tmp.path());
    let template = ExerciseTemplate::new(
        vec![vec![SubtaskSpec::formula("ratio", "=1 / (a1 - a1)", None, None)]],
        3,
        1,
    )
    .unwrap();
    let mut job = CorrectionJob::new(
        template,
        AssignmentConfig {
            dummy_count: 1,
            ..config(3)
        },
        store.clone(),
        FormulaEvaluator::new(),
    );

    let mut sub = submission(vec![Some(vec![1.0.into()])]);
    sub.dummy_values = vec![CellValue::Number(2.0)];
    let err = job.correct(&sub).await.unwrap_err();

    assert!(matches!(err, CorrectorError::TemplateEvaluation(_)));
    assert_eq!(err.category(), ErrorCategory::TemplateEvaluation);
    assert!(store.students().await.unwrap().is_empty());
}

#[tokio::test]
async fn parsed_rows_flow_through_to_statistics() {
    let tmp = TempDir::new().unwrap();
    let store = file_store(tmp.path());
    let config = AssignmentConfig {
        dummy_count: 2,
        ..config(3)
    };

    let template = JsonTemplateParser
        .parse(
            &json!({
                "rows": [
                    { "exercise": 1, "name": "F", "formula": "=a1 * a2", "tolerance_rel": 1 },
                    { "exercise": 1, "name": "colour", "expected": "red" },
                    { "exercise": 2, "name": "G", "formula": "=F + mod(mat_num, 10)" }
                ]
            }),
            &config,
        )
        .unwrap();

    let mut job = CorrectionJob::new(template, config.clone(), store.clone(), FormulaEvaluator::new());

    for (mat_num, f, g) in [(123456, "5,2", "11"), (654321, "5.2", "6.2")] {
        let sub = JsonSubmissionParser
            .parse(
                &json!({
                    "student_id": STUDENT,
                    "mat_num": mat_num,
                    "dummies": [2, 2.6],
                    "rows": [
                        { "exercise": 1, "value": f },
                        { "exercise": 1, "value": "RED" },
                        { "exercise": 2, "value": g }
                    ]
                }),
                &config,
            )
            .unwrap();
        job.correct(&sub).await.unwrap();
    }

    let stats = statistics::collect(store.as_ref(), 2, 3).await.unwrap();
    let student = &stats.students[0];
    assert_eq!(student.student_id, STUDENT);
    assert_eq!(student.last_mat_num, Some(654321));
    assert_eq!(student.distinct_mat_nums, 2);
    assert_eq!(student.exercises[0].best_percentage, Some(100));
    assert_eq!(student.exercises[0].attempts, 1);
    assert_eq!(student.exercises[1].attempts, 2);
    assert_eq!(student.exercises[1].best_percentage, Some(100));
    assert_eq!(stats.multiple_mat_num_students, vec![STUDENT]);
}

#[tokio::test]
async fn template_budget_holds_without_assignment_config() {
    let tmp = TempDir::new().unwrap();
    let store = file_store(tmp.path());
    let config = AssignmentConfig::default();
    assert_eq!(config.max_attempts, 3);

    let template = JsonTemplateParser
        .parse(
            &json!({
                "max_attempts": 2,
                "dummy_count": 0,
                "rows": [
                    { "exercise": 1, "name": "F", "expected": 10, "tolerance_rel": 5 },
                    { "exercise": 1, "name": "colour", "expected": "red" }
                ]
            }),
            &config,
        )
        .unwrap();
    let mut job = CorrectionJob::new(template, config, store, FormulaEvaluator::new());
    assert_eq!(job.template().max_attempts, 2);

    let first = job
        .correct(&submission(vec![Some(vec!["10.4".into(), "blue".into()])]))
        .await
        .unwrap();
    assert!(first.blocked_exercises.is_empty());

    let second = job
        .correct(&submission(vec![Some(vec!["99".into(), "red".into()])]))
        .await
        .unwrap();
    assert_eq!(second.blocked_exercises, vec![0]);
    assert_eq!(read_slots(tmp.path(), 1), vec![50, 50]);

    let third = job
        .correct(&submission(vec![Some(vec!["10".into(), "red".into()])]))
        .await
        .unwrap();
    assert_eq!(third.blocked_exercises, vec![0]);
    assert!(third.passed_exercises.is_empty());
    assert_eq!(read_slots(tmp.path(), 1), vec![50, 50]);
}
