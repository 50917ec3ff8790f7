//! # Types Module
//!
//! Core data structures shared by the comparator, the solution generator, the attempt
//! tracking and the correction job.
//!
//! Every value read from a spreadsheet cell is a [`CellValue`]: a number, a piece of text or
//! an empty cell. Templates describe exercises as ordered lists of [`SubtaskSpec`]s; the
//! solution generator turns them into a [`SolutionMatrix`] for one student.

use crate::error::CorrectorError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single spreadsheet cell value.
///
/// Deserializes from JSON numbers, strings and `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Text rendering used when a value is compared against a textual expectation.
    ///
    /// Integral numbers render without a fractional part (`3.0` → `"3"`), empty cells as `""`.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => write!(f, "<empty>"),
            other => write!(f, "{}", other.as_text()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

/// One graded value of an exercise as authored in the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskSpec {
    /// Variable name shown to the student (e.g. `"v_max"`).
    pub name: String,
    /// Literal expected value, used when `formula` is absent.
    #[serde(default)]
    pub expected_value: CellValue,
    /// Formula producing the expected value from the student's parameters.
    #[serde(default)]
    pub formula: Option<String>,
    /// Relative tolerance in percent.
    #[serde(default)]
    pub tolerance_rel: Option<f64>,
    /// Absolute tolerance in the unit of the value.
    #[serde(default)]
    pub tolerance_abs: Option<f64>,
}

impl SubtaskSpec {
    pub fn literal(
        name: impl Into<String>,
        expected_value: impl Into<CellValue>,
        tolerance_rel: Option<f64>,
        tolerance_abs: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            expected_value: expected_value.into(),
            formula: None,
            tolerance_rel,
            tolerance_abs,
        }
    }

    pub fn formula(
        name: impl Into<String>,
        formula: impl Into<String>,
        tolerance_rel: Option<f64>,
        tolerance_abs: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            expected_value: CellValue::Empty,
            formula: Some(formula.into()),
            tolerance_rel,
            tolerance_abs,
        }
    }

    /// A sub-task that accepts any answer.
    pub fn ungraded(name: impl Into<String>) -> Self {
        Self::literal(name, CellValue::Empty, None, None)
    }
}

/// Parameterized answer template of one assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseTemplate {
    /// Exercises in order; each is an ordered list of sub-tasks.
    pub exercises: Vec<Vec<SubtaskSpec>>,
    /// Attempt budget shared by all exercises.
    pub max_attempts: usize,
    /// Number of per-student parameter values.
    pub dummy_count: usize,
}

impl ExerciseTemplate {
    /// Builds a template and checks its invariants.
    pub fn new(
        exercises: Vec<Vec<SubtaskSpec>>,
        max_attempts: usize,
        dummy_count: usize,
    ) -> Result<Self, CorrectorError> {
        let template = Self {
            exercises,
            max_attempts,
            dummy_count,
        };
        template.validate()?;
        Ok(template)
    }

    pub fn validate(&self) -> Result<(), CorrectorError> {
        if self.exercises.is_empty() {
            return Err(CorrectorError::InvalidTemplate(
                "template declares no exercises".to_string(),
            ));
        }
        if let Some(idx) = self.exercises.iter().position(|e| e.is_empty()) {
            return Err(CorrectorError::InvalidTemplate(format!(
                "exercise {} declares no sub-tasks",
                idx + 1
            )));
        }
        if self.max_attempts < 1 {
            return Err(CorrectorError::InvalidTemplate(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        for (idx, exercise) in self.exercises.iter().enumerate() {
            for subtask in exercise {
                for tolerance in [subtask.tolerance_rel, subtask.tolerance_abs]
                    .into_iter()
                    .flatten()
                {
                    if !tolerance.is_finite() {
                        return Err(CorrectorError::InvalidTemplate(format!(
                            "exercise {} sub-task {:?} has a non-finite tolerance",
                            idx + 1,
                            subtask.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn exercise_count(&self) -> usize {
        self.exercises.len()
    }
}

/// A sub-task with its expected value resolved for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskSolution {
    pub name: String,
    pub value: CellValue,
    pub tolerance_rel: Option<f64>,
    pub tolerance_abs: Option<f64>,
}

/// Answer key of one student: one list per exercise, shaped like the template.
pub type SolutionMatrix = Vec<Vec<SubtaskSolution>>;

/// One student's submitted workbook, as extracted by the spreadsheet reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSubmission {
    /// Storage key of the student (usually the sender address).
    pub student_id: String,
    /// Matriculation number entered in the workbook.
    pub mat_num: i64,
    /// Parameter values entered in the workbook.
    pub dummy_values: Vec<CellValue>,
    /// Per exercise: `None` if untouched, otherwise the values parallel to its sub-tasks.
    pub submitted_answers: Vec<Option<Vec<CellValue>>>,
}

/// Rejects identifiers that cannot safely name a single storage directory.
pub fn validate_student_id(student_id: &str) -> Result<(), CorrectorError> {
    let invalid = student_id.trim().is_empty()
        || student_id == "."
        || student_id == ".."
        || student_id.contains(['/', '\\', '\0']);
    if invalid {
        return Err(CorrectorError::InvalidStudentId(student_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_values_deserialize_from_json_scalars() {
        let values: Vec<CellValue> = serde_json::from_str(r#"[10, 2.5, "red", null]"#).unwrap();
        assert_eq!(
            values,
            vec![
                CellValue::Number(10.0),
                CellValue::Number(2.5),
                CellValue::Text("red".to_string()),
                CellValue::Empty,
            ]
        );
    }

    #[test]
    fn empty_serializes_as_null() {
        assert_eq!(serde_json::to_string(&CellValue::Empty).unwrap(), "null");
    }

    #[test]
    fn as_text_drops_integral_fraction() {
        assert_eq!(CellValue::Number(3.0).as_text(), "3");
        assert_eq!(CellValue::Number(3.25).as_text(), "3.25");
        assert_eq!(CellValue::Empty.as_text(), "");
    }

    #[test]
    fn template_invariants_are_enforced() {
        assert!(ExerciseTemplate::new(vec![], 3, 0).is_err());
        assert!(ExerciseTemplate::new(vec![vec![]], 3, 0).is_err());
        assert!(
            ExerciseTemplate::new(vec![vec![SubtaskSpec::ungraded("a")]], 0, 0).is_err()
        );
        assert!(
            ExerciseTemplate::new(
                vec![vec![SubtaskSpec::literal("a", 1.0, Some(f64::NAN), None)]],
                1,
                0
            )
            .is_err()
        );
        assert!(ExerciseTemplate::new(vec![vec![SubtaskSpec::ungraded("a")]], 1, 0).is_ok());
    }

    #[test]
    fn subtask_spec_defaults_when_deserializing() {
        let spec: SubtaskSpec = serde_json::from_str(r#"{ "name": "x" }"#).unwrap();
        assert_eq!(spec, SubtaskSpec::ungraded("x"));
    }

    #[test]
    fn student_ids_must_be_single_path_components() {
        assert!(validate_student_id("jane.doe@example.com").is_ok());
        assert!(validate_student_id("").is_err());
        assert!(validate_student_id("..").is_err());
        assert!(validate_student_id("../etc").is_err());
        assert!(validate_student_id("a\\b").is_err());
    }
}
