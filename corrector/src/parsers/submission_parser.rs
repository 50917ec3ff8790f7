//! Submission Row Parser
//!
//! [`JsonSubmissionParser`] turns the values read from a student's workbook into a
//! [`StudentSubmission`].
//!
//! # JSON Schema
//!
//! ```json
//! {
//!   "student_id": "jane.doe@example.com",
//!   "mat_num": 123456,
//!   "dummies": [2, "2,6"],
//!   "rows": [
//!     { "exercise": 1, "value": "10.4" },
//!     { "exercise": 1, "value": "Red" },
//!     { "exercise": 3, "value": null }
//!   ]
//! }
//! ```
//!
//! The number of dummies is not checked here; the template being corrected against decides
//! how many it needs.
//!
//! Rows follow the grouping rules of the template parser. An exercise without rows is
//! reported as untouched (`None`). A `null` value is kept as an empty cell, which makes the
//! correction job skip that exercise.

use crate::error::CorrectorError;
use crate::parsers::group_rows;
use crate::traits::parser::Parser;
use crate::types::{CellValue, StudentSubmission, validate_student_id};
use serde::Deserialize;
use serde_json::Value;
use util::assignment_config::AssignmentConfig;

#[derive(Debug, Deserialize)]
struct SubmissionDocument {
    student_id: String,
    #[serde(default)]
    mat_num: Option<Value>,
    #[serde(default)]
    dummies: Vec<CellValue>,
    #[serde(default)]
    rows: Vec<SubmissionRow>,
}

#[derive(Debug, Deserialize)]
struct SubmissionRow {
    exercise: i64,
    #[serde(default)]
    value: CellValue,
}

pub struct JsonSubmissionParser;

/// Accepts integers and integral floats (spreadsheets store numbers as floats).
fn mat_num(raw: Option<&Value>) -> Result<i64, CorrectorError> {
    let value = raw
        .filter(|v| !v.is_null())
        .ok_or_else(|| CorrectorError::InvalidSubmission("missing matriculation number".into()))?;

    let number = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        CorrectorError::InvalidSubmission(format!("matriculation number {value} is not an integer"))
    })?;

    if number < 0 {
        return Err(CorrectorError::InvalidSubmission(format!(
            "matriculation number {number} is negative"
        )));
    }
    Ok(number)
}

impl<'a> Parser<&'a Value, StudentSubmission> for JsonSubmissionParser {
    fn parse(
        &self,
        raw: &'a Value,
        _config: &AssignmentConfig,
    ) -> Result<StudentSubmission, CorrectorError> {
        let doc = SubmissionDocument::deserialize(raw)
            .map_err(|e| CorrectorError::InvalidSubmission(e.to_string()))?;

        validate_student_id(&doc.student_id)?;
        let mat_num = mat_num(doc.mat_num.as_ref())?;

        if doc.rows.is_empty() {
            return Err(CorrectorError::InvalidSubmission(
                "submission contains no answer rows".to_string(),
            ));
        }

        let submitted_answers = group_rows(doc.rows.into_iter().map(|r| (r.exercise, r.value)))
            .map_err(CorrectorError::InvalidSubmission)?;

        Ok(StudentSubmission {
            student_id: doc.student_id,
            mat_num,
            dummy_values: doc.dummies,
            submitted_answers,
        })
    }
}
