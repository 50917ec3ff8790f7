//! Template Row Parser
//!
//! This module provides the [`JsonTemplateParser`] for turning the rows read from a template
//! workbook into an [`ExerciseTemplate`].
//!
//! # JSON Schema
//!
//! ```json
//! {
//!   "max_attempts": 3,
//!   "dummy_count": 2,
//!   "rows": [
//!     { "exercise": 1, "name": "F",      "formula": "=a1*a2", "tolerance_rel": 1 },
//!     { "exercise": 1, "name": "colour", "expected": "red" },
//!     { "exercise": 2, "name": "x",      "expected": 10.0, "tolerance_abs": 0.5 }
//!   ]
//! }
//! ```
//!
//! - `max_attempts` and `dummy_count` are optional and default to the assignment config.
//! - Rows belong to the 1-based exercise named by `exercise`. Exercise numbers must not
//!   decrease from one row to the next; the order of rows within an exercise is the order
//!   of its sub-tasks.
//! - `expected` is a number, a string or `null`. `formula`, `tolerance_rel` and
//!   `tolerance_abs` are optional.
//!
//! # Error Handling
//!
//! Every violation is reported as [`CorrectorError::InvalidTemplate`].

use crate::error::CorrectorError;
use crate::parsers::group_rows;
use crate::traits::parser::Parser;
use crate::types::{CellValue, ExerciseTemplate, SubtaskSpec};
use serde::Deserialize;
use serde_json::Value;
use util::assignment_config::AssignmentConfig;

#[derive(Debug, Deserialize)]
struct TemplateDocument {
    max_attempts: Option<usize>,
    dummy_count: Option<usize>,
    rows: Vec<TemplateRow>,
}

#[derive(Debug, Deserialize)]
struct TemplateRow {
    exercise: i64,
    name: String,
    #[serde(default)]
    expected: CellValue,
    #[serde(default)]
    formula: Option<String>,
    #[serde(default)]
    tolerance_rel: Option<f64>,
    #[serde(default)]
    tolerance_abs: Option<f64>,
}

/// Parser for template rows in JSON format.
pub struct JsonTemplateParser;

impl<'a> Parser<&'a Value, ExerciseTemplate> for JsonTemplateParser {
    fn parse(
        &self,
        raw: &'a Value,
        config: &AssignmentConfig,
    ) -> Result<ExerciseTemplate, CorrectorError> {
        let doc = TemplateDocument::deserialize(raw)
            .map_err(|e| CorrectorError::InvalidTemplate(e.to_string()))?;

        if doc.rows.is_empty() {
            return Err(CorrectorError::InvalidTemplate(
                "'rows' must not be empty".to_string(),
            ));
        }

        let rows = doc.rows.into_iter().map(|row| {
            let spec = SubtaskSpec {
                name: row.name,
                expected_value: row.expected,
                formula: row.formula.filter(|f| !f.trim().is_empty()),
                tolerance_rel: row.tolerance_rel,
                tolerance_abs: row.tolerance_abs,
            };
            (row.exercise, spec)
        });
        let exercises = group_rows(rows)
            .map_err(CorrectorError::InvalidTemplate)?
            .into_iter()
            .enumerate()
            .map(|(idx, subtasks)| {
                subtasks.ok_or_else(|| {
                    CorrectorError::InvalidTemplate(format!("exercise {} has no rows", idx + 1))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        ExerciseTemplate::new(
            exercises,
            doc.max_attempts.unwrap_or(config.max_attempts),
            doc.dummy_count.unwrap_or(config.dummy_count),
        )
    }
}
