//! Template Evaluator Trait
//!
//! The spreadsheet collaborator that turns a parameterized template into a concrete answer key.
//! Real implementations drive a spreadsheet application: they substitute the matriculation number
//! and the dummy values into the designated input cells, let the workbook recompute, and read the
//! expected values back.
//!
//! Evaluators hold an external resource between [`TemplateEvaluator::open`] and
//! [`TemplateEvaluator::close`]. Callers never invoke these directly; they go through
//! [`crate::solution::EvaluatorSession`], which guarantees `close` on every exit path.
//!
//! # Contract
//!
//! For identical `mat_num` and `dummy_values`, `evaluate` must return identical results.

use crate::error::CorrectorError;
use crate::types::{CellValue, ExerciseTemplate, SolutionMatrix};

pub trait TemplateEvaluator: Send {
    /// Acquires whatever the evaluator needs (application handle, workbook).
    fn open(&mut self) -> Result<(), CorrectorError> {
        Ok(())
    }

    /// Resolves every sub-task of `template` for one student.
    ///
    /// # Errors
    ///
    /// Returns [`CorrectorError::TemplateEvaluation`] if any required value cannot be produced.
    fn evaluate(
        &mut self,
        template: &ExerciseTemplate,
        mat_num: i64,
        dummy_values: &[CellValue],
    ) -> Result<SolutionMatrix, CorrectorError>;

    /// Releases the resources taken by `open`. Must be safe to call more than once.
    fn close(&mut self) {}
}
