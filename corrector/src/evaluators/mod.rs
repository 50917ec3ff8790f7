//! # Evaluators
//!
//! [`crate::traits::evaluator::TemplateEvaluator`] implementations that ship with the crate.

pub mod formula;
pub mod formula_evaluator;

pub use formula_evaluator::FormulaEvaluator;
