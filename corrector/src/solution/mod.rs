//! # Answer Keys
//!
//! Materializes a student-specific answer key from a parameterized template through an
//! injected [`crate::traits::evaluator::TemplateEvaluator`].

pub mod generator;

pub use generator::{EvaluatorSession, SolutionGenerator};
