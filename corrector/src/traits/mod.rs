//!
//! Traits Module
//!
//! This module contains the seams of the corrector: every collaborator the correction job
//! talks to is reached through one of these traits, so hosts and tests can swap them.
//!
//! - [`comparator`]: Compares one submitted value against one expected value.
//! - [`evaluator`]: Re-evaluates a parameterized template for one student.
//! - [`attempt_store`]: Persists attempt records and their audit trail.
//! - [`parser`]: Converts raw collaborator input into strongly-typed values.

pub mod attempt_store;
pub mod comparator;
pub mod evaluator;
pub mod parser;
