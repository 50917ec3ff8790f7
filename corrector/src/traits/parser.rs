//! Parser Trait
//!
//! This module defines the [`Parser`] trait, which provides a generic interface for parsing
//! collaborator output (template rows, submission rows) into strongly-typed Rust structures.
//! Implementations are responsible for validating the input and converting it into the
//! appropriate domain model, returning detailed errors on failure.
//!
//! # Example
//!
//! ```rust
//! use corrector::error::CorrectorError;
//! use corrector::traits::parser::Parser;
//! use serde_json::Value;
//! use util::assignment_config::AssignmentConfig;
//!
//! struct MyJsonParser;
//! struct MyRows;
//!
//! impl<'a> Parser<&'a Value, MyRows> for MyJsonParser {
//!     fn parse(&self, _raw: &'a Value, _config: &AssignmentConfig) -> Result<MyRows, CorrectorError> {
//!         Ok(MyRows)
//!     }
//! }
//! ```

use util::assignment_config::AssignmentConfig;

use crate::error::CorrectorError;

/// A generic trait for parsing data into a strongly-typed Rust structure.
///
/// # Type Parameters
///
/// * `Input` - The input type to be parsed.
/// * `Output` - The output type produced by the parser.
pub trait Parser<Input, Output> {
    /// Parse an input value into the target type.
    ///
    /// # Errors
    ///
    /// Returns a [`CorrectorError`] if the input does not conform to the expected schema.
    fn parse(&self, input: Input, config: &AssignmentConfig) -> Result<Output, CorrectorError>;
}
