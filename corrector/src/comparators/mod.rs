//! # Comparators
//!
//! Strategies for deciding whether one submitted value matches one expected value.
//! All comparators implement [`crate::traits::comparator::ValueComparator`], so the
//! correction job can be configured with a different policy without touching its flow.
//!
//! The available comparators are:
//! - [`tolerance_comparator`]: case-insensitive text equality, relative/absolute numeric windows.

pub mod tolerance_comparator;
