//! # Attempt Tracking
//!
//! Bounded-retry bookkeeping per `(student, exercise)`:
//!
//! - [`record`]: the persisted slot array and the audit entries written next to it.
//! - [`state_machine`]: status derivation and the transition that records a new score.

pub mod record;
pub mod state_machine;

pub use record::{AttemptLogEntry, AttemptRecord, MatNumEntry};
pub use state_machine::{AttemptStatus, Transition};
