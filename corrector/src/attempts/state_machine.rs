//! # Attempt State Machine
//!
//! Each `(student, exercise)` pair moves through
//!
//! ```text
//! Fresh ──► InProgress ──► Blocked   (slots exhausted below 100)
//!   │            │
//!   └────────────┴───────► Passed    (any slot holds 100)
//! ```
//!
//! `Blocked` and `Passed` are terminal. The correction job checks [`status`] before doing any
//! comparison work and skips terminal exercises; only non-terminal records are handed to
//! [`evaluate_and_record`].
//!
//! A score of exactly 100 always wins: it is excluded from the blocking predicate, so filling
//! the last slot with 100 passes rather than blocks.

use super::record::{AttemptRecord, UNUSED_SLOT};
use crate::error::CorrectorError;
use serde::Serialize;

/// Score that passes an exercise.
pub const PASS_PERCENTAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// No slot used yet.
    Fresh,
    /// Some slots used, none at 100, slots remain.
    InProgress,
    /// All slots used without reaching 100.
    Blocked,
    /// At least one slot holds 100.
    Passed,
}

impl AttemptStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AttemptStatus::Blocked | AttemptStatus::Passed)
    }
}

/// Result of recording one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// The student is blocked for this exercise after this call.
    pub blocked: bool,
    /// This attempt passed the exercise.
    pub passed: bool,
    /// Slot the score was written to, `None` if the record was already exhausted.
    pub slot: Option<usize>,
}

/// The last slot holds a score below 100.
fn last_slot_failed(record: &AttemptRecord) -> bool {
    matches!(record.slots().last(), Some(&last) if last != UNUSED_SLOT && last < PASS_PERCENTAGE)
}

/// Read-only status of a record. Blocking is checked before passing.
pub fn status(record: &AttemptRecord) -> AttemptStatus {
    if last_slot_failed(record) {
        AttemptStatus::Blocked
    } else if record.slots().contains(&PASS_PERCENTAGE) {
        AttemptStatus::Passed
    } else if record.used() == 0 {
        AttemptStatus::Fresh
    } else {
        AttemptStatus::InProgress
    }
}

/// Writes `new_percentage` into the first unused slot and reports the resulting flags.
///
/// An exhausted record is left untouched and reported as blocked. `passed` and `blocked`
/// are never both set.
///
/// # Errors
///
/// [`CorrectorError::InvalidPercentage`] if `new_percentage` exceeds 100.
pub fn evaluate_and_record(
    record: &mut AttemptRecord,
    new_percentage: u32,
) -> Result<Transition, CorrectorError> {
    if new_percentage > PASS_PERCENTAGE {
        return Err(CorrectorError::InvalidPercentage(new_percentage));
    }

    let Some(slot) = record.first_unused() else {
        return Ok(Transition {
            blocked: true,
            passed: false,
            slot: None,
        });
    };

    record.set(slot, new_percentage);

    Ok(Transition {
        blocked: last_slot_failed(record),
        passed: new_percentage == PASS_PERCENTAGE,
        slot: Some(slot),
    })
}
