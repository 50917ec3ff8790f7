//! Persisted attempt data.
//!
//! An [`AttemptRecord`] is a fixed-length array of percentage slots, one per allowed attempt.
//! A slot value of `0` means "unused". A genuine 0% score is therefore indistinguishable from
//! an unused slot and does not consume an attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Value stored in a slot that has not been used yet.
pub const UNUSED_SLOT: u32 = 0;

/// Per `(student, exercise)` score history, serialized as a plain JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptRecord {
    slots: Vec<u32>,
}

impl AttemptRecord {
    /// A fresh record with `max_attempts` unused slots.
    pub fn new(max_attempts: usize) -> Self {
        Self {
            slots: vec![UNUSED_SLOT; max_attempts],
        }
    }

    pub fn from_slots(slots: Vec<u32>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[u32] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Truncates or zero-pads to `max_attempts`, keeping leading entries.
    ///
    /// Returns `true` if the length changed. Slots beyond a reduced budget are discarded.
    pub fn resize(&mut self, max_attempts: usize) -> bool {
        if self.slots.len() == max_attempts {
            return false;
        }
        self.slots.resize(max_attempts, UNUSED_SLOT);
        true
    }

    /// Copy of the record sized to `max_attempts`.
    pub fn resized(&self, max_attempts: usize) -> Self {
        let mut copy = self.clone();
        copy.resize(max_attempts);
        copy
    }

    /// Index of the first unused slot, if any.
    pub fn first_unused(&self) -> Option<usize> {
        self.slots.iter().position(|&s| s == UNUSED_SLOT)
    }

    pub(crate) fn set(&mut self, slot: usize, percentage: u32) {
        self.slots[slot] = percentage;
    }

    /// Number of slots holding a score.
    pub fn used(&self) -> usize {
        self.slots.iter().filter(|&&s| s != UNUSED_SLOT).count()
    }

    /// Highest recorded score, `None` when no slot is used.
    pub fn best(&self) -> Option<u32> {
        self.slots.iter().copied().filter(|&s| s != UNUSED_SLOT).max()
    }
}

/// One recorded attempt, appended to the per-exercise log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptLogEntry {
    pub timestamp: DateTime<Utc>,
    pub percentage: u32,
    pub mat_num: i64,
}

impl AttemptLogEntry {
    pub fn now(percentage: u32, mat_num: i64) -> Self {
        Self {
            timestamp: Utc::now(),
            percentage,
            mat_num,
        }
    }
}

/// Matriculation number used on one graded submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatNumEntry {
    pub timestamp: DateTime<Utc>,
    pub mat_num: i64,
}

impl MatNumEntry {
    pub fn now(mat_num: i64) -> Self {
        Self {
            timestamp: Utc::now(),
            mat_num,
        }
    }
}
