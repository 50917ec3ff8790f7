//! Attempt Store Trait
//!
//! Persistence seam for attempt records. A store keeps, per `(student_id, exercise)`:
//!
//! - the fixed-length [`AttemptRecord`] consulted by the attempt state machine,
//! - an append-only log of every recorded attempt ([`AttemptLogEntry`]),
//!
//! and, per student, the matriculation numbers used on each graded submission
//! ([`MatNumEntry`]).
//!
//! # Critical sections
//!
//! `load` → state machine → `save` must not interleave for the same key. Callers take
//! [`AttemptStore::lock`] first and hold the returned [`AttemptLock`] until the record
//! has been saved. Different keys never contend.
//!
//! Exercise indices are 0-based everywhere in this API.

use crate::attempts::record::{AttemptLogEntry, AttemptRecord, MatNumEntry};
use crate::error::CorrectorError;
use crate::stores::locks::AttemptLock;
use async_trait::async_trait;

#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Waits for exclusive access to one `(student_id, exercise)` key.
    async fn lock(&self, student_id: &str, exercise: usize) -> AttemptLock;

    /// Returns the record for the key, sized to `max_attempts`.
    ///
    /// A missing record is returned as all-zero. A stored record of a different
    /// length is truncated or zero-padded and written back before returning.
    async fn load(
        &self,
        student_id: &str,
        exercise: usize,
        max_attempts: usize,
    ) -> Result<AttemptRecord, CorrectorError>;

    /// Returns the stored record exactly as persisted, without resizing or writing.
    ///
    /// Used by read-only consumers (reporting, the final pass check).
    async fn peek(
        &self,
        student_id: &str,
        exercise: usize,
    ) -> Result<Option<AttemptRecord>, CorrectorError>;

    /// Replaces the stored record. Readers never observe a partial write.
    async fn save(
        &self,
        student_id: &str,
        exercise: usize,
        record: &AttemptRecord,
    ) -> Result<(), CorrectorError>;

    /// Appends one entry to the attempt log of the key.
    async fn append_log(
        &self,
        student_id: &str,
        exercise: usize,
        entry: AttemptLogEntry,
    ) -> Result<(), CorrectorError>;

    /// Full attempt log of the key, oldest first. Empty if nothing was recorded.
    async fn log(&self, student_id: &str, exercise: usize)
    -> Result<Vec<AttemptLogEntry>, CorrectorError>;

    /// Appends one matriculation-number audit entry for the student.
    async fn append_mat_num(&self, student_id: &str, entry: MatNumEntry)
    -> Result<(), CorrectorError>;

    /// Matriculation-number audit entries of the student, oldest first.
    async fn mat_nums(&self, student_id: &str) -> Result<Vec<MatNumEntry>, CorrectorError>;

    /// Every student the store holds data for, sorted.
    async fn students(&self) -> Result<Vec<String>, CorrectorError>;
}
