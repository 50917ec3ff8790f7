use super::locks::{AttemptLock, KeyedLocks};
use crate::attempts::record::{AttemptLogEntry, AttemptRecord, MatNumEntry};
use crate::error::CorrectorError;
use crate::traits::attempt_store::AttemptStore;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::Mutex;
use tracing::info;

type Key = (String, usize);

#[derive(Debug, Default)]
struct Data {
    records: HashMap<Key, AttemptRecord>,
    logs: HashMap<Key, Vec<AttemptLogEntry>>,
    mat_nums: HashMap<String, Vec<MatNumEntry>>,
}

/// In-process [`AttemptStore`] for tests and dry runs. Nothing outlives the value.
#[derive(Debug, Default)]
pub struct MemoryAttemptStore {
    locks: KeyedLocks,
    data: Mutex<Data>,
}

impl MemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(student_id: &str, exercise: usize) -> Key {
    (student_id.to_string(), exercise)
}

#[async_trait]
impl AttemptStore for MemoryAttemptStore {
    async fn lock(&self, student_id: &str, exercise: usize) -> AttemptLock {
        self.locks.acquire(student_id, exercise).await
    }

    async fn load(
        &self,
        student_id: &str,
        exercise: usize,
        max_attempts: usize,
    ) -> Result<AttemptRecord, CorrectorError> {
        let mut data = self.data.lock().await;
        let Some(record) = data.records.get_mut(&key(student_id, exercise)) else {
            return Ok(AttemptRecord::new(max_attempts));
        };
        let previous = record.len();
        if record.resize(max_attempts) {
            info!(
                student_id,
                exercise,
                from = previous,
                to = max_attempts,
                "Resized attempt record"
            );
        }
        Ok(record.clone())
    }

    async fn peek(
        &self,
        student_id: &str,
        exercise: usize,
    ) -> Result<Option<AttemptRecord>, CorrectorError> {
        let data = self.data.lock().await;
        Ok(data.records.get(&key(student_id, exercise)).cloned())
    }

    async fn save(
        &self,
        student_id: &str,
        exercise: usize,
        record: &AttemptRecord,
    ) -> Result<(), CorrectorError> {
        let mut data = self.data.lock().await;
        data.records.insert(key(student_id, exercise), record.clone());
        Ok(())
    }

    async fn append_log(
        &self,
        student_id: &str,
        exercise: usize,
        entry: AttemptLogEntry,
    ) -> Result<(), CorrectorError> {
        let mut data = self.data.lock().await;
        data.logs
            .entry(key(student_id, exercise))
            .or_default()
            .push(entry);
        Ok(())
    }

    async fn log(
        &self,
        student_id: &str,
        exercise: usize,
    ) -> Result<Vec<AttemptLogEntry>, CorrectorError> {
        let data = self.data.lock().await;
        Ok(data
            .logs
            .get(&key(student_id, exercise))
            .cloned()
            .unwrap_or_default())
    }

    async fn append_mat_num(
        &self,
        student_id: &str,
        entry: MatNumEntry,
    ) -> Result<(), CorrectorError> {
        let mut data = self.data.lock().await;
        data.mat_nums
            .entry(student_id.to_string())
            .or_default()
            .push(entry);
        Ok(())
    }

    async fn mat_nums(&self, student_id: &str) -> Result<Vec<MatNumEntry>, CorrectorError> {
        let data = self.data.lock().await;
        Ok(data.mat_nums.get(student_id).cloned().unwrap_or_default())
    }

    async fn students(&self) -> Result<Vec<String>, CorrectorError> {
        let data = self.data.lock().await;
        let students: BTreeSet<String> = data
            .records
            .keys()
            .chain(data.logs.keys())
            .map(|(student, _)| student.clone())
            .chain(data.mat_nums.keys().cloned())
            .collect();
        Ok(students.into_iter().collect())
    }
}
