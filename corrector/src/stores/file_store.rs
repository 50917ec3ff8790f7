//! JSON-file [`AttemptStore`].
//!
//! Layout below the store root, with 1-based exercise numbers on disk:
//!
//! ```text
//! {root}/{student_id}/exercise_{n}_attempts.json     [40, 60, 0]
//! {root}/{student_id}/data/exercise_{n}_log.json     [{"timestamp": .., "percentage": 40, "mat_num": ..}, ..]
//! {root}/{student_id}/data/mat_num.json              [{"timestamp": .., "mat_num": ..}, ..]
//! ```
//!
//! Every write goes to a sibling `.tmp` file which is flushed, synced and renamed over the
//! target, so a reader sees either the old or the new content.

use super::locks::{AttemptLock, KeyedLocks};
use crate::attempts::record::{AttemptLogEntry, AttemptRecord, MatNumEntry};
use crate::error::CorrectorError;
use crate::traits::attempt_store::AttemptStore;
use crate::types::validate_student_id;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};
use util::paths;

#[derive(Debug)]
pub struct FileAttemptStore {
    root: PathBuf,
    locks: KeyedLocks,
}

impl FileAttemptStore {
    /// A store rooted at `root`. Directories are created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: KeyedLocks::new(),
        }
    }

    /// A store rooted at `{STORAGE_ROOT}/{codename}/students`.
    pub fn for_assignment(codename: &str) -> Self {
        Self::new(paths::students_dir(codename))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn student_path(
        &self,
        student_id: &str,
        build: impl FnOnce(&Path, &str) -> PathBuf,
    ) -> Result<PathBuf, CorrectorError> {
        validate_student_id(student_id)?;
        Ok(build(&self.root, student_id))
    }
}

/// Reads and parses a JSON file; `None` if it does not exist.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, CorrectorError> {
    match fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content).map(Some).map_err(|e| {
            error!(path = %path.display(), error = %e, "Corrupt JSON file in attempt store");
            CorrectorError::Json(e)
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CorrectorError::Io(e)),
    }
}

/// Replaces `path` with the JSON rendering of `value` through a temp file and a rename.
/// The temp file is removed again if any step fails.
async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), CorrectorError> {
    let content = serde_json::to_vec_pretty(value)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let tmp = paths::temp_path(path);

    let result = match write_synced(&tmp, &content).await {
        Ok(()) => fs::rename(&tmp, path).await.map_err(|e| {
            CorrectorError::Storage(format!(
                "failed to move {} into place: {e}",
                tmp.display()
            ))
        }),
        Err(e) => Err(e),
    };

    if result.is_err() {
        if let Err(e) = fs::remove_file(&tmp).await {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %tmp.display(), error = %e, "Could not remove temp file");
            }
        }
    }
    result
}

async fn write_synced(path: &Path, content: &[u8]) -> Result<(), CorrectorError> {
    let mut file = fs::File::create(path).await?;
    file.write_all(content).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

async fn append_json<T: Serialize + DeserializeOwned>(
    path: &Path,
    entry: T,
) -> Result<(), CorrectorError> {
    let mut entries: Vec<T> = read_json(path).await?.unwrap_or_default();
    entries.push(entry);
    write_json_atomic(path, &entries).await
}

#[async_trait]
impl AttemptStore for FileAttemptStore {
    async fn lock(&self, student_id: &str, exercise: usize) -> AttemptLock {
        self.locks.acquire(student_id, exercise).await
    }

    async fn load(
        &self,
        student_id: &str,
        exercise: usize,
        max_attempts: usize,
    ) -> Result<AttemptRecord, CorrectorError> {
        let path = self.student_path(student_id, |root, id| {
            paths::attempts_path(root, id, exercise)
        })?;

        let Some(mut record) = read_json::<AttemptRecord>(&path).await? else {
            debug!(student_id, exercise, "No attempt record yet");
            return Ok(AttemptRecord::new(max_attempts));
        };

        let previous = record.len();
        if record.resize(max_attempts) {
            write_json_atomic(&path, &record).await?;
            info!(
                student_id,
                exercise,
                from = previous,
                to = max_attempts,
                "Resized attempt record"
            );
        }
        Ok(record)
    }

    async fn peek(
        &self,
        student_id: &str,
        exercise: usize,
    ) -> Result<Option<AttemptRecord>, CorrectorError> {
        let path = self.student_path(student_id, |root, id| {
            paths::attempts_path(root, id, exercise)
        })?;
        read_json(&path).await
    }

    async fn save(
        &self,
        student_id: &str,
        exercise: usize,
        record: &AttemptRecord,
    ) -> Result<(), CorrectorError> {
        let path = self.student_path(student_id, |root, id| {
            paths::attempts_path(root, id, exercise)
        })?;
        write_json_atomic(&path, record).await
    }

    async fn append_log(
        &self,
        student_id: &str,
        exercise: usize,
        entry: AttemptLogEntry,
    ) -> Result<(), CorrectorError> {
        let path = self.student_path(student_id, |root, id| {
            paths::attempt_log_path(root, id, exercise)
        })?;
        append_json(&path, entry).await
    }

    async fn log(
        &self,
        student_id: &str,
        exercise: usize,
    ) -> Result<Vec<AttemptLogEntry>, CorrectorError> {
        let path = self.student_path(student_id, |root, id| {
            paths::attempt_log_path(root, id, exercise)
        })?;
        Ok(read_json(&path).await?.unwrap_or_default())
    }

    async fn append_mat_num(
        &self,
        student_id: &str,
        entry: MatNumEntry,
    ) -> Result<(), CorrectorError> {
        let path = self.student_path(student_id, paths::mat_num_path)?;
        // student-wide file, guarded by a reserved exercise key
        let _lock = self.locks.acquire(student_id, usize::MAX).await;
        append_json(&path, entry).await
    }

    async fn mat_nums(&self, student_id: &str) -> Result<Vec<MatNumEntry>, CorrectorError> {
        let path = self.student_path(student_id, paths::mat_num_path)?;
        Ok(read_json(&path).await?.unwrap_or_default())
    }

    async fn students(&self) -> Result<Vec<String>, CorrectorError> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CorrectorError::Io(e)),
        };

        let mut students = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    students.push(name.to_string());
                }
            }
        }
        students.sort();
        Ok(students)
    }
}
