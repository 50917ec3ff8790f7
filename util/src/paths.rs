use crate::config;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Ensure the parent directory of a *file path* exists (no-op if none).
pub fn ensure_parent_dir<P: AsRef<Path>>(file_path: P) -> io::Result<()> {
    if let Some(parent) = file_path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Global storage root (absolute), from `config::storage_root()`.
/// If relative in env, resolve against current_dir().
pub fn storage_root() -> PathBuf {
    let root = config::storage_root();
    let p = PathBuf::from(root);
    if p.is_absolute() {
        p
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(p)
    }
}

// ─── Assignment level ───────────────────────────────────────────────

// {STORAGE_ROOT}/{codename}
pub fn assignment_dir(codename: &str) -> PathBuf {
    storage_root().join(codename)
}

// {STORAGE_ROOT}/{codename}/config.json
pub fn assignment_config_path(codename: &str) -> PathBuf {
    assignment_dir(codename).join("config.json")
}

// {STORAGE_ROOT}/{codename}/template.json
pub fn template_path(codename: &str) -> PathBuf {
    assignment_dir(codename).join("template.json")
}

// {STORAGE_ROOT}/{codename}/students
pub fn students_dir(codename: &str) -> PathBuf {
    assignment_dir(codename).join("students")
}

// ─── Student level (relative to an attempt-store root) ──────────────
//
// Exercise indices are 0-based in code and 1-based on disk.

// {root}/{student_id}
pub fn student_dir(root: &Path, student_id: &str) -> PathBuf {
    root.join(student_id)
}

// {root}/{student_id}/exercise_{n}_attempts.json
pub fn attempts_path(root: &Path, student_id: &str, exercise: usize) -> PathBuf {
    student_dir(root, student_id).join(format!("exercise_{}_attempts.json", exercise + 1))
}

// {root}/{student_id}/data
pub fn student_data_dir(root: &Path, student_id: &str) -> PathBuf {
    student_dir(root, student_id).join("data")
}

// {root}/{student_id}/data/exercise_{n}_log.json
pub fn attempt_log_path(root: &Path, student_id: &str, exercise: usize) -> PathBuf {
    student_data_dir(root, student_id).join(format!("exercise_{}_log.json", exercise + 1))
}

// {root}/{student_id}/data/mat_num.json
pub fn mat_num_path(root: &Path, student_id: &str) -> PathBuf {
    student_data_dir(root, student_id).join("mat_num.json")
}

/// Sibling temp path used for write-then-rename saves.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut tmp = final_path.to_path_buf();
    let fname = final_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("record.json");
    tmp.set_file_name(format!("{fname}.tmp"));
    tmp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use serial_test::serial;
    use tempfile::TempDir;

    fn set_root(root: &str) {
        unsafe {
            std::env::set_var("STORAGE_ROOT", root);
        }
        AppConfig::reset();
    }

    #[test]
    #[serial]
    fn root_resolves_relative_against_cwd() {
        set_root("storage_rel");

        let expected = std::env::current_dir().unwrap().join("storage_rel");
        assert_eq!(storage_root(), expected);
    }

    #[test]
    #[serial]
    fn root_uses_absolute_as_is() {
        let td = TempDir::new().unwrap();
        let abs = td.path().to_path_buf();

        set_root(abs.to_str().unwrap());

        assert_eq!(storage_root(), abs);
    }

    #[test]
    #[serial]
    fn assignment_helpers_construct_expected_paths() {
        let td = TempDir::new().unwrap();
        let root = td.path().to_path_buf();
        set_root(root.to_str().unwrap());

        assert_eq!(assignment_dir("hydro_1"), root.join("hydro_1"));
        assert_eq!(
            assignment_config_path("hydro_1"),
            root.join("hydro_1").join("config.json")
        );
        assert_eq!(
            template_path("hydro_1"),
            root.join("hydro_1").join("template.json")
        );
        assert_eq!(
            students_dir("hydro_1"),
            root.join("hydro_1").join("students")
        );
    }

    #[test]
    fn student_helpers_use_one_based_exercise_numbers() {
        let root = Path::new("/srv/store");

        assert_eq!(
            attempts_path(root, "jane@example.com", 0),
            root.join("jane@example.com").join("exercise_1_attempts.json")
        );
        assert_eq!(
            attempt_log_path(root, "jane@example.com", 2),
            root.join("jane@example.com")
                .join("data")
                .join("exercise_3_log.json")
        );
        assert_eq!(
            mat_num_path(root, "jane@example.com"),
            root.join("jane@example.com").join("data").join("mat_num.json")
        );
    }

    #[test]
    fn temp_path_is_a_sibling() {
        let p = Path::new("/a/b/exercise_1_attempts.json");
        assert_eq!(temp_path(p), Path::new("/a/b/exercise_1_attempts.json.tmp"));
    }

    #[test]
    fn ensure_parent_dir_creates_directories() {
        let td = TempDir::new().unwrap();
        let file = td.path().join("p").join("q").join("file.json");
        ensure_parent_dir(&file).unwrap();
        assert!(td.path().join("p").join("q").is_dir());
    }
}
