use crate::error::{MiggenError, MiggenResult};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn read_to_string(path: &Path) -> MiggenResult<String> {
    std::fs::read_to_string(path).map_err(|e| MiggenError::io(path, e))
}

pub fn create_dir_all(path: &Path) -> MiggenResult<()> {
    std::fs::create_dir_all(path).map_err(|e| MiggenError::io(path, e))
}

/// Write through a sibling `.tmp` file and rename over `path`, so a failed
/// write never leaves a half-spliced file behind.
pub fn write_atomic(path: &Path, content: &str) -> MiggenResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }

    let tmp = tmp_path(path);
    std::fs::write(&tmp, content).map_err(|e| MiggenError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        MiggenError::io(path, e)
    })?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "wrote file");
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => path.with_extension(format!("{ext}.tmp")),
        None => path.with_extension("tmp"),
    }
}

/// Exclusive lock held for the duration of one action.
///
/// The lock file is created with create-new semantics and removed on drop,
/// along with any directories `acquire` had to create that are still empty.
/// A stale lock left by a killed process has to be deleted by hand.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    /// Directories created for the lock file, deepest first.
    created_dirs: Vec<PathBuf>,
}

impl LockGuard {
    pub fn acquire(path: impl Into<PathBuf>) -> MiggenResult<Self> {
        let path = path.into();
        let mut created_dirs = Vec::new();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                created_dirs = parent
                    .ancestors()
                    .take_while(|dir| !dir.as_os_str().is_empty() && !dir.exists())
                    .map(Path::to_path_buf)
                    .collect();
                create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => MiggenError::Locked { path: path.clone() },
                _ => MiggenError::io(&path, e),
            })?;
        writeln!(file, "{}", std::process::id()).map_err(|e| MiggenError::io(&path, e))?;

        tracing::debug!(path = %path.display(), "acquired lock");
        Ok(Self { path, created_dirs })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove lock file");
        }
        // remove_dir refuses non-empty directories, so anything the action
        // wrote keeps its directory.
        for dir in &self.created_dirs {
            if std::fs::remove_dir(dir).is_err() {
                break;
            }
            tracing::debug!(path = %dir.display(), "removed empty directory");
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::make_temp_dir;
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn write_atomic_creates_parents_and_leaves_no_tmp() {
        let dir = make_temp_dir("fsutil");
        let target = dir.join("nested").join("file.go");

        write_atomic(&target, "package model\n").expect("write");
        assert_eq!(read_to_string(&target).expect("read"), "package model\n");
        assert!(!dir.join("nested").join("file.go.tmp").exists());

        std::fs::remove_dir_all(dir).expect("cleanup");
    }

    #[test]
    fn lock_is_exclusive_and_released_on_drop() {
        let dir = make_temp_dir("lock");
        let lock_path = dir.join(".miggen.lock");

        let guard = LockGuard::acquire(&lock_path).expect("first lock");
        let err = LockGuard::acquire(&lock_path).expect_err("second lock must fail");
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(matches!(err, MiggenError::Locked { .. }));

        drop(guard);
        assert!(!lock_path.exists());
        let again = LockGuard::acquire(&lock_path).expect("lock after release");

        drop(again);
        std::fs::remove_dir_all(dir).expect("cleanup");
    }

    #[test]
    fn lock_removes_only_directories_it_created_and_left_empty() {
        let dir = make_temp_dir("lock-dirs");
        let lock_path = dir.join("db").join("migration").join(".miggen.lock");

        let guard = LockGuard::acquire(&lock_path).expect("lock");
        assert!(dir.join("db").join("migration").is_dir());
        drop(guard);
        assert!(!dir.join("db").exists());
        assert!(dir.exists());

        let guard = LockGuard::acquire(&lock_path).expect("lock");
        write_atomic(&dir.join("db").join("migration").join("migration.go"), "package migration\n")
            .expect("write");
        drop(guard);
        assert!(dir.join("db").join("migration").join("migration.go").exists());
        assert!(!lock_path.exists());

        std::fs::remove_dir_all(dir).expect("cleanup");
    }
}
