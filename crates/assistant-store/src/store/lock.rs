use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// One mutex per document path, shared by every handle in the process that
/// points at the same file. Unrelated documents never contend.
static PATH_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

pub(crate) fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    let key = lock_key(path);
    let mut locks = PATH_LOCKS.lock().unwrap_or_else(|e| e.into_inner());
    locks.entry(key).or_default().clone()
}

/// Poisoning only means another writer panicked mid-operation. The file on
/// disk is still whole (writes go through rename), so the guard is reclaimed.
pub(crate) fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(|e| e.into_inner())
}

/// The key must not change when the document's directory is created, so it is
/// built from the absolute path with only the deepest existing ancestor
/// canonicalized. Missing components are appended as written.
fn lock_key(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    let normalized = normalize(&absolute);

    let mut missing: Vec<OsString> = Vec::new();
    let mut existing = normalized.as_path();
    loop {
        if let Ok(resolved) = fs::canonicalize(existing) {
            return missing
                .iter()
                .rev()
                .fold(resolved, |key, part| key.join(part));
        }
        match (existing.file_name(), existing.parent()) {
            (Some(name), Some(up)) => {
                missing.push(name.to_os_string());
                existing = up;
            }
            _ => return normalized,
        }
    }
}

/// Drop `.` and fold `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_same_path_shares_lock() {
        let dir = tempdir().unwrap();
        let a = lock_for(&dir.path().join("doc.json"));
        let b = lock_for(&dir.path().join(".").join("doc.json"));
        let c = lock_for(&dir.path().join("sub").join("..").join("doc.json"));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_different_paths_do_not_share_lock() {
        let dir = tempdir().unwrap();
        let a = lock_for(&dir.path().join("one.json"));
        let b = lock_for(&dir.path().join("two.json"));
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_lock_survives_directory_creation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("nested").join("doc.json");

        let before = lock_for(&path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let after = lock_for(&path);
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[cfg(unix)]
    #[test]
    fn test_lock_through_symlinked_root_survives_directory_creation() {
        let dir = tempdir().unwrap();
        let real = dir.path().join("real");
        let link = dir.path().join("link");
        fs::create_dir(&real).unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let via_link = link.join("data").join("doc.json");
        let before = lock_for(&via_link);
        fs::create_dir_all(real.join("data")).unwrap();
        let after = lock_for(&via_link);
        let direct = lock_for(&real.join("data").join("doc.json"));

        assert!(Arc::ptr_eq(&before, &after));
        assert!(Arc::ptr_eq(&before, &direct));
    }

    #[test]
    fn test_relative_path_shares_lock_with_absolute() {
        let relative = Path::new("assistant-store-lock-rel").join("chat_history.json");
        let absolute = env::current_dir().unwrap().join(&relative);

        let a = lock_for(&relative);
        let b = lock_for(&absolute);
        assert!(Arc::ptr_eq(&a, &b));
    }
}
