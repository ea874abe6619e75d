use super::lock::{acquire, lock_for};
use crate::error::{Result, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Write `default` to `path` unless a document is already there.
///
/// Returns `true` when the file was created by this call. An existing file is
/// left untouched whatever its content, so a write that landed between two
/// calls is never clobbered.
pub fn ensure_initialized<D: Serialize>(path: &Path, default: &D) -> Result<bool> {
    let lock = lock_for(path);
    let _guard = acquire(&lock);
    init_locked(path, default)
}

fn init_locked<D: Serialize>(path: &Path, default: &D) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    write_atomic(path, default)?;
    tracing::debug!(path = %path.display(), "initialized document");
    Ok(true)
}

pub fn load<D: DeserializeOwned>(path: &Path) -> Result<D> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(StoreError::Io(e)),
    };
    serde_json::from_str(&content).map_err(|e| StoreError::corrupt(path, e))
}

/// Persist `doc` so that readers see either the old file or the new one.
pub fn save<D: Serialize>(path: &Path, doc: &D) -> Result<()> {
    write_atomic(path, doc)
}

fn write_atomic<D: Serialize>(path: &Path, doc: &D) -> Result<()> {
    // Serialization cannot fail for the document types in this crate, but a
    // caller-supplied payload might contain a map with non-string keys.
    let content = serde_json::to_vec_pretty(doc).map_err(|e| StoreError::corrupt(path, e))?;
    replace_file(path, |file| Ok(file.write_all(&content)?))
}

/// Fill a sibling temp file through `fill`, then rename it over `path`.
///
/// Until the rename the previous file is untouched. If `fill` or the flush
/// fails the temp file is removed and `path` keeps its old content.
pub(crate) fn replace_file<T>(
    path: &Path,
    fill: impl FnOnce(&mut File) -> Result<T>,
) -> Result<T> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }

    let stem = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let tmp_path = dir.join(format!(".{}-{}.tmp", stem, Uuid::new_v4()));

    let result = File::create(&tmp_path)
        .map_err(StoreError::Io)
        .and_then(|mut file| {
            let out = fill(&mut file)?;
            file.sync_all()?;
            Ok(out)
        })
        .and_then(|out| {
            fs::rename(&tmp_path, path)?;
            Ok(out)
        });
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// Typed handle to one document file.
///
/// Mutations go through [`DocumentStore::update`], which holds the path's
/// lock from load through save. Plain reads take no lock.
///
/// The lock is looked up per call rather than held, so a handle created
/// before its directory existed still lands on the canonical lock.
pub struct DocumentStore<D> {
    path: PathBuf,
    doc: PhantomData<fn() -> D>,
}

impl<D> Clone for DocumentStore<D> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            doc: PhantomData,
        }
    }
}

impl<D> std::fmt::Debug for DocumentStore<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("path", &self.path)
            .finish()
    }
}

impl<D: Serialize + DeserializeOwned> DocumentStore<D> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            doc: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn ensure_initialized(&self, default: &D) -> Result<bool> {
        ensure_initialized(&self.path, default)
    }

    pub fn load(&self) -> Result<D> {
        load(&self.path)
    }

    /// Like [`DocumentStore::load`], but a missing file is first created from
    /// `default`, so the first read of a resource leaves it on disk.
    pub fn load_or_init(&self, default: impl FnOnce() -> D) -> Result<D> {
        match load(&self.path) {
            Err(StoreError::NotFound(_)) => {
                ensure_initialized(&self.path, &default())?;
                load(&self.path)
            }
            other => other,
        }
    }

    /// Replace the whole document.
    pub fn save(&self, doc: &D) -> Result<()> {
        let lock = lock_for(&self.path);
        let _guard = acquire(&lock);
        write_atomic(&self.path, doc)
    }

    /// Read-modify-write as one critical section.
    ///
    /// A missing file is seeded from `default` first. A corrupt file aborts
    /// with `CorruptData` and is left as it is.
    pub fn update<T, F>(&self, default: impl FnOnce() -> D, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut D) -> T,
    {
        let lock = lock_for(&self.path);
        let _guard = acquire(&lock);
        let mut doc = match load(&self.path) {
            Ok(doc) => doc,
            Err(StoreError::NotFound(_)) => default(),
            Err(e) => return Err(e),
        };
        let out = mutate(&mut doc);
        write_atomic(&self.path, &doc)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    #[test]
    fn test_ensure_initialized_creates_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");

        assert!(ensure_initialized(&path, &json!({"chats": []})).unwrap());
        let loaded: Value = load(&path).unwrap();
        assert_eq!(loaded, json!({"chats": []}));
    }

    #[test]
    fn test_ensure_initialized_does_not_clobber() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");

        ensure_initialized(&path, &json!({"n": 0})).unwrap();
        save(&path, &json!({"n": 1})).unwrap();
        assert!(!ensure_initialized(&path, &json!({"n": 0})).unwrap());

        let loaded: Value = load(&path).unwrap();
        assert_eq!(loaded, json!({"n": 1}));
    }

    #[test]
    fn test_ensure_initialized_creates_missing_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("doc.json");

        ensure_initialized(&path, &json!({})).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let res: Result<Value> = load(&dir.path().join("nope.json"));
        assert!(matches!(res, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_load_empty_file_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, "").unwrap();

        let res: Result<Value> = load(&path);
        assert!(matches!(res, Err(StoreError::CorruptData { .. })));
    }

    #[test]
    fn test_load_wrong_shape_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, r#"{"chats": "not a list"}"#).unwrap();

        let res: Result<crate::model::TranscriptDocument> = load(&path);
        assert!(matches!(res, Err(StoreError::CorruptData { .. })));
    }

    #[test]
    fn test_save_leaves_no_tmp_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");

        save(&path, &json!({"a": 1})).unwrap();
        save(&path, &json!({"a": 2})).unwrap();

        for entry in fs::read_dir(dir.path()).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().into_owned();
            assert!(!name.ends_with(".tmp"), "Found leftover tmp file: {}", name);
        }
        let loaded: Value = load(&path).unwrap();
        assert_eq!(loaded, json!({"a": 2}));
    }

    #[test]
    fn test_failed_replace_keeps_previous_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "previous export").unwrap();

        let res: Result<()> = replace_file(&path, |file| {
            file.write_all(b"half a ro")?;
            Err(StoreError::Io(io::Error::new(io::ErrorKind::Other, "disk full")))
        });

        assert!(res.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous export");
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["out.csv".to_string()]);
    }

    #[test]
    fn test_load_or_init_creates_missing_document() {
        let dir = tempdir().unwrap();
        let store: DocumentStore<Vec<u32>> = DocumentStore::new(dir.path().join("nums.json"));

        assert_eq!(store.load_or_init(|| vec![1, 2]).unwrap(), vec![1, 2]);
        assert!(store.exists());
        assert_eq!(store.load().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_load_or_init_keeps_corrupt_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nums.json");
        fs::write(&path, "{{{").unwrap();
        let store: DocumentStore<Vec<u32>> = DocumentStore::new(&path);

        let res = store.load_or_init(Vec::new);
        assert!(matches!(res, Err(StoreError::CorruptData { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{{{");
    }

    #[test]
    fn test_update_seeds_missing_document() {
        let dir = tempdir().unwrap();
        let store: DocumentStore<Vec<u32>> = DocumentStore::new(dir.path().join("nums.json"));

        let len = store.update(Vec::new, |v| {
            v.push(7);
            v.len()
        });
        assert_eq!(len.unwrap(), 1);
        assert_eq!(store.load().unwrap(), vec![7]);
    }

    #[test]
    fn test_update_refuses_corrupt_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nums.json");
        fs::write(&path, "{{{").unwrap();
        let store: DocumentStore<Vec<u32>> = DocumentStore::new(&path);

        let res = store.update(Vec::new, |v| v.push(1));
        assert!(matches!(res, Err(StoreError::CorruptData { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{{{");
    }
}
