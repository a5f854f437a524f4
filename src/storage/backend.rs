//! Object store trait and the local filesystem implementation.
//!
//! Uploaded story sheets are stored as flat, named objects. The trait keeps
//! the rest of the crate independent of where those bytes actually live.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Metadata for a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInfo {
    pub key: String,
    pub size_bytes: u64,
    pub last_modified: DateTime<Utc>,
}

/// Trait for stores that hold uploaded story sheets.
pub trait ObjectStore: Send + Sync {
    /// Store bytes under a key, replacing any existing object.
    fn put(&mut self, key: &str, bytes: &[u8]) -> Result<ObjectInfo>;

    /// Fetch an object's bytes.
    fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// List objects whose key starts with `prefix`, in no particular order.
    fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>>;

    /// Human-readable location of an object (for display purposes).
    fn location(&self, key: &str) -> String;

    /// Get the backend type name.
    fn backend_type(&self) -> &'static str;
}

/// Objects as plain files in one directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    fn info(key: &str, path: &Path) -> Result<ObjectInfo> {
        let meta = fs::metadata(path)?;
        Ok(ObjectInfo {
            key: key.to_string(),
            size_bytes: meta.len(),
            last_modified: DateTime::<Utc>::from(meta.modified()?),
        })
    }
}

impl ObjectStore for FileStore {
    fn put(&mut self, key: &str, bytes: &[u8]) -> Result<ObjectInfo> {
        let path = self.path_for(key)?;
        fs::write(&path, bytes)?;
        Self::info(key, &path)
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        if !path.is_file() {
            return Err(Error::NotFound(format!("Object not found: {}", key)));
        }
        Ok(fs::read(path)?)
    }

    fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>> {
        let mut objects = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(key) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if key.starts_with(prefix) {
                objects.push(Self::info(&key, &entry.path())?);
            }
        }
        Ok(objects)
    }

    fn location(&self, key: &str) -> String {
        self.root.join(key).display().to_string()
    }

    fn backend_type(&self) -> &'static str {
        "file"
    }
}

/// Keys are single path components: no separators, no `..`, not empty.
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
        return Err(Error::InvalidInput(format!("Invalid object key: {:?}", key)));
    }
    Ok(())
}
