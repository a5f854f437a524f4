//! Storage layer for storyboard data.
//!
//! Everything lives under one data directory:
//!
//! - `uploads/` - uploaded story sheets, one object per upload, named
//!   `stories-<timestamp>.<ext>` (see [`ObjectStore`])
//! - `analysis-results/` - one `analysis-YYYY-MM-DD.json` per day; a rerun on
//!   the same day replaces that day's file
//! - `logs/` - server log files
//!
//! The default data directory is `<data_dir>/storyboard`
//! (e.g. `~/.local/share/storyboard`).

pub mod backend;

pub use backend::{FileStore, ObjectInfo, ObjectStore};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::ingest::extension_of;
use crate::models::StoredAnalysis;
use crate::{Error, Result};

/// Key prefix shared by all uploaded story sheets.
pub const UPLOAD_PREFIX: &str = "stories";

const UPLOADS_DIR: &str = "uploads";
const RESULTS_DIR: &str = "analysis-results";
const LOGS_DIR: &str = "logs";
const ANALYSIS_PREFIX: &str = "analysis-";

/// Result of storing an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Object key the upload was stored under
    pub file_name: String,
    /// Where the object lives (for display)
    pub location: String,
    pub size_bytes: u64,
    /// SHA-256 of the uploaded bytes, hex
    pub checksum: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Storage manager for one data directory.
pub struct Storage {
    /// Root data directory
    pub root: PathBuf,
    uploads: Box<dyn ObjectStore>,
    results_dir: PathBuf,
}

impl Storage {
    /// Open storage in `data_dir`, creating the directory layout if needed.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let uploads = FileStore::open(&data_dir.join(UPLOADS_DIR))?;
        Self::with_store(data_dir, Box::new(uploads))
    }

    /// Open storage with a custom upload store.
    pub fn with_store(data_dir: &Path, uploads: Box<dyn ObjectStore>) -> Result<Self> {
        let results_dir = data_dir.join(RESULTS_DIR);
        fs::create_dir_all(&results_dir)?;
        Ok(Self {
            root: data_dir.to_path_buf(),
            uploads,
            results_dir,
        })
    }

    /// Directory for server log files.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    /// Store an uploaded sheet under a fresh timestamped key.
    pub fn store_upload(
        &mut self,
        bytes: &[u8],
        original_name: &str,
        now: DateTime<Utc>,
    ) -> Result<UploadedFile> {
        let key = upload_file_name(original_name, now);
        let info = self.uploads.put(&key, bytes)?;
        tracing::info!(key = %key, size = info.size_bytes, "stored upload");

        Ok(UploadedFile {
            location: self.uploads.location(&key),
            file_name: key,
            size_bytes: info.size_bytes,
            checksum: sha256_hex(bytes),
            uploaded_at: now,
        })
    }

    /// The most recently modified upload.
    pub fn latest_upload(&self) -> Result<ObjectInfo> {
        self.uploads
            .list(UPLOAD_PREFIX)?
            .into_iter()
            .max_by(|a, b| {
                a.last_modified
                    .cmp(&b.last_modified)
                    .then_with(|| a.key.cmp(&b.key))
            })
            .ok_or(Error::NoUploads)
    }

    /// All uploads, newest first.
    pub fn list_uploads(&self) -> Result<Vec<ObjectInfo>> {
        let mut uploads = self.uploads.list(UPLOAD_PREFIX)?;
        uploads.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| b.key.cmp(&a.key))
        });
        Ok(uploads)
    }

    pub fn read_upload(&self, key: &str) -> Result<Vec<u8>> {
        self.uploads.get(key)
    }

    /// Write an analysis to the results directory and return its path.
    ///
    /// The file is written to a temporary name first and then renamed, so
    /// readers never observe a partial file.
    pub fn save_analysis(&self, analysis: &StoredAnalysis) -> Result<PathBuf> {
        let path = self.results_dir.join(analysis_file_name(analysis.timestamp));

        let mut tmp = tempfile::NamedTempFile::new_in(&self.results_dir)?;
        serde_json::to_writer_pretty(&mut tmp, analysis)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::info!(path = %path.display(), "analysis saved");
        Ok(path)
    }

    /// The newest saved analysis, if any.
    pub fn latest_analysis(&self) -> Result<Option<StoredAnalysis>> {
        let mut latest: Option<String> = None;
        for entry in fs::read_dir(&self.results_dir)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !name.starts_with(ANALYSIS_PREFIX) || !name.ends_with(".json") {
                continue;
            }
            if latest.as_ref().is_none_or(|current| name > *current) {
                latest = Some(name);
            }
        }

        match latest {
            Some(name) => {
                let content = fs::read_to_string(self.results_dir.join(name))?;
                Ok(Some(serde_json::from_str(&content)?))
            }
            None => Ok(None),
        }
    }

    /// Storage location description (for display purposes).
    pub fn describe(&self) -> String {
        format!(
            "{} (uploads: {} backend)",
            self.root.display(),
            self.uploads.backend_type()
        )
    }
}

/// Key for a new upload: `stories-<RFC 3339 time, ':' and '.' as '-'>.<ext>`.
pub fn upload_file_name(original_name: &str, now: DateTime<Utc>) -> String {
    let timestamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    let extension = extension_of(original_name);
    if extension.is_empty() {
        format!("{}-{}", UPLOAD_PREFIX, timestamp)
    } else {
        format!("{}-{}.{}", UPLOAD_PREFIX, timestamp, extension)
    }
}

/// Result file name for an analysis run at `timestamp`.
pub fn analysis_file_name(timestamp: DateTime<Utc>) -> String {
    format!("{}{}.json", ANALYSIS_PREFIX, timestamp.format("%Y-%m-%d"))
}

/// Get the default data directory, `<data_dir>/storyboard`.
pub fn default_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| Error::Other("Could not determine data directory".to_string()))?;
    Ok(data_dir.join("storyboard"))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisReport;
    use crate::test_utils::TestEnv;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, 15, 30).unwrap()
    }

    #[test]
    fn test_upload_file_name() {
        assert_eq!(
            upload_file_name("Sprint 12.XLSX", at(9)),
            "stories-2026-03-02T09-15-30-000Z.xlsx"
        );
        assert_eq!(upload_file_name("export", at(9)), "stories-2026-03-02T09-15-30-000Z");
    }

    #[test]
    fn test_store_and_read_upload() {
        let env = TestEnv::new();
        let mut storage = env.storage();

        let uploaded = storage.store_upload(b"abc", "sheet.csv", at(9)).unwrap();
        assert_eq!(uploaded.file_name, "stories-2026-03-02T09-15-30-000Z.csv");
        assert_eq!(uploaded.size_bytes, 3);
        assert_eq!(
            uploaded.checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(uploaded.location.ends_with(&uploaded.file_name));
        assert_eq!(storage.read_upload(&uploaded.file_name).unwrap(), b"abc");
    }

    #[test]
    fn test_latest_upload() {
        let env = TestEnv::new();
        let mut storage = env.storage();

        assert!(matches!(storage.latest_upload(), Err(Error::NoUploads)));

        storage.store_upload(b"one", "a.csv", at(9)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let second = storage.store_upload(b"two", "b.csv", at(10)).unwrap();

        assert_eq!(storage.latest_upload().unwrap().key, second.file_name);
        let listed = storage.list_uploads().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].key, second.file_name);
    }

    #[test]
    fn test_save_and_load_latest_analysis() {
        let env = TestEnv::new();
        let storage = env.storage();

        assert!(storage.latest_analysis().unwrap().is_none());

        let older = StoredAnalysis {
            timestamp: at(9) - Duration::days(1),
            source_file: "stories-old.csv".to_string(),
            analysis: AnalysisReport::default(),
        };
        let newer = StoredAnalysis {
            timestamp: at(9),
            source_file: "stories-new.csv".to_string(),
            analysis: AnalysisReport::default(),
        };

        let path = storage.save_analysis(&newer).unwrap();
        assert!(path.ends_with("analysis-2026-03-02.json"));
        storage.save_analysis(&older).unwrap();

        let latest = storage.latest_analysis().unwrap().unwrap();
        assert_eq!(latest, newer);
    }

    #[test]
    fn test_same_day_analysis_overwrites() {
        let env = TestEnv::new();
        let storage = env.storage();

        let mut run = StoredAnalysis {
            timestamp: at(6),
            source_file: "stories-a.csv".to_string(),
            analysis: AnalysisReport::default(),
        };
        storage.save_analysis(&run).unwrap();
        run.timestamp = at(18);
        run.source_file = "stories-b.csv".to_string();
        storage.save_analysis(&run).unwrap();

        let files = fs::read_dir(env.data_path().join(RESULTS_DIR)).unwrap().count();
        assert_eq!(files, 1);
        assert_eq!(
            storage.latest_analysis().unwrap().unwrap().source_file,
            "stories-b.csv"
        );
    }
}
