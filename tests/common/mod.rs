//! Common test utilities for storyboard integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't pollute
//! the user's `~/.local/share/storyboard/` directory or their config.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// Reference time used by tests that classify [`SAMPLE_CSV`].
pub const NOW: &str = "2026-03-02T09:00:00Z";

/// Four stories: S-1 overdue, S-2 need to start, S-3 at risk, S-4 closed.
pub const SAMPLE_CSV: &str = "\
id,description,epicDescription,projectDescription,dueDate,duration,timeSpent,status,priority
S-1,Fix login redirect,Auth,Portal,2026-02-27,16,4,In progress,high
S-2,Write onboarding docs,Docs,Handbook,2026-03-20,8,0,To Do,low
S-3,Ship release candidate,Release,Portal,2026-03-03,40,8,In test,medium
S-4,Retire old login,Auth,Portal,2026-01-01,4,4,Closed,high
";

/// A test environment with isolated data storage.
///
/// Each `TestEnv` creates two temporary directories:
/// - `work_dir`: Working directory holding input sheets
/// - `data_dir`: Holds storyboard's data (via `SBD_DATA_DIR` env var)
///
/// The `sbd()` method returns a `Command` that sets `SBD_DATA_DIR` and
/// `SBD_CONFIG` per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub work_dir: TempDir,
    pub data_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            work_dir: TempDir::new().unwrap(),
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the sbd binary with isolated data and config.
    pub fn sbd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_sbd"));
        cmd.current_dir(self.work_dir.path());
        cmd.env("SBD_DATA_DIR", self.data_dir.path());
        cmd.env("SBD_CONFIG", self.config_path());
        cmd.env_remove("SBD_HOST");
        cmd.env_remove("SBD_PORT");
        cmd.env_remove("SBD_ALLOWED_ORIGIN");
        cmd.env_remove("SBD_LOG");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Path of this environment's config.toml (not created by default).
    pub fn config_path(&self) -> PathBuf {
        self.work_dir.path().join("config.toml")
    }

    /// Write config.toml for this environment.
    pub fn write_config(&self, content: &str) {
        std::fs::write(self.config_path(), content).unwrap();
    }

    /// Write a file into the working directory and return its path.
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.work_dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Upload [`SAMPLE_CSV`] without analyzing it.
    pub fn upload_sample(&self) {
        let path = self.write_file("sprint.csv", SAMPLE_CSV);
        self.sbd()
            .args(["upload", "--no-analyze", "--now", NOW])
            .arg(&path)
            .assert()
            .success();
    }

    /// Get the path to the data directory.
    pub fn data_path(&self) -> &Path {
        self.data_dir.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a command's stdout as JSON.
pub fn parse_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}
