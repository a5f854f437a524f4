//! Command implementations for the storyboard CLI and server.
//!
//! This module contains the business logic behind each CLI command and HTTP
//! route. Commands are organized by concern:
//! - `analyze` - The analysis job and stored reports
//! - `upload` - Upload and validation of story sheets
//! - `stories` - Listing, lookup and grouping of stories

pub mod analyze;
pub mod stories;
pub mod upload;

pub use analyze::{AnalysisRun, analyze_file, analyze_upload, render_report, report, run_analysis};
pub use stories::{StoryDetail, StoryGroups, StoryList, list_stories, load_stories, show_story, stories_by_epic, stories_by_project};
pub use upload::{UploadOptions, UploadResult, ValidationResult, upload, upload_bytes, validate, validate_bytes};

use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;

use crate::config::{Resolved, ResolvedSettings};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

pub(crate) fn to_json_string<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| json!({ "error": e.to_string() }).to_string())
}

// === Version ===

/// Package version plus build metadata.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub build_timestamp: &'static str,
    pub commit: &'static str,
}

impl Output for VersionInfo {
    fn to_json(&self) -> String {
        to_json_string(self)
    }

    fn to_human(&self) -> String {
        format!(
            "sbd {} (commit {}, built {})",
            self.version, self.commit, self.build_timestamp
        )
    }
}

/// Version information compiled into this binary.
pub fn version() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
        build_timestamp: env!("SBD_BUILD_TIMESTAMP"),
        commit: env!("SBD_GIT_COMMIT"),
    }
}

// === Config ===

/// Resolved settings with their sources, for `sbd config show`.
#[derive(Debug, Clone)]
pub struct ConfigShow {
    /// Config file consulted (it may not exist)
    pub config_path: Option<PathBuf>,
    pub settings: ResolvedSettings,
}

fn entry<T: Serialize>(resolved: &Resolved<T>) -> serde_json::Value {
    json!({ "value": resolved.value, "source": resolved.source.to_string() })
}

impl Output for ConfigShow {
    fn to_json(&self) -> String {
        let s = &self.settings;
        json!({
            "config_path": self.config_path,
            "data_dir": entry(&s.data_dir),
            "output_format": entry(&s.output_format),
            "host": entry(&s.host),
            "port": entry(&s.port),
            "allowed_origin": entry(&s.allowed_origin),
            "max_upload_bytes": entry(&s.max_upload_bytes),
            "schedule_enabled": entry(&s.schedule_enabled),
            "schedule_time": {
                "value": s.schedule_time.value.format("%H:%M").to_string(),
                "source": s.schedule_time.source.to_string(),
            },
        })
        .to_string()
    }

    fn to_human(&self) -> String {
        let s = &self.settings;
        let mut lines = Vec::new();
        match self.config_path {
            Some(ref path) => lines.push(format!("Config file: {}", path.display())),
            None => lines.push("Config file: (none)".to_string()),
        }
        lines.push(String::new());
        let rows = [
            ("data_dir", s.data_dir.value.display().to_string(), s.data_dir.source.to_string()),
            ("output_format", s.output_format.value.to_string(), s.output_format.source.to_string()),
            ("host", s.host.value.clone(), s.host.source.to_string()),
            ("port", s.port.value.to_string(), s.port.source.to_string()),
            ("allowed_origin", s.allowed_origin.value.clone(), s.allowed_origin.source.to_string()),
            ("max_upload_bytes", s.max_upload_bytes.value.to_string(), s.max_upload_bytes.source.to_string()),
            ("schedule_enabled", s.schedule_enabled.value.to_string(), s.schedule_enabled.source.to_string()),
            ("schedule_time", s.schedule_time.value.format("%H:%M").to_string(), s.schedule_time.source.to_string()),
        ];
        for (key, value, source) in rows {
            lines.push(format!("  {:<18} {}  ({})", key, value, source));
        }
        lines.join("\n")
    }
}

/// Build the `config show` result.
pub fn config_show(config_path: Option<PathBuf>, settings: ResolvedSettings) -> ConfigShow {
    ConfigShow {
        config_path,
        settings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigOverrides, StoryboardConfig, resolve_settings_with_env};

    #[test]
    fn test_version_info() {
        let info = version();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        let parsed: serde_json::Value = serde_json::from_str(&info.to_json()).unwrap();
        assert_eq!(parsed["version"], info.version);
        assert!(parsed["commit"].is_string());
        assert!(info.to_human().starts_with("sbd "));
    }

    #[test]
    fn test_config_show_reports_sources() {
        let overrides = ConfigOverrides::new().with_data_dir("/tmp/sbd").with_port(8080);
        let settings =
            resolve_settings_with_env(&StoryboardConfig::new(), &overrides, |_| None).unwrap();
        let show = config_show(None, settings);

        let parsed: serde_json::Value = serde_json::from_str(&show.to_json()).unwrap();
        assert_eq!(parsed["port"]["value"], 8080);
        assert_eq!(parsed["port"]["source"], "cli");
        assert_eq!(parsed["host"]["source"], "default");
        assert_eq!(parsed["schedule_time"]["value"], "06:00");
        assert!(show.to_human().contains("/tmp/sbd"));
    }
}
