//! TOML schema for config.toml.
//!
//! ```toml
//! data_dir = "/srv/storyboard"
//! output_format = "human"   # or "json"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 3001
//! allowed_origin = "http://localhost:5173"
//! max_upload_bytes = 10485760
//!
//! [schedule]
//! enabled = true
//! time = "06:00"            # local time, daily
//! ```
//!
//! Every key is optional; unset keys fall through to environment variables
//! and built-in defaults during resolution.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Origin allowed by CORS (the dashboard's URL)
    pub allowed_origin: Option<String>,
    pub max_upload_bytes: Option<usize>,
}

/// Daily analysis schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    pub enabled: Option<bool>,
    /// Local time of day as "HH:MM"
    pub time: Option<String>,
}

/// User configuration stored in config.toml.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoryboardConfig {
    /// Directory holding uploads and analysis results
    pub data_dir: Option<PathBuf>,

    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl StoryboardConfig {
    /// Create an empty config with no values set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse config from TOML text and validate it.
    pub fn from_toml(text: &str) -> Result<Self> {
        Self::parse(text).map_err(Error::Config)
    }

    /// Load config from a file. A missing file yields an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let text = fs::read_to_string(path)?;
        Self::parse(&text).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    fn parse(text: &str) -> std::result::Result<Self, String> {
        let config: Self = toml::from_str(text).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.server.port == Some(0) {
            return Err("server.port must be between 1 and 65535".to_string());
        }
        if self.server.max_upload_bytes == Some(0) {
            return Err("server.max_upload_bytes must be greater than 0".to_string());
        }
        if let Some(ref time) = self.schedule.time {
            parse_schedule_time(time)?;
        }
        Ok(())
    }
}

/// Parse a schedule time of day, "HH:MM" in 24-hour form.
pub fn parse_schedule_time(s: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| format!("schedule time must be HH:MM, got {:?}", s))
}

/// Default config file location, `<config_dir>/storyboard/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("storyboard").join("config.toml"))
}
