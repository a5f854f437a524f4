//! Unified precedence resolution for settings.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`SBD_DATA_DIR`, `SBD_HOST`, `SBD_PORT`,
//!    `SBD_ALLOWED_ORIGIN`)
//! 3. config.toml
//! 4. Built-in defaults

use chrono::NaiveTime;
use std::path::PathBuf;

use crate::config::schema::{OutputFormat, StoryboardConfig, parse_schedule_time};
use crate::storage::default_data_dir;
use crate::{Error, Result};

pub const DATA_DIR_ENV: &str = "SBD_DATA_DIR";
pub const HOST_ENV: &str = "SBD_HOST";
pub const PORT_ENV: &str = "SBD_PORT";
pub const ALLOWED_ORIGIN_ENV: &str = "SBD_ALLOWED_ORIGIN";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_SCHEDULE_TIME: &str = "06:00";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.toml
    ConfigFile,
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile => write!(f, "config"),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved settings with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub data_dir: Resolved<PathBuf>,
    pub output_format: Resolved<OutputFormat>,
    pub host: Resolved<String>,
    pub port: Resolved<u16>,
    pub allowed_origin: Resolved<String>,
    pub max_upload_bytes: Resolved<usize>,
    pub schedule_enabled: Resolved<bool>,
    /// Local time of day for the scheduled analysis
    pub schedule_time: Resolved<NaiveTime>,
}

/// CLI overrides for settings resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub output_format: Option<OutputFormat>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub schedule_enabled: Option<bool>,
}

impl ConfigOverrides {
    /// Create empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_schedule_enabled(mut self, enabled: bool) -> Self {
        self.schedule_enabled = Some(enabled);
        self
    }
}

/// Resolve settings from the process environment.
pub fn resolve_settings(
    config: &StoryboardConfig,
    overrides: &ConfigOverrides,
) -> Result<ResolvedSettings> {
    resolve_settings_with_env(config, overrides, |name| {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    })
}

/// Resolve settings with an explicit environment lookup.
pub fn resolve_settings_with_env<F>(
    config: &StoryboardConfig,
    overrides: &ConfigOverrides,
    env: F,
) -> Result<ResolvedSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let data_dir = if let Some(ref dir) = overrides.data_dir {
        Resolved::new(dir.clone(), ValueSource::CliFlag)
    } else if let Some(dir) = env(DATA_DIR_ENV) {
        Resolved::new(PathBuf::from(dir), env_source(DATA_DIR_ENV))
    } else if let Some(ref dir) = config.data_dir {
        Resolved::new(dir.clone(), ValueSource::ConfigFile)
    } else {
        Resolved::new(default_data_dir()?, ValueSource::Default)
    };

    let output_format = if let Some(format) = overrides.output_format {
        Resolved::new(format, ValueSource::CliFlag)
    } else if let Some(format) = config.output_format {
        Resolved::new(format, ValueSource::ConfigFile)
    } else {
        Resolved::new(OutputFormat::default(), ValueSource::Default)
    };

    let host = if let Some(ref host) = overrides.host {
        Resolved::new(host.clone(), ValueSource::CliFlag)
    } else if let Some(host) = env(HOST_ENV) {
        Resolved::new(host, env_source(HOST_ENV))
    } else if let Some(ref host) = config.server.host {
        Resolved::new(host.clone(), ValueSource::ConfigFile)
    } else {
        Resolved::new(DEFAULT_HOST.to_string(), ValueSource::Default)
    };

    let port = if let Some(port) = overrides.port {
        Resolved::new(port, ValueSource::CliFlag)
    } else if let Some(raw) = env(PORT_ENV) {
        let port = raw
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| Error::Config(format!("{} must be a port number, got {:?}", PORT_ENV, raw)))?;
        Resolved::new(port, env_source(PORT_ENV))
    } else if let Some(port) = config.server.port {
        Resolved::new(port, ValueSource::ConfigFile)
    } else {
        Resolved::new(DEFAULT_PORT, ValueSource::Default)
    };

    let allowed_origin = if let Some(origin) = env(ALLOWED_ORIGIN_ENV) {
        Resolved::new(origin, env_source(ALLOWED_ORIGIN_ENV))
    } else if let Some(ref origin) = config.server.allowed_origin {
        Resolved::new(origin.clone(), ValueSource::ConfigFile)
    } else {
        Resolved::new(DEFAULT_ALLOWED_ORIGIN.to_string(), ValueSource::Default)
    };

    let max_upload_bytes = match config.server.max_upload_bytes {
        Some(limit) => Resolved::new(limit, ValueSource::ConfigFile),
        None => Resolved::new(DEFAULT_MAX_UPLOAD_BYTES, ValueSource::Default),
    };

    let schedule_enabled = if let Some(enabled) = overrides.schedule_enabled {
        Resolved::new(enabled, ValueSource::CliFlag)
    } else if let Some(enabled) = config.schedule.enabled {
        Resolved::new(enabled, ValueSource::ConfigFile)
    } else {
        Resolved::new(true, ValueSource::Default)
    };

    let schedule_time = match config.schedule.time {
        Some(ref time) => Resolved::new(
            parse_schedule_time(time).map_err(Error::Config)?,
            ValueSource::ConfigFile,
        ),
        None => Resolved::new(
            parse_schedule_time(DEFAULT_SCHEDULE_TIME).map_err(Error::Config)?,
            ValueSource::Default,
        ),
    };

    Ok(ResolvedSettings {
        data_dir,
        output_format,
        host,
        port,
        allowed_origin,
        max_upload_bytes,
        schedule_enabled,
        schedule_time,
    })
}

fn env_source(name: &str) -> ValueSource {
    ValueSource::EnvVar(name.to_string())
}
