//! Configuration for storyboard.
//!
//! ## config.toml - User preferences
//!
//! Located at `~/.config/storyboard/config.toml` by default; `--config` or
//! `SBD_CONFIG` point elsewhere. A missing file means "all defaults".
//!
//! Contains:
//! - `data_dir` - Where uploads and analysis results are kept
//! - `output_format` - "json" or "human"
//! - `[server]` - host, port, CORS origin, upload size limit
//! - `[schedule]` - daily analysis time
//!
//! ## Precedence
//!
//! CLI flag > environment variable > config.toml > defaults
//!
//! Use the [`resolver`] module for unified precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    ConfigOverrides, Resolved, ResolvedSettings, ValueSource, resolve_settings,
    resolve_settings_with_env,
};
pub use schema::{OutputFormat, ScheduleConfig, ServerConfig, StoryboardConfig, default_config_path};
