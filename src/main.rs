//! Storyboard CLI - An operational view over a spreadsheet of stories.

use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use std::process;

use storyboard::Error;
use storyboard::cli::{Cli, Commands, ConfigCommands, StoriesCommands};
use storyboard::commands::{self, Output, UploadOptions};
use storyboard::config::{
    ConfigOverrides, OutputFormat, ResolvedSettings, StoryboardConfig, default_config_path,
    resolve_settings,
};
use storyboard::logging;
use storyboard::storage::Storage;

fn main() {
    let cli = Cli::parse();

    let config_path = cli.config_path.clone().or_else(default_config_path);
    let settings = match load_settings(&cli, config_path.as_ref()) {
        Ok(settings) => settings,
        Err(e) => exit_with_error(&e, cli.human_readable),
    };
    let human = settings.output_format.value == OutputFormat::Human;

    #[cfg(feature = "server")]
    let is_serve = matches!(cli.command, Commands::Serve { .. });
    #[cfg(not(feature = "server"))]
    let is_serve = false;
    if !is_serve {
        logging::init_cli();
    }

    if let Err(e) = run_command(cli.command, config_path, settings, human) {
        exit_with_error(&e, human);
    }
}

fn exit_with_error(e: &Error, human: bool) -> ! {
    if human {
        eprintln!("Error: {}", e);
    } else {
        let mut body = serde_json::json!({ "error": e.to_string() });
        if let Error::Validation(errors) = e {
            body["errors"] = serde_json::json!(errors);
        }
        eprintln!("{}", body);
    }
    process::exit(1);
}

/// Resolve settings: CLI flag > env var > config.toml > default.
fn load_settings(cli: &Cli, config_path: Option<&PathBuf>) -> Result<ResolvedSettings, Error> {
    let config = match config_path {
        Some(path) => StoryboardConfig::load(path)?,
        None => StoryboardConfig::new(),
    };

    let mut overrides = ConfigOverrides::new();
    if let Some(ref dir) = cli.data_dir {
        overrides = overrides.with_data_dir(dir);
    }
    if cli.human_readable {
        overrides = overrides.with_output_format(OutputFormat::Human);
    }
    #[cfg(feature = "server")]
    if let Commands::Serve {
        ref host,
        port,
        no_schedule,
    } = cli.command
    {
        if let Some(host) = host {
            overrides = overrides.with_host(host);
        }
        if let Some(port) = port {
            overrides = overrides.with_port(port);
        }
        if no_schedule {
            overrides = overrides.with_schedule_enabled(false);
        }
    }

    resolve_settings(&config, &overrides)
}

fn run_command(
    command: Commands,
    config_path: Option<PathBuf>,
    settings: ResolvedSettings,
    human: bool,
) -> Result<(), Error> {
    match command {
        Commands::Analyze { file, now, no_save } => {
            let now = parse_now(now)?;
            let result = match file {
                Some(path) => commands::analyze_file(&path, now)?,
                None => {
                    let storage = Storage::open(&settings.data_dir.value)?;
                    if no_save {
                        commands::analyze_upload(&storage, now)?
                    } else {
                        commands::run_analysis(&storage, now)?
                    }
                }
            };
            output(&result, human);
        }
        Commands::Upload {
            path,
            no_analyze,
            now,
        } => {
            let now = parse_now(now)?;
            let mut storage = Storage::open(&settings.data_dir.value)?;
            let options = UploadOptions {
                max_bytes: settings.max_upload_bytes.value,
                analyze: !no_analyze,
            };
            let result = commands::upload(&mut storage, &path, options, now)?;
            output(&result, human);
        }
        Commands::Validate { path } => {
            let result = commands::validate(&path)?;
            output(&result, human);
        }
        Commands::Report => {
            let storage = Storage::open(&settings.data_dir.value)?;
            let result = commands::report(&storage)?;
            output(&result, human);
        }
        Commands::Stories { command } => {
            let storage = Storage::open(&settings.data_dir.value)?;
            match command {
                StoriesCommands::List { file } => {
                    let result = commands::list_stories(&storage, file.as_deref())?;
                    output(&result, human);
                }
                StoriesCommands::Show { id, file } => {
                    let result = commands::show_story(&storage, file.as_deref(), &id)?;
                    output(&result, human);
                }
                StoriesCommands::ByProject { file } => {
                    let result = commands::stories_by_project(&storage, file.as_deref())?;
                    output(&result, human);
                }
                StoriesCommands::ByEpic { file } => {
                    let result = commands::stories_by_epic(&storage, file.as_deref())?;
                    output(&result, human);
                }
            }
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let result = commands::config_show(config_path, settings);
                output(&result, human);
            }
        },
        Commands::Version => {
            output(&commands::version(), human);
        }
        #[cfg(feature = "server")]
        Commands::Serve { .. } => {
            run_serve(settings)?;
        }
    }

    Ok(())
}

fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

/// Parse a `--now` override, defaulting to the current time.
fn parse_now(raw: Option<String>) -> Result<DateTime<Utc>, Error> {
    match raw {
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Error::InvalidInput(format!("Invalid --now value {:?}: {}", raw, e))),
        None => Ok(Utc::now()),
    }
}

/// Run the HTTP server until interrupted.
#[cfg(feature = "server")]
fn run_serve(settings: ResolvedSettings) -> Result<(), Error> {
    use storyboard::server::{self, ServerOptions};

    let storage = Storage::open(&settings.data_dir.value)?;
    let _log_guard = logging::init_server(&storage.logs_dir())?;

    let options = ServerOptions::from_settings(&settings);
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Other(format!("Failed to create runtime: {}", e)))?
        .block_on(server::start_server(storage, options))
}
