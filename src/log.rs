//! The `log` module provides initialisation and configuration of the program's logging system.
//!
//! Messages below warning level go to stdout and warnings and errors to stderr, colourised when
//! writing to a terminal. When an output folder is given, messages are also written to log files
//! there.
use anyhow::{Context, Result, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

/// A flag indicating whether the logger has been initialised
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// The environment variable which overrides the log level
pub const LOG_LEVEL_ENV_VAR: &str = "PATHWAYS_LOG_LEVEL";

/// The default log level for the program.
///
/// Used as a fallback if the user hasn't specified something else with the `PATHWAYS_LOG_LEVEL`
/// environment variable or the settings.toml file.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// The file name for the log file containing messages about the ordinary operation of the program
const LOG_INFO_FILE_NAME: &str = "pathways_info.log";

/// The file name for the log file containing warnings and error messages
const LOG_ERROR_FILE_NAME: &str = "pathways_error.log";

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Convert a log level name into a [`LevelFilter`]
fn parse_log_level(log_level: &str) -> Result<LevelFilter> {
    Ok(match log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    })
}

/// Open a log file for writing, truncating any existing file
fn new_log_file(dir: &Path, file_name: &str) -> Result<File> {
    let file_path = dir.join(file_name);
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&file_path)
        .with_context(|| format!("Could not create log file {}", file_path.display()))
}

/// Initialise the program logger using the `fern` logging library with colourised output.
///
/// The user can specify their preferred logging level via the `settings.toml` file (defaulting to
/// `info` if not present) or with the `PATHWAYS_LOG_LEVEL` environment variable. If both are
/// provided, the environment variable takes precedence.
///
/// Possible log level options are `off`, `error`, `warn`, `info`, `debug` and `trace`.
///
/// The logger can only be initialised once per process. Later calls do nothing.
///
/// # Arguments
///
/// * `log_level_from_settings`: The log level specified in `settings.toml`
/// * `log_file_path`: The location to save log files (if Some, log files will be created)
pub fn init(log_level_from_settings: Option<&str>, log_file_path: Option<&Path>) -> Result<()> {
    if is_logger_initialised() {
        return Ok(());
    }

    let log_level = env::var(LOG_LEVEL_ENV_VAR).unwrap_or_else(|_| {
        log_level_from_settings
            .unwrap_or(DEFAULT_LOG_LEVEL)
            .to_string()
    });
    let log_level = parse_log_level(&log_level)?;

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    // Only colourise output to a terminal
    let use_colour_stdout = std::io::stdout().is_terminal();
    let use_colour_stderr = std::io::stderr().is_terminal();

    let mut dispatch = Dispatch::new()
        .chain(
            // Non-error messages to stdout
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(move |out, message, record| {
                    write_log_colour(out, message, record, use_colour_stdout, &colours);
                })
                .level(log_level)
                .chain(std::io::stdout()),
        )
        .chain(
            // Warnings and errors to stderr
            Dispatch::new()
                .format(move |out, message, record| {
                    write_log_colour(out, message, record, use_colour_stderr, &colours);
                })
                .level(log_level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
        );

    if let Some(log_file_path) = log_file_path {
        dispatch = dispatch
            .chain(
                Dispatch::new()
                    .filter(|metadata| metadata.level() > LevelFilter::Warn)
                    .format(write_log_plain)
                    .level(log_level.max(LevelFilter::Info))
                    .chain(new_log_file(log_file_path, LOG_INFO_FILE_NAME)?),
            )
            .chain(
                Dispatch::new()
                    .format(write_log_plain)
                    .level(LevelFilter::Warn)
                    .chain(new_log_file(log_file_path, LOG_ERROR_FILE_NAME)?),
            );
    }

    dispatch.apply().context("Logger already initialised")?;
    LOGGER_INIT.get_or_init(|| ());

    Ok(())
}

/// Write a message to the log in the program's format
fn write_log<T: Display>(out: FormatCallback, level: T, target: &str, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");

    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}

/// Write to the log with no colours
fn write_log_plain(out: FormatCallback, message: &Arguments, record: &Record) {
    write_log(out, record.level(), record.target(), message);
}

/// Write to the log with optional colours
fn write_log_colour(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    use_colour: bool,
    colours: &ColoredLevelConfig,
) {
    if use_colour {
        write_log(out, colours.color(record.level()), record.target(), message);
    } else {
        write_log_plain(out, message, record);
    }
}
