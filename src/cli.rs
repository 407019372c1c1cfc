//! The command line interface for the program.
use crate::accumulate::{NetworkCache, RegionCache, accumulate};
use crate::config::Config;
use crate::log;
use crate::output::metadata::write_metadata;
use crate::output::{FIGURES_DIRECTORY, create_output_directory, get_output_dir, write_tables};
use crate::plot::{PlottingConfig, write_figures};
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the program.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Aggregate network results into regional tables and figures.
    Run {
        /// Path to the run configuration file, or the folder containing it.
        config_path: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Manage example runs.
    Example {
        /// The available subcommands for managing example runs.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Check that a run configuration and all of its input files are valid.
    Validate {
        /// Path to the run configuration file, or the folder containing it.
        config_path: PathBuf,
    },
    /// Manage program settings.
    Settings {
        /// The subcommands for managing the settings file
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { config_path, opts } => handle_run_command(&config_path, &opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { config_path } => handle_validate_command(&config_path, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and start the program
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ pathways --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load program settings, if not provided
fn load_settings(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Handle the `run` command.
pub fn handle_run_command(
    config_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(config_path)?;
        &pathbuf
    };

    let overwrite = create_output_directory(output_path, opts.overwrite || settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    log::init(Some(settings.log_level.as_str()), Some(output_path))
        .context("Failed to initialise logging.")?;

    let config = Config::from_path(config_path).context("Failed to load run configuration.")?;
    let plotting = PlottingConfig::from_path(&config.plotting_path())
        .context("Failed to load plotting configuration.")?;
    info!("Loaded run configuration from {}", config_path.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    write_metadata(output_path, config_path, &config).context("Failed to save metadata.")?;

    let pathways = accumulate(&config)?;
    write_tables(output_path, &pathways).context("Failed to write tables.")?;
    write_figures(
        &output_path.join(FIGURES_DIRECTORY),
        &pathways,
        &config,
        &plotting,
    )?;
    info!("Post-processing complete!");

    Ok(())
}

/// Check that every network and region file named by a configuration can be loaded
fn validate_inputs(config: &Config) -> Result<()> {
    let mut networks = NetworkCache::default();
    let mut regions = RegionCache::default();
    for key in config.scenario_years() {
        regions.get_or_load(&config.regions_path(&key.scenario)?, config)?;
        networks.get_or_load(&key, &config.network_path(&key)?)?;
        info!("Inputs for {key} are valid");
    }

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(config_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;

    // Log files are not saved when validating
    log::init(Some(settings.log_level.as_str()), None).context("Failed to initialise logging.")?;

    let config = Config::from_path(config_path).context("Failed to load run configuration.")?;
    PlottingConfig::from_path(&config.plotting_path())
        .context("Failed to load plotting configuration.")?;
    validate_inputs(&config).context("Failed to validate inputs.")?;
    info!("Validation successful!");

    Ok(())
}
