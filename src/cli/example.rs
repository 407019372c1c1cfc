//! Code related to the example runs and the CLI commands for interacting with them.
use super::{RunOpts, handle_run_command};
use crate::settings::Settings;
use anyhow::{Context, Result, ensure};
use clap::Subcommand;
use include_dir::{Dir, DirEntry, include_dir};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The directory containing the example runs.
const EXAMPLES_DIR: Dir = include_dir!("demos");

/// The available subcommands for managing example runs.
#[derive(Subcommand)]
pub enum ExampleSubcommands {
    /// List available examples.
    List,
    /// Provide information about the specified example.
    Info {
        /// The name of the example.
        name: String,
    },
    /// Extract an example run configuration and its inputs to a new directory.
    Extract {
        /// The name of the example to extract.
        name: String,
        /// The destination folder for the example.
        new_path: Option<PathBuf>,
    },
    /// Run an example.
    Run {
        /// The name of the example to run.
        name: String,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
}

impl ExampleSubcommands {
    /// Execute the supplied example subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::List => handle_example_list_command(),
            Self::Info { name } => handle_example_info_command(&name)?,
            Self::Extract {
                name,
                new_path: dest,
            } => handle_example_extract_command(&name, dest.as_deref())?,
            Self::Run { name, opts } => handle_example_run_command(&name, &opts, None)?,
        }

        Ok(())
    }
}

/// Handle the `example list` command.
fn handle_example_list_command() {
    for entry in EXAMPLES_DIR.dirs() {
        println!("{}", entry.path().display());
    }
}

/// Get the README for an example
fn example_readme(name: &str) -> Result<&'static str> {
    let path: PathBuf = [name, "README.txt"].iter().collect();
    EXAMPLES_DIR
        .get_file(path)
        .context("Example not found.")?
        .contents_utf8()
        .context("README.txt is not UTF-8 encoded")
}

/// Handle the `example info` command.
fn handle_example_info_command(name: &str) -> Result<()> {
    println!("{}", example_readme(name)?);

    Ok(())
}

/// Handle the `example extract` command
fn handle_example_extract_command(name: &str, dest: Option<&Path>) -> Result<()> {
    let dest = dest.unwrap_or(Path::new(name));
    extract_example(name, dest)
}

/// Copy the contents of `dir` into `dest`, including subfolders
fn extract_dir(dir: &Dir, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;
    for entry in dir.entries() {
        let file_name = entry
            .path()
            .file_name()
            .context("Example entry has no file name")?;
        let entry_path = dest.join(file_name);
        match entry {
            DirEntry::Dir(sub_dir) => extract_dir(sub_dir, &entry_path)?,
            DirEntry::File(f) => fs::write(&entry_path, f.contents())?,
        }
    }

    Ok(())
}

/// Extract the specified example to a new directory
pub fn extract_example(name: &str, new_path: &Path) -> Result<()> {
    let sub_dir = EXAMPLES_DIR.get_dir(name).context("Example not found.")?;

    ensure!(
        !new_path.exists(),
        "Destination directory {} already exists",
        new_path.display()
    );

    extract_dir(sub_dir, new_path)
}

/// Handle the `example run` command.
pub fn handle_example_run_command(
    name: &str,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let temp_dir = TempDir::new().context("Failed to create temporary directory.")?;
    let config_dir = temp_dir.path().join(name);
    extract_example(name, &config_dir)?;
    handle_run_command(&config_dir, opts, settings)
}
