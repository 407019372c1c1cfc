//! The module responsible for writing output data to disk.
use crate::accumulate::{Indicator, Pathways, YearResults};
use crate::region::RegionID;
use crate::scenario::{ScenarioID, ScenarioYear};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

pub mod metadata;

/// The root folder in which run-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "pathways_results";

/// The subfolder for regional tables
pub const TABLES_DIRECTORY: &str = "tables";

/// The subfolder for figures
pub const FIGURES_DIRECTORY: &str = "figures";

/// Get the output folder for the run configuration at the specified path.
///
/// The folder is named after the folder containing the configuration file.
pub fn get_output_dir(config_path: &Path) -> Result<PathBuf> {
    let config_path = config_path
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to run configuration")?;
    let config_dir = if config_path.is_file() {
        config_path
            .parent()
            .context("Run configuration cannot be in root folder")?
    } else {
        &config_path
    };

    let run_name = config_dir
        .file_name()
        .context("Run configuration cannot be in root folder")?
        .to_str()
        .context("Invalid chars in run configuration dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, run_name].iter().collect())
}

/// Create a new output directory, with subfolders for tables and figures.
///
/// An existing non-empty folder is only replaced when `allow_overwrite` is set.
///
/// # Returns
///
/// Whether an existing folder was overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let mut overwrite = false;
    if output_dir.is_dir() {
        let is_empty = fs::read_dir(output_dir)?.next().is_none();
        if !is_empty {
            ensure!(
                allow_overwrite,
                "Output folder already exists and is not empty. \
                Please re-run with the --overwrite flag or choose another folder."
            );
            fs::remove_dir_all(output_dir)?;
            overwrite = true;
        }
    }

    fs::create_dir_all(output_dir.join(TABLES_DIRECTORY))?;
    fs::create_dir_all(output_dir.join(FIGURES_DIRECTORY))?;

    Ok(overwrite)
}

/// Represents a row in a regional table CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct TableRow {
    scenario: ScenarioID,
    year: u32,
    region: RegionID,
    category: String,
    value: f64,
}

/// An object for writing regional tables to file, one file per indicator
pub struct DataWriter {
    writers: IndexMap<Indicator, csv::Writer<File>>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where the tables subfolder is located
    pub fn create(output_path: &Path) -> Result<Self> {
        let tables_path = output_path.join(TABLES_DIRECTORY);
        let writers = Indicator::iter()
            .map(|indicator| {
                let file_path = tables_path.join(format!("{indicator}.csv"));
                let writer = csv::Writer::from_path(&file_path)
                    .with_context(|| format!("Could not create {}", file_path.display()))?;
                Ok((indicator, writer))
            })
            .collect::<Result<_>>()?;

        Ok(Self { writers })
    }

    /// Write every table for one scenario and year
    pub fn write_results(&mut self, key: &ScenarioYear, results: &YearResults) -> Result<()> {
        for (indicator, table) in &results.tables {
            let Some(writer) = self.writers.get_mut(indicator) else {
                continue;
            };

            for (category, column) in table.columns() {
                for (region, value) in column {
                    writer.serialize(TableRow {
                        scenario: key.scenario.clone(),
                        year: key.year,
                        region: region.clone(),
                        category: category.to_string(),
                        value: *value,
                    })?;
                }
            }
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }

        Ok(())
    }
}

/// Write all accumulated tables to the tables subfolder of `output_path`
pub fn write_tables(output_path: &Path, pathways: &Pathways) -> Result<()> {
    let mut writer = DataWriter::create(output_path)?;
    for (key, results) in &pathways.results {
        writer.write_results(key, results)?;
    }
    writer.flush()
}
