//! Common routines for handling input data.
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub mod network;
pub use network::load_network;
pub mod regions;
pub use regions::read_regions;

/// Get an error message for a problem with the specified input file
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Read a series of type `T`s from a CSV file.
///
/// Unknown columns are ignored, so this can be used with files exported by other tools which
/// carry extra fields.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader =
        csv::Reader::from_path(file_path).with_context(|| input_err_msg(file_path))?;

    let mut vec = Vec::new();
    for result in reader.deserialize() {
        let record: T = result.with_context(|| input_err_msg(file_path))?;
        vec.push(record);
    }

    Ok(vec)
}

/// Read a series of type `T`s from a CSV file, returning an empty `Vec` if the file is missing.
pub fn read_csv_optional<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    if !file_path.exists() {
        return Ok(Vec::new());
    }

    read_csv(file_path)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Parse a YAML file at the specified path
pub fn read_yaml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let yaml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let yaml_data = serde_yaml::from_str(&yaml_str).with_context(|| input_err_msg(file_path))?;
    Ok(yaml_data)
}

/// Parse a JSON file at the specified path
pub fn read_json<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let json_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let json_data = serde_json::from_str(&json_str).with_context(|| input_err_msg(file_path))?;
    Ok(json_data)
}

/// Check whether an iterator contains values that are sorted and unique
pub fn is_sorted_and_unique<T, I>(iter: I) -> bool
where
    T: PartialOrd + Clone,
    I: IntoIterator<Item = T>,
{
    iter.into_iter().tuple_windows().all(|(a, b)| a < b)
}

/// Check that the specified path is an existing directory
pub fn check_dir_exists(dir_path: &Path) -> Result<()> {
    ensure!(
        dir_path.is_dir(),
        "Directory not found: {}",
        dir_path.display()
    );

    Ok(())
}
