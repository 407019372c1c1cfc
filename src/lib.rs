//! Aggregation of energy system model results into regional pathways.
//!
//! Network results for each scenario and planning year are relabelled into reporting categories,
//! attributed to regions and summarised as tables, stacked-area charts and interactive maps.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod accumulate;
pub mod attribution;
pub mod carrier;
pub mod cli;
pub mod config;
pub mod extract;
pub mod id;
pub mod input;
pub mod log;
pub mod network;
pub mod output;
pub mod plot;
pub mod region;
pub mod scenario;
pub mod settings;
pub mod table;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the folder in which the program's configuration files are stored
pub fn get_pathways_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        // No known config dir for this platform, so use the current folder
        return PathBuf::default();
    };
    config_dir.push("pathways");

    config_dir
}
