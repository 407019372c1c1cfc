//! Code for reading a solved network from a directory of CSV files.
//!
//! The layout follows the CSV export of PyPSA: one file of static attributes per component type
//! and one "wide" file per time-varying attribute, with a `snapshot` column followed by one column
//! per element.
use super::{check_dir_exists, input_err_msg, read_csv, read_csv_optional};
use crate::network::{Bus, Network, TimeSeriesTotals};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use std::path::Path;

const SNAPSHOTS_FILE_NAME: &str = "snapshots.csv";
const BUSES_FILE_NAME: &str = "buses.csv";
const GENERATORS_FILE_NAME: &str = "generators.csv";
const LINKS_FILE_NAME: &str = "links.csv";
const STORES_FILE_NAME: &str = "stores.csv";
const STORAGE_UNITS_FILE_NAME: &str = "storage_units.csv";
const LOADS_FILE_NAME: &str = "loads.csv";

const GENERATORS_P_FILE_NAME: &str = "generators-p.csv";
const LINKS_P0_FILE_NAME: &str = "links-p0.csv";
const LINKS_P1_FILE_NAME: &str = "links-p1.csv";
const LINKS_P2_FILE_NAME: &str = "links-p2.csv";
const STORAGE_UNITS_P_FILE_NAME: &str = "storage_units-p.csv";
const LOADS_P_FILE_NAME: &str = "loads-p.csv";

/// The name of the index column in time series files
const SNAPSHOT_COLUMN: &str = "snapshot";

fn default_objective() -> f64 {
    1.0
}

/// A row of the snapshots file
#[derive(Deserialize)]
struct SnapshotRaw {
    #[serde(default = "default_objective")]
    objective: f64,
}

/// Read the objective weightings of the snapshots
fn read_snapshot_weightings(file_path: &Path) -> Result<Vec<f64>> {
    let snapshots = read_csv::<SnapshotRaw>(file_path)?;
    ensure!(
        !snapshots.is_empty(),
        "{}: network has no snapshots",
        input_err_msg(file_path)
    );

    Ok(snapshots.into_iter().map(|s| s.objective).collect())
}

/// Read buses from the buses file, checking that names are unique
fn read_buses(file_path: &Path) -> Result<IndexMap<String, Bus>> {
    let mut buses = IndexMap::new();
    for bus in read_csv::<Bus>(file_path)? {
        let name = bus.name.clone();
        ensure!(
            buses.insert(name.clone(), bus).is_none(),
            "{}: duplicate bus {name}",
            input_err_msg(file_path)
        );
    }

    Ok(buses)
}

/// Read a wide time series file, summing each element's column over all snapshots.
///
/// Empty cells count as zero. A missing file gives no totals.
pub fn read_time_series_totals(file_path: &Path) -> Result<TimeSeriesTotals> {
    if !file_path.exists() {
        return Ok(TimeSeriesTotals::default());
    }

    let mut reader =
        csv::Reader::from_path(file_path).with_context(|| input_err_msg(file_path))?;
    let headers = reader
        .headers()
        .with_context(|| input_err_msg(file_path))?
        .clone();
    ensure!(
        headers.get(0) == Some(SNAPSHOT_COLUMN),
        "{}: first column must be `{SNAPSHOT_COLUMN}`",
        input_err_msg(file_path)
    );

    let mut totals = vec![0.0; headers.len() - 1];
    for record in reader.records() {
        let record = record.with_context(|| input_err_msg(file_path))?;
        for (total, cell) in totals.iter_mut().zip(record.iter().skip(1)) {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }

            *total += cell.parse::<f64>().with_context(|| {
                format!("{}: invalid value {cell}", input_err_msg(file_path))
            })?;
        }
    }

    Ok(headers
        .iter()
        .skip(1)
        .map(String::from)
        .zip(totals)
        .collect())
}

/// Load a solved network from the specified directory.
///
/// The snapshots and buses files are required. Files for other components are optional, as
/// exports omit components which are absent from the network.
///
/// # Arguments
///
/// * `network_dir` - Folder containing the exported network
///
/// # Returns
///
/// The loaded [`Network`] or an error.
pub fn load_network(network_dir: &Path) -> Result<Network> {
    check_dir_exists(network_dir)?;
    debug!("Loading network from {}", network_dir.display());

    let network = Network {
        snapshot_weightings: read_snapshot_weightings(&network_dir.join(SNAPSHOTS_FILE_NAME))?,
        buses: read_buses(&network_dir.join(BUSES_FILE_NAME))?,
        generators: read_csv_optional(&network_dir.join(GENERATORS_FILE_NAME))?,
        links: read_csv_optional(&network_dir.join(LINKS_FILE_NAME))?,
        stores: read_csv_optional(&network_dir.join(STORES_FILE_NAME))?,
        storage_units: read_csv_optional(&network_dir.join(STORAGE_UNITS_FILE_NAME))?,
        loads: read_csv_optional(&network_dir.join(LOADS_FILE_NAME))?,
        generators_p: read_time_series_totals(&network_dir.join(GENERATORS_P_FILE_NAME))?,
        links_p0: read_time_series_totals(&network_dir.join(LINKS_P0_FILE_NAME))?,
        links_p1: read_time_series_totals(&network_dir.join(LINKS_P1_FILE_NAME))?,
        links_p2: read_time_series_totals(&network_dir.join(LINKS_P2_FILE_NAME))?,
        storage_units_p: read_time_series_totals(&network_dir.join(STORAGE_UNITS_P_FILE_NAME))?,
        loads_p: read_time_series_totals(&network_dir.join(LOADS_P_FILE_NAME))?,
    };

    debug!(
        "Network has {} buses, {} generators, {} links, {} stores and {} loads",
        network.buses.len(),
        network.generators.len(),
        network.links.len(),
        network.stores.len(),
        network.loads.len()
    );

    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir_path: &Path, file_name: &str, contents: &str) {
        let mut file = File::create(dir_path.join(file_name)).unwrap();
        writeln!(file, "{contents}").unwrap();
    }

    /// Create a minimal network in `dir_path`
    fn create_network_files(dir_path: &Path) {
        write_file(
            dir_path,
            SNAPSHOTS_FILE_NAME,
            "snapshot,objective,generators
2030-01-01 00:00:00,3.0,3.0
2030-01-01 03:00:00,3.0,3.0",
        );
        write_file(
            dir_path,
            BUSES_FILE_NAME,
            "name,v_nom,carrier,country
GB north 0,400,AC,GB
GB north 0 low voltage,,low voltage,GB
GB north 0 urban central heat,,urban central heat,GB",
        );
        write_file(
            dir_path,
            LINKS_FILE_NAME,
            "name,bus0,bus1,bus2,carrier,p_nom_opt,efficiency
GB north 0 CHP,GB north 0,GB north 0,GB north 0 urban central heat,urban central gas CHP,100,0.4
GB north 0 electricity distribution grid,GB north 0,GB north 0 low voltage,,electricity distribution grid,500,1.0",
        );
        write_file(
            dir_path,
            LINKS_P0_FILE_NAME,
            "snapshot,GB north 0 CHP,GB north 0 electricity distribution grid
2030-01-01 00:00:00,10,
2030-01-01 03:00:00,5.5,2",
        );
    }

    #[test]
    fn test_load_network() {
        let dir = tempdir().unwrap();
        create_network_files(dir.path());
        let network = load_network(dir.path()).unwrap();

        assert_eq!(network.snapshot_weightings, [3.0, 3.0]);
        assert_eq!(network.buses.len(), 3);
        assert_eq!(network.buses["GB north 0"].country, "GB");
        assert!(network.generators.is_empty());

        let chp = &network.links[0];
        assert_eq!(chp.bus2.as_deref(), Some("GB north 0 urban central heat"));
        assert_approx_eq!(f64, chp.efficiency, 0.4);
        let grid = &network.links[1];
        assert_eq!(grid.bus2, None);

        assert_approx_eq!(f64, network.links_p0.get("GB north 0 CHP"), 15.5);
        assert_approx_eq!(
            f64,
            network.links_p0.get("GB north 0 electricity distribution grid"),
            2.0
        );
        assert!(network.links_p1.is_empty());
    }

    #[test]
    fn test_load_network_missing_dir() {
        let dir = tempdir().unwrap();
        assert!(load_network(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_load_network_missing_buses() {
        let dir = tempdir().unwrap();
        create_network_files(dir.path());
        std::fs::remove_file(dir.path().join(BUSES_FILE_NAME)).unwrap();
        assert!(load_network(dir.path()).is_err());
    }

    #[test]
    fn test_read_buses_duplicate() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), BUSES_FILE_NAME, "name,carrier\nGB 0,AC\nGB 0,AC");
        assert!(read_buses(&dir.path().join(BUSES_FILE_NAME)).is_err());
    }

    #[test]
    fn test_read_time_series_totals_bad_header() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), LOADS_P_FILE_NAME, "time,load\n0,1");
        assert!(read_time_series_totals(&dir.path().join(LOADS_P_FILE_NAME)).is_err());
    }

    #[test]
    fn test_read_time_series_totals_bad_value() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), LOADS_P_FILE_NAME, "snapshot,load\n0,abc");
        assert!(read_time_series_totals(&dir.path().join(LOADS_P_FILE_NAME)).is_err());
    }
}
