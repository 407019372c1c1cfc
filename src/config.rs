//! Defines the `Config` struct, which represents the contents of `pathways.toml`.
use crate::input::{input_err_msg, is_sorted_and_unique, read_toml};
use crate::region::RegionLayout;
use crate::scenario::{ScenarioID, ScenarioYear};
use crate::units::Unit;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// The default name of the run configuration file
pub const CONFIG_FILE_NAME: &str = "pathways.toml";

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

macro_rules! define_list_default {
    ($name:ident, [$($value: expr),* $(,)?]) => {
        fn $name() -> Vec<String> {
            vec![$($value.to_string()),*]
        }
    };
}

define_param_default!(default_time_resolution, String, "3h".to_string());
define_param_default!(default_mapping, bool, true);
define_param_default!(default_subfolder, String, "pypsa-uk".to_string());
define_param_default!(default_network_dir, PathBuf, PathBuf::from("networks"));
define_param_default!(default_plotting_file, PathBuf, PathBuf::from("plotting.yaml"));
define_param_default!(default_country, String, "GB".to_string());
define_param_default!(default_country_label, String, "UK".to_string());
define_param_default!(default_model_label, String, "PyPSA-UK".to_string());

define_list_default!(
    default_renewables,
    ["onshore wind", "PV rooftop", "offshore wind", "PV utility"]
);
define_list_default!(
    default_generators,
    ["nuclear", "OCGT", "CCGT", "allam methanol", "CHP"]
);
define_list_default!(
    default_storage,
    [
        "battery",
        "H2",
        "methanol",
        "ammonia",
        "TES central",
        "TES decentral",
        "co2 sequestered",
    ]
);
define_list_default!(default_transmission, ["H2 pipeline"]);
define_list_default!(
    default_heating,
    [
        "heat pump",
        "gas boiler",
        "biomass boiler",
        "resistive heater",
        "TES central",
        "TES decentral",
    ]
);
define_list_default!(
    default_links,
    [
        "Fischer-Tropsch",
        "SMR",
        "SMR CC",
        "Sabatier",
        "ammonia cracker",
        "methanolisation",
        "Methanol steam reforming",
        "H2 Electrolysis",
    ]
);

/// The technology categories reported for each capacity indicator
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Technologies {
    /// Variable renewable generation
    #[serde(default = "default_renewables")]
    pub renewables: Vec<String>,
    /// Dispatchable electricity generation
    #[serde(default = "default_generators")]
    pub generators: Vec<String>,
    /// Energy storage
    #[serde(default = "default_storage")]
    pub storage: Vec<String>,
    /// Transmission other than the electricity grid
    #[serde(default = "default_transmission")]
    pub transmission: Vec<String>,
    /// Heat supply
    #[serde(default = "default_heating")]
    pub heating: Vec<String>,
    /// Conversion between energy carriers
    #[serde(default = "default_links")]
    pub links: Vec<String>,
}

impl Default for Technologies {
    fn default() -> Self {
        Self {
            renewables: default_renewables(),
            generators: default_generators(),
            storage: default_storage(),
            transmission: default_transmission(),
            heating: default_heating(),
            links: default_links(),
        }
    }
}

/// The run configuration
#[derive(Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Scenarios to process
    pub scenarios: Vec<ScenarioID>,
    /// Planning years to process
    pub years: Vec<u32>,
    /// Number of network clusters for each scenario
    pub clusters: IndexMap<String, u32>,
    /// Temporal resolution of the networks (e.g. `3h`)
    #[serde(default = "default_time_resolution")]
    pub time_resolution: String,
    /// Whether networks have been mapped onto administrative regions
    #[serde(default = "default_mapping")]
    pub mapping: bool,
    /// Subfolder of unmapped networks
    #[serde(default = "default_subfolder")]
    pub subfolder: String,
    /// Folder containing the networks and region polygons
    #[serde(default = "default_network_dir")]
    pub network_dir: PathBuf,
    /// Path to the plotting configuration with technology colours
    #[serde(default = "default_plotting_file")]
    pub plotting_file: PathBuf,
    /// Country code used to select in-country buses
    #[serde(default = "default_country")]
    pub country: String,
    /// Name of the country as shown on figures
    #[serde(default = "default_country_label")]
    pub country_label: String,
    /// Name of the model as shown on figures
    #[serde(default = "default_model_label")]
    pub model_label: String,
    /// Access token for Mapbox base maps. A token-free base map is used if absent.
    #[serde(default)]
    pub mapbox_token: Option<String>,
    /// The unit of power capacities (`MW` or `GW`)
    #[serde(default)]
    pub unit: Unit,
    /// Technology categories for each indicator
    #[serde(default)]
    pub technologies: Technologies,
    /// The folder against which relative paths are resolved
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Check that the `years` parameter is valid
fn check_years(years: &[u32]) -> Result<()> {
    ensure!(!years.is_empty(), "`years` is empty");

    ensure!(
        is_sorted_and_unique(years),
        "`years` must be composed of unique values in order"
    );

    Ok(())
}

/// Check that scenarios are given and all have a cluster count
fn check_scenarios(scenarios: &[ScenarioID], clusters: &IndexMap<String, u32>) -> Result<()> {
    ensure!(!scenarios.is_empty(), "`scenarios` is empty");

    let mut seen = HashSet::new();
    for scenario in scenarios {
        ensure!(seen.insert(scenario), "Duplicate scenario {scenario}");
        ensure!(
            clusters.contains_key(scenario.as_str()),
            "No cluster count given for scenario {scenario}"
        );
    }

    Ok(())
}

/// Check that the unit is a unit of power
fn check_unit(unit: Unit) -> Result<()> {
    ensure!(
        matches!(unit, Unit::MW | Unit::GW),
        "`unit` must be MW or GW (got {unit})"
    );

    Ok(())
}

impl Config {
    /// Read a run configuration from the specified file.
    ///
    /// Relative paths in the file are resolved against the folder containing it.
    ///
    /// # Arguments
    ///
    /// * `file_path` - Path to `pathways.toml`, or to a folder containing it
    ///
    /// # Returns
    ///
    /// The file contents as a [`Config`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(file_path: P) -> Result<Config> {
        let file_path = file_path.as_ref();
        let file_path = if file_path.is_dir() {
            file_path.join(CONFIG_FILE_NAME)
        } else {
            file_path.to_path_buf()
        };

        let mut config: Config = read_toml(&file_path)?;
        config
            .validate()
            .with_context(|| input_err_msg(&file_path))?;
        config.base_dir = file_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(config)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        check_years(&self.years)?;
        check_scenarios(&self.scenarios, &self.clusters)?;
        check_unit(self.unit)?;
        ensure!(!self.country.is_empty(), "`country` is empty");

        Ok(())
    }

    /// How region names relate to bus names for the configured networks
    pub fn layout(&self) -> RegionLayout {
        if self.mapping {
            RegionLayout::Mapped
        } else {
            RegionLayout::Raw
        }
    }

    /// Every (scenario, year) combination, ordered by scenario and then by year
    pub fn scenario_years(&self) -> impl Iterator<Item = ScenarioYear> {
        self.scenarios
            .iter()
            .cartesian_product(self.years.iter().copied())
            .map(|(scenario, year)| ScenarioYear::new(scenario, year))
    }

    /// The number of clusters for a scenario
    fn clusters_for(&self, scenario: &ScenarioID) -> Result<u32> {
        self.clusters
            .get(scenario.as_str())
            .copied()
            .with_context(|| format!("No cluster count given for scenario {scenario}"))
    }

    /// The folder of network files for unmapped networks of a scenario
    fn raw_scenario_dir(&self, scenario: &ScenarioID) -> Result<PathBuf> {
        let clusters = self.clusters_for(scenario)?;
        Ok(self
            .base_dir
            .join(&self.network_dir)
            .join("raw")
            .join(&self.subfolder)
            .join(format!("n{clusters}-{}", self.time_resolution))
            .join(scenario.as_str()))
    }

    /// The folder containing the network for a scenario and year
    pub fn network_path(&self, key: &ScenarioYear) -> Result<PathBuf> {
        let clusters = self.clusters_for(&key.scenario)?;
        let base_name = format!(
            "base_s_{clusters}__{}_{}",
            self.time_resolution, key.year
        );

        if self.mapping {
            Ok(self
                .base_dir
                .join(&self.network_dir)
                .join("mapped")
                .join(format!("{}_{base_name}_mapped", key.scenario)))
        } else {
            Ok(self
                .raw_scenario_dir(&key.scenario)?
                .join("networks")
                .join(base_name))
        }
    }

    /// The region polygon file for a scenario
    pub fn regions_path(&self, scenario: &ScenarioID) -> Result<PathBuf> {
        if self.mapping {
            Ok(self
                .base_dir
                .join(&self.network_dir)
                .join("mapped")
                .join(format!("{scenario}_admin_shapes.geojson")))
        } else {
            Ok(self
                .raw_scenario_dir(scenario)?
                .join("admin_shapes.geojson"))
        }
    }

    /// The plotting configuration file
    pub fn plotting_path(&self) -> PathBuf {
        self.base_dir.join(&self.plotting_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const CONFIG: &str = r#"scenarios = ["all", "minimal_methanol_economy"]
years = [2025, 2030]

[clusters]
all = 60
minimal_methanol_economy = 40
"#;

    fn config_from_str(contents: &str) -> Result<Config> {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(CONFIG_FILE_NAME);
        {
            let mut file = File::create(&file_path).unwrap();
            write!(file, "{contents}").unwrap();
        }
        Config::from_path(dir.path())
    }

    #[test]
    fn test_config_defaults() {
        let config = config_from_str(CONFIG).unwrap();
        assert_eq!(config.time_resolution, "3h");
        assert!(config.mapping);
        assert_eq!(config.country, "GB");
        assert_eq!(config.unit, Unit::GW);
        assert_eq!(config.mapbox_token, None);
        assert_eq!(config.technologies, Technologies::default());
        assert_eq!(config.technologies.transmission, ["H2 pipeline"]);
        assert_eq!(config.layout(), RegionLayout::Mapped);
    }

    #[test]
    fn test_scenario_years() {
        let config = config_from_str(CONFIG).unwrap();
        itertools::assert_equal(
            config.scenario_years().map(|key| key.to_string()),
            [
                "all (2025)",
                "all (2030)",
                "minimal_methanol_economy (2025)",
                "minimal_methanol_economy (2030)",
            ],
        );
    }

    #[test]
    fn test_paths_mapped() {
        let config = Config {
            base_dir: PathBuf::from("/data"),
            ..config_from_str(CONFIG).unwrap()
        };
        let key = ScenarioYear::new(&"all".into(), 2030);
        assert_eq!(
            config.network_path(&key).unwrap(),
            PathBuf::from("/data/networks/mapped/all_base_s_60__3h_2030_mapped")
        );
        assert_eq!(
            config.regions_path(&key.scenario).unwrap(),
            PathBuf::from("/data/networks/mapped/all_admin_shapes.geojson")
        );
        assert_eq!(config.plotting_path(), PathBuf::from("/data/plotting.yaml"));
    }

    #[test]
    fn test_paths_raw() {
        let config = Config {
            base_dir: PathBuf::from("/data"),
            mapping: false,
            ..config_from_str(CONFIG).unwrap()
        };
        let key = ScenarioYear::new(&"minimal_methanol_economy".into(), 2025);
        assert_eq!(
            config.network_path(&key).unwrap(),
            PathBuf::from(
                "/data/networks/raw/pypsa-uk/n40-3h/minimal_methanol_economy/networks/base_s_40__3h_2025"
            )
        );
        assert_eq!(
            config.regions_path(&key.scenario).unwrap(),
            PathBuf::from(
                "/data/networks/raw/pypsa-uk/n40-3h/minimal_methanol_economy/admin_shapes.geojson"
            )
        );
        assert_eq!(config.layout(), RegionLayout::Raw);
    }

    #[rstest]
    #[case(&[2025, 2030], true)]
    #[case(&[2030, 2025], false)]
    #[case(&[2025, 2025], false)]
    #[case(&[], false)]
    fn test_check_years(#[case] years: &[u32], #[case] valid: bool) {
        assert_eq!(check_years(years).is_ok(), valid);
    }

    #[test]
    fn test_check_scenarios() {
        let clusters: IndexMap<String, u32> = [("all".to_string(), 60)].into_iter().collect();
        assert!(check_scenarios(&["all".into()], &clusters).is_ok());
        assert_error!(check_scenarios(&[], &clusters), "`scenarios` is empty");
        assert_error!(
            check_scenarios(&["all".into(), "all".into()], &clusters),
            "Duplicate scenario all"
        );
        assert_error!(
            check_scenarios(&["other".into()], &clusters),
            "No cluster count given for scenario other"
        );
    }

    #[rstest]
    #[case(Unit::GW, true)]
    #[case(Unit::MW, true)]
    #[case(Unit::TWh, false)]
    fn test_check_unit(#[case] unit: Unit, #[case] valid: bool) {
        assert_eq!(check_unit(unit).is_ok(), valid);
    }

    #[test]
    fn test_config_custom() {
        let config = config_from_str(&format!(
            "{CONFIG}\n[technologies]\nrenewables = [\"onshore wind\"]\n"
        ))
        .unwrap();
        assert_eq!(config.technologies.renewables, ["onshore wind"]);
        assert_eq!(config.technologies.heating, default_heating());
    }

    #[test]
    fn test_config_invalid() {
        assert!(config_from_str("scenarios = []\nyears = [2025]\n[clusters]\n").is_err());
    }
}
