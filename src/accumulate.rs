//! Accumulation of regional results over every scenario and planning year.
use crate::attribution::{AttributionOutcome, calculate_capacities_at_regions};
use crate::carrier::reclassify;
use crate::config::Config;
use crate::extract::{
    add_table_to_regions, add_to_regions, electricity_demand_by_sector,
    electricity_generation_mix, heat_demand_by_sector, heating_generation_mix, normalise,
    nodal_electricity_demand, nodal_heat_demand,
};
use crate::input::{load_network, read_regions};
use crate::network::Network;
use crate::region::RegionMap;
use crate::scenario::{ScenarioID, ScenarioYear};
use crate::table::RegionTable;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{debug, error, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator};

/// The column holding annual electricity demand
pub const ELECTRICITY_DEMAND_COLUMN: &str = "annual_elec_demand_TWh";

/// The column holding annual heat demand
pub const HEAT_DEMAND_COLUMN: &str = "annual_heat_demand_TWh";

/// A regional quantity computed for every scenario and year
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, AsRefStr, EnumIter)]
pub enum Indicator {
    /// Annual electricity demand (TWh)
    #[strum(serialize = "regional_electricity_demand")]
    ElectricityDemand,
    /// Share of national electricity generation by carrier (%)
    #[strum(serialize = "regional_elec_gen_shares")]
    ElectricityGenerationShares,
    /// Annual heat demand (TWh)
    #[strum(serialize = "regional_heating_demand")]
    HeatingDemand,
    /// Share of national heat generation by carrier (%)
    #[strum(serialize = "regional_heating_gen_share")]
    HeatingGenerationShares,
    /// Variable renewable capacity
    #[strum(serialize = "regional_renewable_generation_capacity")]
    RenewableCapacity,
    /// Dispatchable generation capacity
    #[strum(serialize = "regional_generation_capacity")]
    GenerationCapacity,
    /// Storage energy capacity
    #[strum(serialize = "regional_storage_capacity")]
    StorageCapacity,
    /// Transmission capacity
    #[strum(serialize = "regional_transmission_capacity")]
    TransmissionCapacity,
    /// Heat supply capacity
    #[strum(serialize = "regional_heating_capacity")]
    HeatingCapacity,
    /// Conversion capacity
    #[strum(serialize = "regional_links_capacity")]
    LinksCapacity,
    /// Annual electricity generation by carrier (TWh)
    #[strum(serialize = "regional_electricity_generation")]
    ElectricityGeneration,
    /// Annual heat generation by carrier (TWh)
    #[strum(serialize = "regional_heating_generation")]
    HeatingGeneration,
}

impl Indicator {
    /// Whether the indicator is drawn as an interactive map
    pub fn is_mapped(self) -> bool {
        !matches!(
            self,
            Indicator::ElectricityGeneration | Indicator::HeatingGeneration
        )
    }

    /// The name of the indicator as shown in file names, prefixed with the country label
    pub fn label(self, country_label: &str) -> String {
        format!("{country_label}_{self}")
    }
}

/// Everything computed for one scenario in one year
#[derive(Debug, Clone, PartialEq, Default)]
pub struct YearResults {
    /// Regional tables for each indicator
    pub tables: IndexMap<Indicator, RegionTable>,
    /// National electricity demand by sector (TWh)
    pub electricity_demand_by_sector: IndexMap<String, f64>,
    /// National heat demand by sector (TWh)
    pub heat_demand_by_sector: IndexMap<String, f64>,
}

/// Results for every scenario and year
#[derive(Debug, Default)]
pub struct Pathways {
    /// Results keyed by scenario and year, in scenario-major order
    pub results: IndexMap<ScenarioYear, YearResults>,
    /// The regions used for each scenario
    pub regions: IndexMap<ScenarioID, Rc<RegionMap>>,
}

impl Pathways {
    /// The scenarios with results, in order
    pub fn scenarios(&self) -> impl Iterator<Item = &ScenarioID> {
        self.regions.keys()
    }

    /// The results for one scenario, ordered by year
    pub fn scenario_results<'a>(
        &'a self,
        scenario: &'a ScenarioID,
    ) -> impl Iterator<Item = (u32, &'a YearResults)> {
        self.results
            .iter()
            .filter(move |(key, _)| key.scenario == *scenario)
            .map(|(key, results)| (key.year, results))
    }

    /// Get the table for an indicator for a given scenario and year
    pub fn table(&self, key: &ScenarioYear, indicator: Indicator) -> Option<&RegionTable> {
        self.results.get(key)?.tables.get(&indicator)
    }
}

/// Loaded networks, reclassified, keyed by scenario and year
#[derive(Default)]
pub struct NetworkCache(HashMap<ScenarioYear, Rc<Network>>);

impl NetworkCache {
    /// Get the reclassified network for a key, loading it from `network_dir` if needed
    pub fn get_or_load(&mut self, key: &ScenarioYear, network_dir: &Path) -> Result<Rc<Network>> {
        if let Some(network) = self.0.get(key) {
            return Ok(Rc::clone(network));
        }

        let network = load_network(network_dir)
            .with_context(|| format!("Failed to load network for {key}"))?;
        let network = Rc::new(reclassify(&network));
        self.0.insert(key.clone(), Rc::clone(&network));

        Ok(network)
    }
}

/// Loaded region maps keyed by file path
#[derive(Default)]
pub struct RegionCache(HashMap<PathBuf, Rc<RegionMap>>);

impl RegionCache {
    /// Get the regions in a file, reading it if needed
    pub fn get_or_load(&mut self, file_path: &Path, config: &Config) -> Result<Rc<RegionMap>> {
        if let Some(regions) = self.0.get(file_path) {
            return Ok(Rc::clone(regions));
        }

        let regions = Rc::new(read_regions(file_path, config.layout(), &config.country)?);
        self.0.insert(file_path.to_path_buf(), Rc::clone(&regions));

        Ok(regions)
    }
}

/// Log the outcome of attributing each category of an indicator
fn log_outcomes(
    key: &ScenarioYear,
    indicator: Indicator,
    outcomes: &IndexMap<String, AttributionOutcome>,
) {
    for (category, outcome) in outcomes {
        match outcome {
            AttributionOutcome::Attributed { columns } => {
                debug!("{key}: {indicator}: {category} -> {}", columns.join(", "));
            }
            AttributionOutcome::Skipped => {
                debug!("{key}: {indicator}: no capacity found for {category}");
            }
            AttributionOutcome::Failed { reason } => {
                error!("{key}: {indicator}: could not attribute {category}: {reason}");
            }
        }
    }
}

/// Compute every indicator for a single network
pub fn process_network(
    key: &ScenarioYear,
    network: &Network,
    regions: &RegionMap,
    config: &Config,
) -> Result<YearResults> {
    let country = config.country.as_str();
    let technologies = &config.technologies;
    let mut results = YearResults::default();

    let capacities = [
        (Indicator::RenewableCapacity, &technologies.renewables, config.unit),
        (Indicator::GenerationCapacity, &technologies.generators, config.unit),
        (Indicator::StorageCapacity, &technologies.storage, config.unit.energy()),
        (Indicator::TransmissionCapacity, &technologies.transmission, config.unit),
        (Indicator::HeatingCapacity, &technologies.heating, config.unit),
        (Indicator::LinksCapacity, &technologies.links, config.unit),
    ];
    for (indicator, categories, unit) in capacities {
        let attribution =
            calculate_capacities_at_regions(network, categories, regions, country, unit);
        log_outcomes(key, indicator, &attribution.outcomes);
        results.tables.insert(indicator, attribution.table);
    }

    let mut demand = RegionTable::new(regions);
    add_to_regions(
        &mut demand,
        regions,
        ELECTRICITY_DEMAND_COLUMN,
        &nodal_electricity_demand(network, country),
    )?;
    results.tables.insert(Indicator::ElectricityDemand, demand);

    let mut demand = RegionTable::new(regions);
    add_to_regions(
        &mut demand,
        regions,
        HEAT_DEMAND_COLUMN,
        &nodal_heat_demand(network, country),
    )?;
    results.tables.insert(Indicator::HeatingDemand, demand);

    let mixes = [
        (
            Indicator::ElectricityGeneration,
            Indicator::ElectricityGenerationShares,
            electricity_generation_mix(network, country),
        ),
        (
            Indicator::HeatingGeneration,
            Indicator::HeatingGenerationShares,
            heating_generation_mix(network, country),
        ),
    ];
    for (generation, shares, mix) in mixes {
        let mut table = RegionTable::new(regions);
        add_table_to_regions(&mut table, regions, &mix)?;
        results.tables.insert(generation, table);

        let mut table = RegionTable::new(regions);
        add_table_to_regions(&mut table, regions, &normalise(&mix))?;
        results.tables.insert(shares, table);
    }

    results.electricity_demand_by_sector = electricity_demand_by_sector(network, country);
    results.heat_demand_by_sector = heat_demand_by_sector(network, country);

    // Keep tables in a fixed order regardless of the order computed
    results.tables.sort_keys();

    Ok(results)
}

/// Compute every indicator for every scenario and year in the configuration.
///
/// A network or region file which is missing or invalid is a fatal error.
pub fn accumulate(config: &Config) -> Result<Pathways> {
    let mut networks = NetworkCache::default();
    let mut region_cache = RegionCache::default();
    let mut pathways = Pathways::default();

    for key in config.scenario_years() {
        info!("Processing {key}");

        let regions_path = config.regions_path(&key.scenario)?;
        let regions = region_cache.get_or_load(&regions_path, config)?;
        let network = networks.get_or_load(&key, &config.network_path(&key)?)?;

        let results = process_network(&key, &network, &regions, config)?;
        pathways
            .regions
            .entry(key.scenario.clone())
            .or_insert(regions);
        pathways.results.insert(key, results);
    }

    debug!(
        "Indicators computed: {}",
        Indicator::iter()
            .map(|indicator| indicator.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(pathways)
}
