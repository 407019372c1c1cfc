//! Extraction of annual demand and generation from network time series.
//!
//! All quantities are returned in TWh per year. Per-bus results can be mapped onto regions with
//! [`add_to_regions`] and [`add_table_to_regions`].
use crate::network::{DC_CARRIER, Link, Load, Network, strip_low_voltage};
use crate::region::{RegionMap, find_region};
use crate::table::{Column, RegionTable};
use crate::units::annual_twh;
use anyhow::Result;
use indexmap::IndexMap;

/// Values by bus
pub type NodalSeries = IndexMap<String, f64>;

/// Values by carrier and then by bus
pub type NodalTable = IndexMap<String, NodalSeries>;

/// Names of heat buses, which are appended to the name of the node they belong to
pub const HEAT_BUS_NAMES: [&str; 6] = [
    "urban central heat",
    "medium heat for industry",
    "high heat for industry",
    "agriculture heat",
    "rural heat",
    "urban decentral heat",
];

/// Link carriers containing any of these are not counted as electricity generation
const NON_GENERATION_LINKS: [&str; 3] = ["discharge", "Fuel Cell", "electricity distribution grid"];

/// The storage unit carrier counted as electricity generation
const HYDRO_CARRIER: &str = "hydro";

/// The carrier of direct air capture links
const DAC_CARRIER: &str = "DAC";

/// Sector labels used when reporting electricity demand
const SECTOR_NAMES: [(&str, &str); 9] = [
    ("EV battery", "land transport"),
    ("DAC", "CCUS"),
    ("agriculture electricity", "industry electricity"),
    ("H2", "electrolytic H2"),
    ("Haber-Bosch", "ammonia"),
    ("electricity", "residential electricity"),
    ("rural heat", "electrified heating (rural)"),
    ("urban central heat", "electrified heating (urban central)"),
    ("urban decentral heat", "electrified heating (urban decentral)"),
];

/// Remove heat bus names from a bus name, leaving the name of the node
pub fn strip_heat_bus(bus: &str) -> String {
    HEAT_BUS_NAMES
        .iter()
        .fold(bus.to_string(), |bus, name| bus.replace(name, ""))
        .trim()
        .to_string()
}

/// Get the reporting label for an electricity demand sector
fn sector_name(label: &str) -> &str {
    SECTOR_NAMES
        .iter()
        .find(|(from, _)| *from == label)
        .map_or(label, |&(_, to)| to)
}

fn add_nodal(series: &mut NodalSeries, bus: &str, value: f64) {
    *series.entry(bus.to_string()).or_default() += value;
}

fn add_nodal_table(table: &mut NodalTable, carrier: &str, bus: &str, value: f64) {
    add_nodal(table.entry(carrier.to_string()).or_default(), bus, value);
}

/// Convert all values in a series from MW totals into TWh
fn series_to_twh(series: &mut NodalSeries, snapshot_weighting: f64) {
    for value in series.values_mut() {
        *value = annual_twh(*value, snapshot_weighting);
    }
}

fn table_to_twh(table: &mut NodalTable, snapshot_weighting: f64) {
    for series in table.values_mut() {
        series_to_twh(series, snapshot_weighting);
    }
}

/// Links which draw electricity from the grid to serve an end use.
///
/// These are links other than DC transmission whose input is an electricity bus, excluding
/// batteries and distribution. Each link is returned with its total input flow.
pub fn endogenous_demand(network: &Network) -> impl Iterator<Item = (&Link, f64)> {
    network
        .links
        .iter()
        .filter(|link| {
            link.carrier != DC_CARRIER
                && network.is_electricity_bus(&link.bus0)
                && !link.name.contains("battery")
                && !link.name.contains("distribution")
        })
        .map(|link| (link, network.links_p0.get(&link.name)))
}

/// Exogenous electricity loads with their total demand
fn electricity_loads(network: &Network) -> impl Iterator<Item = (&Load, f64)> {
    network
        .loads
        .iter()
        .filter(|load| load.carrier.contains("electricity"))
        .map(|load| (load, network.loads_p.get(&load.name)))
}

/// Annual electricity demand by node, including both exogenous loads and endogenous demand.
///
/// Low-voltage buses are merged into their high-voltage node.
pub fn nodal_electricity_demand(network: &Network, country: &str) -> NodalSeries {
    let mut demand = NodalSeries::new();
    for (link, total) in endogenous_demand(network) {
        add_nodal(&mut demand, strip_low_voltage(&link.bus0), total);
    }
    for (load, total) in electricity_loads(network) {
        add_nodal(&mut demand, strip_low_voltage(&load.bus), total);
    }

    demand.retain(|bus, _| bus.contains(country));
    series_to_twh(&mut demand, network.snapshot_weighting());
    demand
}

/// Annual heat demand by node
pub fn nodal_heat_demand(network: &Network, country: &str) -> NodalSeries {
    let mut demand = NodalSeries::new();
    for load in network.loads.iter().filter(|l| l.carrier.contains("heat")) {
        add_nodal(
            &mut demand,
            &strip_heat_bus(&load.bus),
            network.loads_p.get(&load.name),
        );
    }

    demand.retain(|bus, _| bus.contains(country));
    series_to_twh(&mut demand, network.snapshot_weighting());
    demand
}

/// Annual electricity generation by carrier and node.
///
/// Generation comes from generators at either voltage level, links delivering to high-voltage
/// buses (other than storage discharge, fuel cells and distribution) and hydro storage units.
pub fn electricity_generation_mix(network: &Network, country: &str) -> NodalTable {
    let mut mix = NodalTable::new();
    for generator in &network.generators {
        let bus = if network.is_ac_bus(&generator.bus) {
            generator.bus.as_str()
        } else if network.is_low_voltage_bus(&generator.bus) {
            strip_low_voltage(&generator.bus)
        } else {
            continue;
        };
        add_nodal_table(
            &mut mix,
            &generator.carrier,
            bus,
            network.generators_p.get(&generator.name),
        );
    }

    for link in &network.links {
        if link.carrier == DC_CARRIER
            || !network.is_ac_bus(&link.bus1)
            || NON_GENERATION_LINKS
                .iter()
                .any(|pattern| link.carrier.contains(pattern))
        {
            continue;
        }
        add_nodal_table(
            &mut mix,
            &link.carrier,
            &link.bus1,
            -network.links_p1.get(&link.name),
        );
    }

    for unit in network
        .storage_units
        .iter()
        .filter(|unit| unit.carrier == HYDRO_CARRIER)
    {
        add_nodal_table(
            &mut mix,
            &unit.carrier,
            &unit.bus,
            network.storage_units_p.get(&unit.name),
        );
    }

    for series in mix.values_mut() {
        series.retain(|bus, _| bus.contains(country));
    }
    mix.retain(|_, series| !series.is_empty());
    table_to_twh(&mut mix, network.snapshot_weighting());
    mix
}

/// Annual heat generation by carrier and node.
///
/// Heat is counted from links delivering to a heat bus at either output port. Where a carrier
/// delivers heat at its secondary port, those values take the place of any from its main port.
pub fn heating_generation_mix(network: &Network, country: &str) -> NodalTable {
    let mut main = NodalTable::new();
    let mut secondary = NodalTable::new();
    for link in &network.links {
        if network.is_heat_bus(&link.bus1) {
            add_nodal_table(
                &mut main,
                &link.carrier,
                &strip_heat_bus(&link.bus1),
                -network.links_p1.get(&link.name),
            );
        }

        if let Some(bus2) = link.bus2.as_deref().filter(|bus| network.is_heat_bus(bus)) {
            add_nodal_table(
                &mut secondary,
                &link.carrier,
                &strip_heat_bus(bus2),
                -network.links_p2.get(&link.name),
            );
        }
    }

    let mut mix = main;
    for (carrier, series) in secondary {
        mix.insert(carrier, series);
    }

    for series in mix.values_mut() {
        series.retain(|bus, _| bus.contains(country));
    }
    mix.retain(|_, series| !series.is_empty());
    table_to_twh(&mut mix, network.snapshot_weighting());
    mix
}

/// Annual electricity demand of the country, by sector.
///
/// Endogenous demand is labelled by link carrier, except for links supplying a heat bus, which
/// are labelled by the kind of heat supplied. Exogenous loads are labelled by their carrier.
pub fn electricity_demand_by_sector(network: &Network, country: &str) -> IndexMap<String, f64> {
    let mut demand = IndexMap::<String, f64>::new();
    for (link, total) in endogenous_demand(network) {
        if !strip_low_voltage(&link.bus1).contains(country) {
            continue;
        }

        let label = match network.bus_carrier(&link.bus1) {
            Some(carrier) if carrier.contains("heat") && link.carrier != DAC_CARRIER => carrier,
            _ => link.carrier.as_str(),
        };
        *demand.entry(sector_name(label).to_string()).or_default() += total;
    }

    for (load, total) in electricity_loads(network) {
        if strip_low_voltage(&load.bus).contains(country) {
            *demand
                .entry(sector_name(&load.carrier).to_string())
                .or_default() += total;
        }
    }

    let weighting = network.snapshot_weighting();
    demand
        .into_iter()
        .map(|(sector, total)| (sector, annual_twh(total, weighting)))
        .collect()
}

/// Annual heat demand of the country, by sector
pub fn heat_demand_by_sector(network: &Network, country: &str) -> IndexMap<String, f64> {
    let mut demand = IndexMap::<String, f64>::new();
    for load in network
        .loads
        .iter()
        .filter(|load| load.name.contains("heat") && load.name.contains(country))
    {
        *demand.entry(load.carrier.clone()).or_default() += network.loads_p.get(&load.name);
    }

    let weighting = network.snapshot_weighting();
    demand
        .into_iter()
        .map(|(sector, total)| (sector, annual_twh(total, weighting)))
        .collect()
}

/// Express every value in the table as a percentage of the table's grand total.
///
/// A table whose total is zero is returned unchanged.
pub fn normalise(table: &NodalTable) -> NodalTable {
    let total: f64 = table.values().flat_map(|series| series.values()).sum();
    if total == 0.0 {
        return table.clone();
    }

    table
        .iter()
        .map(|(carrier, series)| {
            let series = series
                .iter()
                .map(|(bus, value)| (bus.clone(), value / total * 100.0))
                .collect();
            (carrier.clone(), series)
        })
        .collect()
}

/// Sum per-bus values into regions. Buses which match no region are left out.
fn to_regions(regions: &RegionMap, series: &NodalSeries) -> Column {
    let mut column = Column::new();
    for (bus, value) in series {
        if let Some(region) = find_region(regions, bus) {
            *column.entry(region.clone()).or_default() += value;
        }
    }

    column
}

/// Write a per-bus series to the table as a single regional column
pub fn add_to_regions(
    table: &mut RegionTable,
    regions: &RegionMap,
    category: &str,
    series: &NodalSeries,
) -> Result<()> {
    table.set_column(category, to_regions(regions, series))
}

/// Write every carrier of a per-bus table to the region table as a column
pub fn add_table_to_regions(
    table: &mut RegionTable,
    regions: &RegionMap,
    nodal: &NodalTable,
) -> Result<()> {
    for (carrier, series) in nodal {
        add_to_regions(table, regions, carrier, series)?;
    }

    Ok(())
}
