//! Attribution of installed capacities to regions.
//!
//! Capacities are taken from one of three component types depending on the technology category:
//! stores for storage technologies, generators for variable renewables and links for everything
//! else (conventional generation, heating, conversion and transmission).
use crate::network::{Network, strip_low_voltage};
use crate::region::{RegionID, RegionMap, find_region};
use crate::table::{Column, RegionTable};
use crate::units::Unit;
use indexmap::IndexMap;

/// Categories whose capacity is the energy capacity of stores
pub const STORAGE_CATEGORIES: [&str; 7] = [
    "battery",
    "H2",
    "methanol",
    "co2 sequestered",
    "ammonia",
    "TES central",
    "TES decentral",
];

/// The category for rooftop solar, whose generators sit on low-voltage buses
const PV_ROOFTOP: &str = "PV rooftop";

/// Get the generator carriers making up a renewable category, if it is one
pub fn renewable_carriers(category: &str) -> Option<&'static [&'static str]> {
    match category {
        "onshore wind" => Some(&["onwind"]),
        "offshore wind" => Some(&["offwind-ac", "offwind-dc"]),
        "PV utility" => Some(&["solar"]),
        PV_ROOFTOP => Some(&["solar rooftop"]),
        _ => None,
    }
}

/// The result of attributing a single category
#[derive(Debug, Clone, PartialEq)]
pub enum AttributionOutcome {
    /// Columns were written to the table
    Attributed {
        /// The names of the columns written
        columns: Vec<String>,
    },
    /// No capacity of this category was found in the country
    Skipped,
    /// Computed values could not be written to the table
    Failed {
        /// A description of the problem
        reason: String,
    },
}

/// Capacities by region for a list of categories
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution {
    /// The table of capacities. Each category contributes zero or more columns.
    pub table: RegionTable,
    /// The outcome for each requested category, in the order requested
    pub outcomes: IndexMap<String, AttributionOutcome>,
}

/// Capacities for one category, by carrier and then by region
type CarrierColumns = IndexMap<String, Column>;

/// Add a value to a carrier column in the given region
fn accumulate(columns: &mut CarrierColumns, carrier: &str, region: &RegionID, value: f64) {
    *columns
        .entry(carrier.to_string())
        .or_default()
        .entry(region.clone())
        .or_default() += value;
}

/// Energy capacity of stores of the given category, by carrier and region
fn storage_columns(
    network: &Network,
    category: &str,
    regions: &RegionMap,
    country: &str,
) -> CarrierColumns {
    let mut columns = CarrierColumns::new();
    for store in &network.stores {
        if !store.carrier.contains(category) || !store.bus.contains(country) {
            continue;
        }

        if let Some(region) = find_region(regions, &store.bus) {
            accumulate(&mut columns, &store.carrier, region, store.e_nom_opt);
        }
    }

    columns
}

/// Power capacity of renewable generators on in-country high-voltage buses, by region
fn renewable_columns(
    network: &Network,
    category: &str,
    carriers: &[&str],
    regions: &RegionMap,
    country: &str,
) -> CarrierColumns {
    let mut columns = CarrierColumns::new();
    for generator in &network.generators {
        if !carriers.contains(&generator.carrier.as_str()) {
            continue;
        }

        let bus = if category == PV_ROOFTOP {
            let stripped = strip_low_voltage(&generator.bus);
            if stripped == generator.bus {
                // Rooftop solar must be connected at low voltage
                continue;
            }
            stripped
        } else {
            generator.bus.as_str()
        };

        if !network.is_country_ac_bus(bus, country) {
            continue;
        }

        if let Some(region) = find_region(regions, bus) {
            accumulate(&mut columns, category, region, generator.p_nom_opt);
        }
    }

    columns
}

/// Output capacity of links of the given category, by carrier and region.
///
/// Each link is attributed via its input bus if that lies in the country and in a region,
/// otherwise via its output bus on the same terms.
fn link_columns(
    network: &Network,
    category: &str,
    regions: &RegionMap,
    country: &str,
) -> CarrierColumns {
    let in_country_region = |bus: &str| {
        if bus.contains(country) {
            find_region(regions, bus)
        } else {
            None
        }
    };

    let mut columns = CarrierColumns::new();
    for link in &network.links {
        if !link.carrier.contains(category) {
            continue;
        }

        let region = in_country_region(&link.bus0).or_else(|| in_country_region(&link.bus1));
        if let Some(region) = region {
            accumulate(
                &mut columns,
                &link.carrier,
                region,
                link.p_nom_opt * link.efficiency,
            );
        }
    }

    columns
}

/// Write the columns for one category to the table, converting to the requested unit.
///
/// When only one carrier was found the column is named after the category, otherwise there is
/// one column per carrier. Either every column is written or, on failure, none are.
fn write_columns(
    table: &mut RegionTable,
    category: &str,
    columns: CarrierColumns,
    unit: Unit,
) -> AttributionOutcome {
    if columns.is_empty() {
        return AttributionOutcome::Skipped;
    }

    let single = columns.len() == 1;
    let mut updated = table.clone();
    let mut written = Vec::new();
    for (carrier, column) in columns {
        let name = if single { category.to_string() } else { carrier };
        let column = column
            .into_iter()
            .map(|(region, value)| (region, unit.scale_from_base(value)))
            .collect();
        if let Err(err) = updated.set_column(&name, column) {
            return AttributionOutcome::Failed {
                reason: err.to_string(),
            };
        }
        written.push(name);
    }

    *table = updated;
    AttributionOutcome::Attributed { columns: written }
}

/// Calculate installed capacities by region for a list of technology categories.
///
/// Carriers are matched by substring, so a category of `H2` covers both `H2 underground store`
/// and `H2 overground store`. Elements whose bus matches no region are left out.
///
/// # Arguments
///
/// * `network` - The network, with carriers already relabelled into reporting categories
/// * `categories` - The technology categories to attribute
/// * `regions` - The regions which form the rows of the output table
/// * `country` - Country code used to select in-country elements
/// * `unit` - The unit for the output. Store capacities use the matching energy unit.
pub fn calculate_capacities_at_regions(
    network: &Network,
    categories: &[String],
    regions: &RegionMap,
    country: &str,
    unit: Unit,
) -> Attribution {
    let mut table = RegionTable::new(regions);
    let mut outcomes = IndexMap::new();
    for category in categories {
        let columns = if STORAGE_CATEGORIES.contains(&category.as_str()) {
            storage_columns(network, category, regions, country)
        } else if let Some(carriers) = renewable_carriers(category) {
            renewable_columns(network, category, carriers, regions, country)
        } else {
            link_columns(network, category, regions, country)
        };

        let outcome = write_columns(&mut table, category, columns, unit);
        outcomes.insert(category.clone(), outcome);
    }

    Attribution { table, outcomes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::reclassify;
    use crate::fixture::{bus, generator, network, regions, store};
    use float_cmp::assert_approx_eq;
    use indexmap::indexmap;
    use rstest::rstest;

    fn categories(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn attribute(network: &Network, names: &[&str], regions: &RegionMap) -> Attribution {
        calculate_capacities_at_regions(network, &categories(names), regions, "GB", Unit::GW)
    }

    #[rstest]
    fn test_single_generator(regions: RegionMap) {
        let network = Network {
            buses: [bus("GB north 0", "AC", "GB"), bus("GB south 0", "AC", "GB")]
                .into_iter()
                .map(|bus| (bus.name.clone(), bus))
                .collect(),
            generators: vec![generator("gen", "GB north 0", "onwind", 10.0)],
            ..Network::default()
        };

        let attribution = calculate_capacities_at_regions(
            &network,
            &categories(&["onshore wind"]),
            &regions,
            "GB",
            Unit::MW,
        );
        assert_eq!(attribution.table.get("GB north", "onshore wind"), Some(10.0));
        assert_eq!(attribution.table.get("GB south", "onshore wind"), None);
    }

    #[rstest]
    fn test_h2_stores_split(regions: RegionMap) {
        let mut network = Network {
            stores: vec![
                store("cheap", "GB north 0 H2", "H2 Store", 5.0, 150.0),
                store("dear", "GB north 0 H2", "H2 Store", 5.0, 250.0),
            ],
            ..Network::default()
        };
        network = reclassify(&network);

        let attribution = calculate_capacities_at_regions(
            &network,
            &categories(&["H2"]),
            &regions,
            "GB",
            Unit::MWh,
        );
        assert_eq!(
            attribution.outcomes["H2"],
            AttributionOutcome::Attributed {
                columns: categories(&["H2 underground store", "H2 overground store"])
            }
        );
        assert_eq!(
            attribution.table.get("GB north", "H2 underground store"),
            Some(5.0)
        );
        assert_eq!(
            attribution.table.get("GB north", "H2 overground store"),
            Some(5.0)
        );
    }

    #[rstest]
    fn test_renewables(network: Network, regions: RegionMap) {
        let attribution = attribute(
            &network,
            &["onshore wind", "offshore wind", "PV rooftop", "PV utility"],
            &regions,
        );
        let table = &attribution.table;

        // The foreign generator is excluded
        assert_approx_eq!(f64, table.column_total("onshore wind"), 10.0);
        assert_eq!(table.get("GB north", "onshore wind"), Some(10.0));

        // Both AC- and DC-connected offshore wind, matched to the longest region name
        assert_eq!(table.get("GB east", "offshore wind"), Some(3.0));
        assert_eq!(table.get("GB east midland", "offshore wind"), None);

        assert_eq!(table.get("GB north", "PV rooftop"), Some(0.5));
        assert_eq!(
            attribution.outcomes["PV utility"],
            AttributionOutcome::Skipped
        );
    }

    #[rstest]
    fn test_links(network: Network, regions: RegionMap) {
        let network = reclassify(&network);
        let attribution = attribute(
            &network,
            &["OCGT", "CHP", "nuclear", "H2 Electrolysis", "heat pump"],
            &regions,
        );
        let table = &attribution.table;

        // Input bus is not in any region, so the output bus is used
        assert_approx_eq!(f64, table.get("GB south", "OCGT").unwrap(), 0.4);
        assert_approx_eq!(f64, table.get("GB north", "CHP").unwrap(), 0.2);
        assert_approx_eq!(f64, table.get("GB east midland", "H2 Electrolysis").unwrap(), 1.4);
        assert_approx_eq!(f64, table.get("GB north", "heat pump").unwrap(), 0.3);
        assert_eq!(attribution.outcomes["nuclear"], AttributionOutcome::Skipped);
        assert!(table.column("nuclear").is_none());
    }

    #[rstest]
    fn test_storage(network: Network, regions: RegionMap) {
        let network = reclassify(&network);
        let attribution = attribute(&network, &["battery", "TES central"], &regions);
        let table = &attribution.table;

        assert_eq!(table.get("GB south", "battery"), Some(2.0));
        assert_approx_eq!(f64, table.column_total("battery"), 2.0);
        assert_approx_eq!(f64, table.get("GB north", "TES central").unwrap(), 0.8);
    }

    #[rstest]
    fn test_no_double_counting(network: Network, regions: RegionMap) {
        let network = reclassify(&network);
        let attribution = attribute(&network, &["battery", "H2", "OCGT"], &regions);

        let raw_stores: f64 = network
            .stores
            .iter()
            .filter(|s| s.bus.contains("GB"))
            .map(|s| s.e_nom_opt)
            .sum();
        let raw_links: f64 = network
            .links
            .iter()
            .filter(|l| l.carrier == "OCGT")
            .map(|l| l.p_nom_opt * l.efficiency)
            .sum();

        for (name, _) in attribution.table.columns() {
            let raw = if name == "OCGT" { raw_links } else { raw_stores };
            assert!(attribution.table.column_total(name) <= Unit::GW.scale_from_base(raw));
        }
    }

    #[rstest]
    fn test_write_columns_failed(regions: RegionMap) {
        let mut table = RegionTable::new(&regions);
        table
            .set_column("battery", indexmap! {"GB south".into() => 2.0})
            .unwrap();
        let expected = table.clone();

        // The second carrier refers to a region outside the table
        let columns = indexmap! {
            "H2 underground store".to_string() => indexmap! {"GB north".into() => 5.0},
            "H2 overground store".to_string() => indexmap! {"FR 0".into() => 5.0},
        };
        let outcome = write_columns(&mut table, "H2", columns, Unit::MWh);
        assert!(matches!(
            outcome,
            AttributionOutcome::Failed { reason } if reason.contains("FR 0")
        ));
        assert_eq!(table, expected);
        assert!(table.column("H2 underground store").is_none());
    }

    #[rstest]
    fn test_idempotent(network: Network, regions: RegionMap) {
        let network = reclassify(&network);
        let names = ["onshore wind", "battery", "H2", "CHP", "OCGT"];
        assert_eq!(
            attribute(&network, &names, &regions),
            attribute(&network, &names, &regions)
        );
    }
}
