//! Figures drawn from the accumulated results, and the colours and orderings they share.
use crate::accumulate::{Indicator, Pathways};
use crate::config::Config;
use crate::input::read_yaml;
use anyhow::Result;
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::Path;
use strum::IntoEnumIterator;

pub mod chart;
use chart::{ChartKind, write_energy_balance_chart};
pub mod map;
use map::write_interactive_map;

/// Colour used for categories without an entry in `tech_colors`
pub const FALLBACK_COLOUR: &str = "#999999";

/// Preferred stacking order for electricity supply
pub const PREFERRED_ORDER: [&str; 53] = [
    "renewables",
    "wind",
    "onwind",
    "offwind",
    "offwind-ac",
    "offwind-dc",
    "onshore wind",
    "offshore wind",
    "offshore wind (AC)",
    "offshore wind (DC)",
    "solar PV",
    "solar thermal",
    "solar rooftop",
    "solar",
    "hydro",
    "ror",
    "solid biomass",
    "biogas",
    "transmission lines",
    "hydroelectricity",
    "hydro reservoir",
    "run of river",
    "pumped hydro storage",
    "nuclear",
    "OCGT",
    "CCGT",
    "battery storage",
    "BEV charger",
    "building retrofitting",
    "H2",
    "H2 Electrolysis",
    "H2 Store",
    "H2 pipeline",
    "SMR",
    "SMR-CC",
    "import H2",
    "H2 turbine",
    "methanation",
    "ammonia",
    "ground heat pump",
    "air heat pump",
    "heat pump",
    "resistive heater",
    "hot water storage",
    "power-to-heat",
    "gas-to-power/heat",
    "gas boiler",
    "gas",
    "natural gas",
    "CHP",
    "power-to-gas",
    "power-to-liquid",
    "CO2 sequestration",
];

/// Preferred stacking order for heat supply
pub const PREFERRED_ORDER_HEATING: [&str; 15] = [
    "air heat pump",
    "ground heat pump",
    "resistive heater",
    "gas boiler",
    "gas for industry heat",
    "gas for industry heat CC",
    "solid biomass CHP",
    "solid biomass for industry heat",
    "solid biomass for industry heat CC",
    "biomass boiler",
    "oil boiler",
    "H2 Electrolysis",
    "H2 Fuel Cell",
    "TES central discharger",
    "TES decentral discharger",
];

/// Preferred stacking order for demand by sector
pub const PREFERRED_ORDER_DEMAND: [&str; 10] = [
    "residential electricity",
    "industry electricity",
    "agriculture electricity",
    "electrified heating (urban central)",
    "electrified heating (urban decentral)",
    "electrified heating (rural)",
    "land transport",
    "ammonia",
    "CCUS",
    "electrolytic H2",
];

/// Colours added to, or replacing, those in the plotting file
const FIXED_COLOURS: [(&str, &str); 17] = [
    ("methanol", "mediumspringgreen"),
    ("renewables", "#DDEC354F"),
    ("imports", "#94073d"),
    ("exports", "#e06796"),
    ("urban central biogas CHP", "olive"),
    ("TES central discharger", "#FFA500"),
    ("TES decentral discharger", "#FF8C00"),
    ("residential electricity", "#a2a2a2"),
    ("industry electricity", "#3f4b38"),
    ("agriculture electricity", "#521010"),
    ("CCUS", "#ff002b"),
    ("urban decentral heat", "#ca9c92"),
    ("rural heat", "#C30202"),
    ("agriculture heat", "#B4B4B4"),
    ("low-temperature heat for industry", "#656565"),
    ("medium heat for industry", "#291F1A"),
    ("high heat for industry", "#000000"),
];

/// Categories which take their colour from another entry, as (category, source)
const SYNONYM_COLOURS: [(&str, &str); 14] = [
    ("gas CHP", "urban central gas CHP"),
    ("gas CHP CC", "urban central gas CHP CC"),
    ("solid biomass CHP", "urban central solid biomass CHP"),
    ("solid biomass CHP CC", "urban central solid biomass CHP CC"),
    ("methanol CHP", "urban central methanol CHP"),
    ("methanol CHP CC", "urban central methanol CHP CC"),
    ("biomass to liquid CC", "biomass to liquid"),
    ("electrolytic H2", "H2"),
    ("heating", "ground heat pump"),
    ("residential heating", "air heat pump"),
    ("land transport", "EV battery"),
    ("electrified heating (urban central)", "urban central heat"),
    ("electrified heating (urban decentral)", "urban decentral heat"),
    ("electrified heating (rural)", "rural heat"),
];

#[derive(Deserialize)]
struct PlottingFile {
    plotting: PlottingSection,
}

#[derive(Deserialize)]
struct PlottingSection {
    tech_colors: IndexMap<String, String>,
}

/// Get the `i`th of `n` grey shades, running from light to dark
fn grey_shade(i: usize, n: usize) -> String {
    let t = if n > 1 {
        0.2 + 0.6 * i as f64 / (n - 1) as f64
    } else {
        0.5
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let level = (255.0 * (1.0 - t)).round() as u8;
    format!("#{level:02x}{level:02x}{level:02x}")
}

/// Colours for technologies and sectors
#[derive(Debug, Default)]
pub struct PlottingConfig {
    tech_colors: IndexMap<String, String>,
    /// Categories already warned about, so each is reported once
    warned: RefCell<HashSet<String>>,
}

impl PlottingConfig {
    /// Read colours from a plotting file and add the derived entries
    pub fn from_path(file_path: &Path) -> Result<Self> {
        let file: PlottingFile = read_yaml(file_path)?;
        Ok(Self::new(file.plotting.tech_colors))
    }

    /// Create a configuration from base colours, adding the derived entries
    pub fn new(mut tech_colors: IndexMap<String, String>) -> Self {
        for (category, colour) in FIXED_COLOURS {
            tech_colors.insert(category.to_string(), colour.to_string());
        }

        for (category, source) in SYNONYM_COLOURS {
            match tech_colors.get(source) {
                Some(colour) => {
                    let colour = colour.clone();
                    tech_colors.insert(category.to_string(), colour);
                }
                None => debug!("No colour for {source}, so none derived for {category}"),
            }
        }

        for (i, sector) in PREFERRED_ORDER_DEMAND.iter().enumerate() {
            if !tech_colors.contains_key(*sector) {
                tech_colors.insert(
                    sector.to_string(),
                    grey_shade(i, PREFERRED_ORDER_DEMAND.len()),
                );
            }
        }

        Self {
            tech_colors,
            warned: RefCell::default(),
        }
    }

    /// Get the colour for a category, if it has one
    pub fn get(&self, category: &str) -> Option<&str> {
        self.tech_colors.get(category).map(String::as_str)
    }

    /// Get the colour for a category, falling back to grey with a warning
    pub fn colour(&self, category: &str) -> &str {
        if let Some(colour) = self.get(category) {
            return colour;
        }

        if self.warned.borrow_mut().insert(category.to_string()) {
            warn!("No colour defined for {category}; using {FALLBACK_COLOUR}");
        }
        FALLBACK_COLOUR
    }
}

/// Order categories with those in `preferred` first, in that order, followed by the rest sorted
pub fn order_categories<'a, I>(preferred: &[&str], present: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<&str> = present.into_iter().collect();
    let mut ordered: Vec<String> = preferred
        .iter()
        .filter(|category| present.contains(category))
        .map(ToString::to_string)
        .collect();

    let mut rest: Vec<&str> = present
        .iter()
        .copied()
        .filter(|category| !preferred.contains(category))
        .collect();
    rest.sort_unstable();
    rest.dedup();
    ordered.extend(rest.into_iter().map(ToString::to_string));

    ordered
}

/// Draw every chart and map for every scenario into `figures_dir`.
///
/// # Returns
///
/// The number of figures written
pub fn write_figures(
    figures_dir: &Path,
    pathways: &Pathways,
    config: &Config,
    plotting: &PlottingConfig,
) -> Result<usize> {
    let mut count = 0;
    for scenario in pathways.scenarios() {
        for kind in [ChartKind::Electricity, ChartKind::Heating] {
            let file_path =
                write_energy_balance_chart(figures_dir, pathways, scenario, kind, plotting)?;
            debug!("Wrote {}", file_path.display());
            count += 1;
        }

        for indicator in Indicator::iter().filter(|indicator| indicator.is_mapped()) {
            if let Some(file_path) =
                write_interactive_map(figures_dir, pathways, scenario, indicator, config)?
            {
                debug!("Wrote {}", file_path.display());
                count += 1;
            }
        }
    }

    info!("Wrote {count} figures to {}", figures_dir.display());
    Ok(count)
}

/// Escape text for inclusion in XML or HTML
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
