//! Interactive choropleth maps of regional indicators, written as standalone HTML pages.
//!
//! Each page holds a Plotly figure with one trace per technology. A dropdown selects the
//! technology shown and a slider selects the planning year.
use crate::accumulate::{Indicator, Pathways};
use super::escape_xml;
use crate::config::Config;
use crate::region::{RegionID, RegionMap, hover_labels};
use crate::scenario::ScenarioID;
use anyhow::{Context, Result};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use log::warn;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

/// Columns whose regional sum is at or below this are not drawn
const MIN_COLUMN_TOTAL: f64 = 0.1;

/// Upper limit of the colour scale for share indicators (%)
const SHARE_ZMAX: f64 = 10.0;

/// Upper limits of the colour scale for each technology
const ZMAXS: [(&str, f64); 30] = [
    ("onshore wind", 50.0),
    ("offshore wind", 30.0),
    ("PV utility", 20.0),
    ("PV rooftop", 20.0),
    ("H2 Fuel Cells", 1.0),
    ("co2 sequestered", 2500.0),
    ("biomass CHP", 5.0),
    ("nuclear", 5.0),
    ("gas CHP", 5.0),
    ("OCGT", 5.0),
    ("CCGT", 5.0),
    ("H2 underground store", 6000.0),
    ("H2 overground store", 6000.0),
    ("EV battery", 100.0),
    ("H2 Electrolysis", 30.0),
    ("H2 pipeline", 70.0),
    ("air heat pump", 5.0),
    ("ground heat pump", 5.0),
    ("gas boiler", 15.0),
    ("biomass boiler", 5.0),
    ("resistive heater", 5.0),
    ("solid biomass CHP", 5.0),
    ("methanol CHP", 5.0),
    ("rural resistive heater", 5.0),
    ("methanol", 2500.0),
    ("methanol steam reforming", 5.0),
    ("methanolisation", 5.0),
    ("Fischer-Tropsch", 5.0),
    ("TES central", 100.0),
    ("TES decentral", 100.0),
];

/// Centre of the initial map view as (latitude, longitude)
const MAP_CENTRE: (f64, f64) = (54.5, -3.436);

const MAP_ZOOM: f64 = 4.5;

const PLOTLY_URL: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// How the values of an indicator are labelled
#[derive(Debug, PartialEq)]
struct MapLabels {
    unit: String,
    variable: &'static str,
    variable_long: &'static str,
}

impl MapLabels {
    fn new(indicator: Indicator, config: &Config) -> Self {
        let (unit, variable, variable_long) = match indicator {
            Indicator::StorageCapacity => (
                config.unit.energy().to_string(),
                "Capacity",
                "Deployed capacity",
            ),
            Indicator::ElectricityDemand => ("TWh".into(), "Demand", "Electricity demand"),
            Indicator::HeatingDemand => ("TWh".into(), "Demand", "Heat demand"),
            Indicator::ElectricityGenerationShares | Indicator::HeatingGenerationShares => {
                ("%".into(), "Share", "Generation share")
            }
            _ => (config.unit.to_string(), "Capacity", "Deployed capacity"),
        };

        Self {
            unit,
            variable,
            variable_long,
        }
    }
}

fn is_share(indicator: Indicator) -> bool {
    matches!(
        indicator,
        Indicator::ElectricityGenerationShares | Indicator::HeatingGenerationShares
    )
}

/// The upper limit of the colour scale for a technology, if fixed
fn zmax(indicator: Indicator, tech: &str) -> Option<f64> {
    if is_share(indicator) {
        return Some(SHARE_ZMAX);
    }

    ZMAXS
        .iter()
        .find(|(name, _)| *name == tech)
        .map(|(_, zmax)| *zmax)
}

fn hovertemplate(label: &str, unit: &str) -> String {
    format!("<b>%{{customdata}}</b><br>{label}: %{{z:.1f}} {unit}<extra></extra>")
}

/// Format a number with one decimal place and thousands separators
fn format_total(value: f64) -> String {
    let formatted = format!("{:.1}", value.abs());
    let (integer, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "0"));
    let grouped = integer
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(String::from_utf8_lossy)
        .join(",");
    let sign = if value < 0.0 && formatted != "0.0" {
        "-"
    } else {
        ""
    };

    format!("{sign}{grouped}.{fraction}")
}

/// Values for one technology in one year, by region in region order
type Values = Vec<f64>;

/// The data drawn on a map
#[derive(Debug, PartialEq)]
struct MapData {
    techs: Vec<String>,
    years: Vec<u32>,
    /// Values keyed by (technology, year). Missing entries are drawn as zero.
    values: IndexMap<(String, u32), Values>,
}

impl MapData {
    /// Collect the plottable columns of an indicator over all years of a scenario
    fn new(
        pathways: &Pathways,
        scenario: &ScenarioID,
        indicator: Indicator,
        regions: &RegionMap,
    ) -> Self {
        let mut techs = IndexSet::new();
        let mut years = IndexSet::new();
        let mut values = IndexMap::new();
        for (year, results) in pathways.scenario_results(scenario) {
            let Some(table) = results.tables.get(&indicator) else {
                continue;
            };

            for (tech, column) in table.columns() {
                if column.values().sum::<f64>() <= MIN_COLUMN_TOTAL {
                    continue;
                }

                let z = regions
                    .keys()
                    .map(|region| column.get(region).copied().unwrap_or(0.0))
                    .collect();
                values.insert((tech.to_string(), year), z);
                techs.insert(tech.to_string());
                years.insert(year);
            }
        }

        let mut techs: Vec<String> = techs.into_iter().collect();
        techs.sort();
        let mut years: Vec<u32> = years.into_iter().collect();
        years.sort_unstable();

        Self {
            techs,
            years,
            values,
        }
    }

    fn is_empty(&self) -> bool {
        self.techs.is_empty()
    }

    fn z(&self, tech: &str, year: u32, num_regions: usize) -> Values {
        self.values
            .get(&(tech.to_string(), year))
            .cloned()
            .unwrap_or_else(|| vec![0.0; num_regions])
    }

    /// The totals annotation for a year
    fn totals_text(&self, year: u32, labels: &MapLabels, country_label: &str, share: bool) -> String {
        let totals = if share {
            String::new()
        } else {
            self.techs
                .iter()
                .map(|tech| {
                    let total: f64 = self
                        .values
                        .get(&(tech.clone(), year))
                        .map_or(0.0, |z| z.iter().sum());
                    format!("{tech}: {} {}", format_total(total), labels.unit)
                })
                .join("<br>")
        };

        format!("{country_label} totals {year}:<br>{totals}")
    }
}

/// The region polygons as a feature collection, with each feature identified by its region
fn regions_geojson(regions: &RegionMap) -> Value {
    let features: Vec<Value> = regions
        .values()
        .map(|region| {
            json!({
                "type": "Feature",
                "id": region.id.as_str(),
                "properties": {"name": region.name},
                "geometry": region.geometry,
            })
        })
        .collect();

    json!({"type": "FeatureCollection", "features": features})
}

/// Build the Plotly figure for an indicator. The region geometry is attached separately.
fn build_figure(
    data: &MapData,
    indicator: Indicator,
    regions: &RegionMap,
    config: &Config,
) -> Value {
    let labels = MapLabels::new(indicator, config);
    let share = is_share(indicator);
    let locations: Vec<&str> = regions.keys().map(RegionID::as_str).collect();
    let customdata = hover_labels(regions, config.layout());
    let num_regions = regions.len();
    let year0 = data.years[0];

    let traces: Vec<Value> = data
        .techs
        .iter()
        .enumerate()
        .map(|(i, tech)| {
            json!({
                "type": "choroplethmapbox",
                "name": tech,
                "locations": locations,
                "z": data.z(tech, year0, num_regions),
                "zmin": 0,
                "zmax": zmax(indicator, tech),
                "colorscale": "Blues",
                "marker": {"opacity": 0.5, "line": {"width": 0.1, "color": "gray"}},
                "visible": i == 0,
                "colorbar": {"title": {"text": format!("{} ({})", labels.variable, labels.unit)}},
                "customdata": customdata,
                "hovertemplate": hovertemplate(&format!("{tech} ({year0})"), &labels.unit),
                "hoverlabel": {
                    "bgcolor": "white",
                    "bordercolor": "black",
                    "font": {"size": 14, "color": "black"},
                },
            })
        })
        .collect();

    let buttons: Vec<Value> = (0..data.techs.len())
        .map(|i| {
            let visible: Vec<bool> = (0..data.techs.len()).map(|j| i == j).collect();
            json!({
                "label": data.techs[i],
                "method": "update",
                "args": [{"visible": visible}, {}],
            })
        })
        .collect();

    let steps: Vec<Value> = data
        .years
        .iter()
        .map(|&year| {
            let z: Vec<Values> = data
                .techs
                .iter()
                .map(|tech| data.z(tech, year, num_regions))
                .collect();
            let hover: Vec<String> = data
                .techs
                .iter()
                .map(|tech| hovertemplate(&format!("{tech} ({year})"), &labels.unit))
                .collect();
            json!({
                "label": year.to_string(),
                "method": "update",
                "args": [
                    {"z": z, "hovertemplate": hover},
                    {"annotations[0].text": data.totals_text(year, &labels, &config.country_label, share)},
                ],
            })
        })
        .collect();

    let mut mapbox = json!({
        "zoom": MAP_ZOOM,
        "center": {"lat": MAP_CENTRE.0, "lon": MAP_CENTRE.1},
    });
    if let Some(token) = &config.mapbox_token {
        mapbox["accesstoken"] = json!(token);
        mapbox["style"] = json!("mapbox://styles/mapbox/light-v11");
    } else {
        mapbox["style"] = json!("carto-positron");
    }

    let layout = json!({
        "autosize": false,
        "width": 700,
        "height": 750,
        "margin": {"r": 0, "t": 40, "l": 0, "b": 0},
        "title": {"text": format!(
            "{} by region in {} ({})",
            labels.variable_long, config.model_label, labels.unit
        )},
        "mapbox": mapbox,
        "updatemenus": [{
            "buttons": buttons,
            "direction": "down",
            "x": 0.02,
            "y": 0.98,
            "xanchor": "left",
            "yanchor": "top",
            "bgcolor": "white",
            "showactive": true,
        }],
        "annotations": [{
            "x": 0.97,
            "y": 0.975,
            "xref": "paper",
            "yref": "paper",
            "text": data.totals_text(year0, &labels, &config.country_label, share),
            "showarrow": false,
            "font": {"size": 14, "color": "gray"},
            "align": "right",
            "borderwidth": 1,
            "borderpad": 4,
        }],
        "sliders": [{
            "active": 0,
            "currentvalue": {"prefix": "Year: "},
            "pad": {"t": 5},
            "steps": steps,
        }],
        "uirevision": "keep-zoom",
    });

    json!({"data": traces, "layout": layout})
}

/// The file name of the map of an indicator for a scenario
pub fn map_file_name(scenario: &ScenarioID, indicator: Indicator, config: &Config) -> String {
    let suffix = if config.mapping { "_mapped" } else { "" };
    format!("{scenario}_{}{suffix}.html", indicator.label(&config.country_label))
}

/// Serialise a value as JSON which can be embedded in a `<script>` element
fn script_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

/// Render the map of an indicator for a scenario as an HTML page.
///
/// # Returns
///
/// The page, or `None` if the indicator has nothing to draw
pub fn render_interactive_map(
    pathways: &Pathways,
    scenario: &ScenarioID,
    indicator: Indicator,
    config: &Config,
) -> Result<Option<String>> {
    let regions = pathways
        .regions
        .get(scenario)
        .with_context(|| format!("No regions loaded for scenario {scenario}"))?;
    let data = MapData::new(pathways, scenario, indicator, regions);
    if data.is_empty() {
        return Ok(None);
    }

    let figure = build_figure(&data, indicator, regions, config);
    let title = format!("{scenario}: {}", indicator.label(&config.country_label));
    let html = TEMPLATE
        .replace("__TITLE__", &escape_xml(&title))
        .replace("__PLOTLY_URL__", PLOTLY_URL)
        .replace("__GEOJSON__", &script_json(&regions_geojson(regions))?)
        .replace("__FIGURE__", &script_json(&figure)?);

    Ok(Some(html))
}

/// Write the map of an indicator for a scenario into `figures_dir`.
///
/// Indicators with no column large enough to draw are skipped with a warning.
pub fn write_interactive_map(
    figures_dir: &Path,
    pathways: &Pathways,
    scenario: &ScenarioID,
    indicator: Indicator,
    config: &Config,
) -> Result<Option<PathBuf>> {
    let Some(html) = render_interactive_map(pathways, scenario, indicator, config)? else {
        warn!("Nothing to draw for {indicator} in scenario {scenario}; skipping map");
        return Ok(None);
    };

    let file_path = figures_dir.join(map_file_name(scenario, indicator, config));
    fs::write(&file_path, html)
        .with_context(|| format!("Could not write {}", file_path.display()))?;

    Ok(Some(file_path))
}

const TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>__TITLE__</title>
  <script src="__PLOTLY_URL__"></script>
</head>
<body>
  <div id="map"></div>
  <script>
    const geojson = __GEOJSON__;
    const figure = __FIGURE__;
    for (const trace of figure.data) {
      trace.geojson = geojson;
    }
    Plotly.newPlot("map", figure.data, figure.layout, {scrollZoom: true});
  </script>
</body>
</html>
"##;
