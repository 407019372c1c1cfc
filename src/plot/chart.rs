//! Stacked-area charts of national supply and demand over the planning years.
use super::{
    FALLBACK_COLOUR, PREFERRED_ORDER, PREFERRED_ORDER_DEMAND, PREFERRED_ORDER_HEATING,
    PlottingConfig, order_categories,
};
use crate::accumulate::{Indicator, Pathways, YearResults};
use crate::scenario::ScenarioID;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::fs;
use std::path::{Path, PathBuf};

/// Supply sources below this fraction of total supply are left out
const MIN_SUPPLY_SHARE: f64 = 0.001;

/// Heat supply carriers which are not shown
const HIDDEN_HEAT_SOURCES: [&str; 1] = ["DAC"];

/// Opacity of the demand areas
const DEMAND_OPACITY: f64 = 0.7;

const WIDTH: u32 = 1200;
const PLOT_HEIGHT: i32 = 660;
const LEGEND_LEFT: i32 = 80;
const LEGEND_COLUMN_WIDTH: i32 = 260;
const LEGEND_SPACING: i32 = 600;
const LEGEND_TOP: i32 = 20;
const LEGEND_ROW_HEIGHT: i32 = 22;
const FONT_FAMILY: &str = "sans-serif";
const FONT_SIZE: u32 = 13;
const GRID_COLOUR: RGBColor = RGBColor(204, 204, 204);

/// The energy carrier a chart describes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    /// Electricity supply and demand
    Electricity,
    /// Heat supply and demand
    Heating,
}

impl ChartKind {
    fn generation(self) -> Indicator {
        match self {
            Self::Electricity => Indicator::ElectricityGeneration,
            Self::Heating => Indicator::HeatingGeneration,
        }
    }

    fn preferred_order(self) -> &'static [&'static str] {
        match self {
            Self::Electricity => &PREFERRED_ORDER,
            Self::Heating => &PREFERRED_ORDER_HEATING,
        }
    }

    fn demand(self, results: &YearResults) -> &IndexMap<String, f64> {
        match self {
            Self::Electricity => &results.electricity_demand_by_sector,
            Self::Heating => &results.heat_demand_by_sector,
        }
    }

    /// The file name of the chart for a scenario
    pub fn file_name(self, scenario: &ScenarioID) -> String {
        let carrier = match self {
            Self::Electricity => "electricity",
            Self::Heating => "heating",
        };
        format!("pathway_{carrier}_generation_mix_{scenario}.svg")
    }

    /// National supply by source for one year
    fn supply(self, results: &YearResults) -> IndexMap<String, f64> {
        let Some(table) = results.tables.get(&self.generation()) else {
            return IndexMap::new();
        };
        let totals = table.column_totals();
        if self == Self::Electricity {
            return totals;
        }

        // Rural heat sources are shown together with their urban counterparts
        let mut merged = IndexMap::<String, f64>::new();
        for (source, total) in totals {
            let source = source.replace("rural ", "");
            if !HIDDEN_HEAT_SOURCES.contains(&source.as_str()) {
                *merged.entry(source).or_default() += total;
            }
        }

        merged
    }
}

/// Yearly values for each series of a chart
pub type Series = IndexMap<String, Vec<f64>>;

/// National supply and demand for one scenario over the planning years
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyBalance {
    /// The planning years, in order
    pub years: Vec<u32>,
    /// Supply by source (TWh), in stacking order
    pub supply: Series,
    /// Demand by sector (TWh), in stacking order
    pub demand: Series,
}

impl EnergyBalance {
    /// Collect supply and demand for a scenario.
    ///
    /// Sources contributing less than 0.1% of supply over all years are dropped. Missing values
    /// are zero.
    pub fn new(pathways: &Pathways, scenario: &ScenarioID, kind: ChartKind) -> Self {
        let mut years = Vec::new();
        let mut supply_by_year = Vec::new();
        let mut demand_by_year = Vec::new();
        for (year, results) in pathways.scenario_results(scenario) {
            years.push(year);
            supply_by_year.push(kind.supply(results));
            demand_by_year.push(kind.demand(results).clone());
        }

        let mut supply = to_series(&supply_by_year);
        let total: f64 = supply.values().flatten().sum();
        supply.retain(|_, values| values.iter().sum::<f64>() / total > MIN_SUPPLY_SHARE);
        let supply = reorder(supply, kind.preferred_order());

        let demand = reorder(to_series(&demand_by_year), &PREFERRED_ORDER_DEMAND);

        Self {
            years,
            supply,
            demand,
        }
    }

    /// Total demand in each year
    pub fn total_demand(&self) -> Vec<f64> {
        (0..self.years.len())
            .map(|i| self.demand.values().map(|values| values[i]).sum())
            .collect()
    }
}

/// Convert per-year maps into series, filling gaps with zero
fn to_series(by_year: &[IndexMap<String, f64>]) -> Series {
    let mut series = Series::new();
    for (i, values) in by_year.iter().enumerate() {
        for (name, value) in values {
            series
                .entry(name.clone())
                .or_insert_with(|| vec![0.0; by_year.len()])[i] = *value;
        }
    }

    series
}

fn reorder(mut series: Series, preferred: &[&str]) -> Series {
    order_categories(preferred, series.keys().map(String::as_str))
        .into_iter()
        .filter_map(|name| {
            let values = series.swap_remove(&name)?;
            Some((name, values))
        })
        .collect()
}

/// Convert a `#rrggbb` colour into a plotting colour
fn to_rgb(colour: &str) -> RGBColor {
    let hex = colour.trim_start_matches('#');
    let channel = |start: usize| {
        hex.get(start..start + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
    };
    match (channel(0), channel(2), channel(4)) {
        (Some(red), Some(green), Some(blue)) if hex.len() == 6 => RGBColor(red, green, blue),
        _ => to_rgb(FALLBACK_COLOUR),
    }
}

/// Stacked bands for each series as polygons. Values are negated when `downwards` is set.
fn stacked_bands(years: &[u32], series: &Series, downwards: bool) -> Vec<Vec<(f64, f64)>> {
    let sign = if downwards { -1.0 } else { 1.0 };
    let mut base = vec![0.0; years.len()];
    let mut bands = Vec::with_capacity(series.len());
    for values in series.values() {
        let top: Vec<f64> = base
            .iter()
            .zip(values)
            .map(|(base, value)| base + sign * value)
            .collect();

        let upper = years.iter().zip(&top);
        let lower = years.iter().zip(&base).rev();
        bands.push(
            upper
                .chain(lower)
                .map(|(year, value)| (f64::from(*year), *value))
                .collect(),
        );
        base = top;
    }

    bands
}

/// Draw a titled two-column legend with its top-left corner at `origin`
fn draw_legend(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    origin: (i32, i32),
    title: &str,
    names: impl Iterator<Item = impl AsRef<str>>,
    plotting: &PlottingConfig,
    opacity: f64,
) -> Result<()> {
    let title_font = TextStyle::from((FONT_FAMILY, f64::from(FONT_SIZE) + 2.0).into_font());
    let font = TextStyle::from((FONT_FAMILY, f64::from(FONT_SIZE)).into_font());
    area.draw_text(title, &title_font, origin)?;
    for (i, name) in (0_i32..).zip(names) {
        let name = name.as_ref();
        let x = origin.0 + (i % 2) * LEGEND_COLUMN_WIDTH;
        let y = origin.1 + (i / 2 + 1) * LEGEND_ROW_HEIGHT;
        let colour = to_rgb(plotting.colour(name)).mix(opacity);
        area.draw(&Rectangle::new([(x, y), (x + 14, y + 14)], colour.filled()))?;
        area.draw_text(name, &font, (x + 20, y))?;
    }

    Ok(())
}

/// Draw an energy balance onto an SVG drawing area
fn draw_energy_balance(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    balance: &EnergyBalance,
    plotting: &PlottingConfig,
) -> Result<()> {
    let years = &balance.years;
    let first = years.first().copied().map_or(0.0, f64::from);
    let last = years.last().copied().map_or(0.0, f64::from);
    let (x_min, x_max) = if last > first {
        (first, last)
    } else {
        (first - 1.0, first + 1.0)
    };

    let total_demand = balance.total_demand();
    let max_value = (0..years.len())
        .map(|i| balance.supply.values().map(|values| values[i]).sum::<f64>())
        .chain(total_demand.iter().copied())
        .fold(0.0, f64::max);
    let y_max = if max_value > 0.0 {
        max_value * 1.05
    } else {
        1.0
    };

    root.fill(&WHITE)?;
    let (plot_area, legend_area) = root.split_vertically(PLOT_HEIGHT);

    let mut chart = ChartBuilder::on(&plot_area)
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, -y_max..y_max)?;
    chart
        .configure_mesh()
        .x_labels(years.len().max(2))
        .x_label_formatter(&|year| format!("{year:.0}"))
        .y_label_formatter(&|value| format!("{value:.0}"))
        .y_desc("TWh")
        .bold_line_style(GRID_COLOUR.stroke_width(1))
        .max_light_lines(0)
        .label_style((FONT_FAMILY, f64::from(FONT_SIZE)))
        .draw()?;

    for (downwards, series, opacity) in [
        (false, &balance.supply, 1.0),
        (true, &balance.demand, DEMAND_OPACITY),
    ] {
        for (name, band) in series.keys().zip(stacked_bands(years, series, downwards)) {
            let colour = to_rgb(plotting.colour(name)).mix(opacity);
            chart.draw_series(std::iter::once(Polygon::new(band, colour.filled())))?;
        }
    }

    chart.draw_series(DashedLineSeries::new(
        [(x_min, 0.0), (x_max, 0.0)],
        4,
        4,
        WHITE.stroke_width(1),
    ))?;
    chart.draw_series(DashedLineSeries::new(
        years.iter().map(|year| f64::from(*year)).zip(total_demand),
        10,
        6,
        BLACK.stroke_width(3),
    ))?;

    draw_legend(
        &legend_area,
        (LEGEND_LEFT, LEGEND_TOP),
        "Supply by source",
        balance.supply.keys(),
        plotting,
        1.0,
    )?;
    draw_legend(
        &legend_area,
        (LEGEND_LEFT + LEGEND_SPACING, LEGEND_TOP),
        "Demand by sector",
        balance.demand.keys(),
        plotting,
        DEMAND_OPACITY,
    )?;
    root.present()?;

    Ok(())
}

/// Render an energy balance as an SVG document.
///
/// Supply is stacked above zero and demand by sector below it, with total demand drawn as a
/// dashed line. The y-axis is symmetric about zero.
pub fn render_energy_balance(
    balance: &EnergyBalance,
    plotting: &PlottingConfig,
) -> Result<String> {
    let rows = balance.supply.len().max(balance.demand.len()).div_ceil(2) + 1;
    let height = i32::try_from(rows)
        .ok()
        .and_then(|rows| rows.checked_mul(LEGEND_ROW_HEIGHT))
        .and_then(|legend| u32::try_from(PLOT_HEIGHT + LEGEND_TOP + legend).ok())
        .context("Too many series to draw")?;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, height)).into_drawing_area();
        draw_energy_balance(&root, balance, plotting)?;
    }

    Ok(svg)
}

/// Write the chart of a given kind for a scenario into `figures_dir`
pub fn write_energy_balance_chart(
    figures_dir: &Path,
    pathways: &Pathways,
    scenario: &ScenarioID,
    kind: ChartKind,
    plotting: &PlottingConfig,
) -> Result<PathBuf> {
    let balance = EnergyBalance::new(pathways, scenario, kind);
    let file_path = figures_dir.join(kind.file_name(scenario));
    fs::write(&file_path, render_energy_balance(&balance, plotting)?)
        .with_context(|| format!("Could not write {}", file_path.display()))?;

    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::regions;
    use crate::region::RegionMap;
    use crate::scenario::ScenarioYear;
    use crate::table::RegionTable;
    use float_cmp::assert_approx_eq;
    use indexmap::indexmap;
    use rstest::{fixture, rstest};
    use std::rc::Rc;

    fn year_results(regions: &RegionMap, heat: IndexMap<String, f64>, scale: f64) -> YearResults {
        let mut table = RegionTable::new(regions);
        for (carrier, value) in [
            ("air heat pump", 10.0),
            ("rural air heat pump", 5.0),
            ("DAC", 3.0),
            ("gas boiler", 20.0),
            ("oil boiler", 0.001),
        ] {
            table
                .set_column(carrier, indexmap! {"GB north".into() => value * scale})
                .unwrap();
        }

        YearResults {
            tables: indexmap! {Indicator::HeatingGeneration => table},
            heat_demand_by_sector: heat,
            ..YearResults::default()
        }
    }

    #[fixture]
    fn pathways(regions: RegionMap) -> Pathways {
        let scenario: ScenarioID = "all".into();
        let mut pathways = Pathways::default();
        pathways.results.insert(
            ScenarioYear::new(&scenario, 2025),
            year_results(
                &regions,
                indexmap! {"urban central heat".to_string() => 30.0},
                1.0,
            ),
        );
        pathways.results.insert(
            ScenarioYear::new(&scenario, 2030),
            year_results(
                &regions,
                indexmap! {"rural heat".to_string() => 10.0, "urban central heat".to_string() => 25.0},
                2.0,
            ),
        );
        pathways.regions.insert(scenario, Rc::new(regions));
        pathways
    }

    #[rstest]
    fn test_heating_balance(pathways: Pathways) {
        let balance = EnergyBalance::new(&pathways, &"all".into(), ChartKind::Heating);
        assert_eq!(balance.years, [2025, 2030]);

        // Rural sources merged, DAC and negligible sources dropped
        itertools::assert_equal(balance.supply.keys(), ["air heat pump", "gas boiler"]);
        assert_eq!(balance.supply["air heat pump"], [15.0, 30.0]);

        // Missing sectors are zero
        assert_eq!(balance.demand["rural heat"], [0.0, 10.0]);
        let total = balance.total_demand();
        assert_approx_eq!(f64, total[0], 30.0);
        assert_approx_eq!(f64, total[1], 35.0);
    }

    #[rstest]
    fn test_render_energy_balance(pathways: Pathways) {
        let balance = EnergyBalance::new(&pathways, &"all".into(), ChartKind::Heating);
        let svg = render_energy_balance(&balance, &PlottingConfig::default()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("Supply by source"));
        assert!(svg.contains("Demand by sector"));
        assert!(svg.contains("air heat pump"));
        assert!(svg.contains("TWh"));
        assert_eq!(svg.matches("<polygon").count(), 4);
    }

    #[test]
    fn test_stacked_bands() {
        let series = indexmap! {
            "a".to_string() => vec![1.0, 2.0],
            "b".to_string() => vec![3.0, 4.0],
        };
        let bands = stacked_bands(&[2025, 2030], &series, true);
        assert_eq!(
            bands[0],
            [(2025.0, -1.0), (2030.0, -2.0), (2030.0, 0.0), (2025.0, 0.0)]
        );
        assert_eq!(
            bands[1],
            [(2025.0, -4.0), (2030.0, -6.0), (2030.0, -2.0), (2025.0, -1.0)]
        );
    }

    #[rstest]
    #[case("#235ebc", RGBColor(0x23, 0x5e, 0xbc))]
    #[case("#FFFFFF", RGBColor(255, 255, 255))]
    #[case("red", RGBColor(0x99, 0x99, 0x99))]
    #[case("#12345", RGBColor(0x99, 0x99, 0x99))]
    fn test_to_rgb(#[case] colour: &str, #[case] expected: RGBColor) {
        assert_eq!(to_rgb(colour), expected);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            ChartKind::Electricity.file_name(&"all".into()),
            "pathway_electricity_generation_mix_all.svg"
        );
    }
}
