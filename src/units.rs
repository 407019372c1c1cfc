//! Physical units used for aggregated quantities.
//!
//! Network results are stored in base units: MW for power capacity, MWh for energy storage
//! capacity and MW per snapshot for dispatch. Aggregated tables are reported in scaled units.
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

/// Number of MWh in a TWh
const MWH_PER_TWH: f64 = 1e6;

/// A unit in which capacities or energies can be reported
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum Unit {
    /// Megawatts (base unit of power)
    #[string = "MW"]
    MW,
    /// Gigawatts
    #[default]
    #[string = "GW"]
    GW,
    /// Megawatt-hours (base unit of energy)
    #[string = "MWh"]
    MWh,
    /// Gigawatt-hours
    #[string = "GWh"]
    GWh,
    /// Terawatt-hours
    #[string = "TWh"]
    TWh,
}

impl Unit {
    /// The number of base units (MW or MWh) in one of this unit
    fn base_units(self) -> f64 {
        match self {
            Self::MW | Self::MWh => 1.0,
            Self::GW | Self::GWh => 1e3,
            Self::TWh => MWH_PER_TWH,
        }
    }

    /// Convert a value in base units into this unit
    pub fn scale_from_base(self, value: f64) -> f64 {
        value / self.base_units()
    }

    /// Convert a value in this unit into base units
    pub fn scale_to_base(self, value: f64) -> f64 {
        value * self.base_units()
    }

    /// The matching energy unit for a power unit (e.g. GW -> GWh)
    pub fn energy(self) -> Self {
        match self {
            Self::MW => Self::MWh,
            Self::GW => Self::GWh,
            other => other,
        }
    }
}

/// Convert a total of per-snapshot values in MW into an annual energy in TWh.
///
/// # Arguments
///
/// * `total` - The sum of the values over all snapshots
/// * `snapshot_weighting` - The number of hours represented by each snapshot
pub fn annual_twh(total: f64, snapshot_weighting: f64) -> f64 {
    total * snapshot_weighting / MWH_PER_TWH
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Unit::MW, 1234.5, 1234.5)]
    #[case(Unit::GW, 1234.5, 1.2345)]
    #[case(Unit::GWh, 500.0, 0.5)]
    #[case(Unit::TWh, 2e6, 2.0)]
    fn test_from_base(#[case] unit: Unit, #[case] value: f64, #[case] expected: f64) {
        assert_approx_eq!(f64, unit.scale_from_base(value), expected);
    }

    #[rstest]
    #[case(Unit::GW, 0.001)]
    #[case(Unit::GW, 17.3)]
    #[case(Unit::GWh, 123_456.789)]
    #[case(Unit::TWh, 3.3)]
    fn test_round_trip(#[case] unit: Unit, #[case] value: f64) {
        assert_approx_eq!(f64, unit.scale_from_base(unit.scale_to_base(value)), value);
    }

    #[test]
    fn test_energy() {
        assert_eq!(Unit::GW.energy(), Unit::GWh);
        assert_eq!(Unit::MW.energy(), Unit::MWh);
        assert_eq!(Unit::TWh.energy(), Unit::TWh);
    }

    #[test]
    fn test_display() {
        assert_eq!(Unit::GWh.to_string(), "GWh");
    }

    #[test]
    fn test_deserialize() {
        let unit: Unit = serde_json::from_str("\"TWh\"").unwrap();
        assert_eq!(unit, Unit::TWh);
        assert!(serde_json::from_str::<Unit>("\"kW\"").is_err());
    }

    #[test]
    fn test_annual_twh() {
        // 1000 MW for 2920 three-hour snapshots is 8.76 TWh
        assert_approx_eq!(f64, annual_twh(1000.0 * 2920.0, 3.0), 8.76);
    }
}
