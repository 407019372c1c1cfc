//! The results of a solved network model for a single scenario and planning year.
//!
//! Only the parts of the network needed for post-processing are represented. Time series are
//! stored as per-element totals over all snapshots, as no quantity derived from them depends on
//! the temporal profile.
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;

/// The bus carrier for high-voltage electricity buses
pub const AC_CARRIER: &str = "AC";

/// The bus carrier for low-voltage (distribution) electricity buses
pub const LOW_VOLTAGE_CARRIER: &str = "low voltage";

/// The suffix appended to a high-voltage bus name for its low-voltage counterpart
pub const LOW_VOLTAGE_SUFFIX: &str = " low voltage";

/// The carrier of DC transmission links
pub const DC_CARRIER: &str = "DC";

fn default_efficiency() -> f64 {
    1.0
}

/// A node in the network to which other components attach
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Bus {
    /// Unique identifier of the bus
    pub name: String,
    /// The energy carrier on the bus (e.g. `AC`, `low voltage`, `urban central heat`)
    #[serde(default)]
    pub carrier: String,
    /// Country code of the bus
    #[serde(default)]
    pub country: String,
}

/// A generator attached to a single bus
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Generator {
    /// Unique identifier of the generator
    pub name: String,
    /// The bus the generator feeds
    pub bus: String,
    /// Technology label
    pub carrier: String,
    /// Optimised nominal power capacity (MW)
    #[serde(default)]
    pub p_nom_opt: f64,
}

/// A controllable branch between two or more buses
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Link {
    /// Unique identifier of the link
    pub name: String,
    /// Input bus
    pub bus0: String,
    /// Main output bus
    pub bus1: String,
    /// Optional secondary output bus
    #[serde(default)]
    pub bus2: Option<String>,
    /// Technology label
    pub carrier: String,
    /// Optimised nominal input capacity (MW)
    #[serde(default)]
    pub p_nom_opt: f64,
    /// Conversion efficiency from `bus0` to `bus1`
    #[serde(default = "default_efficiency")]
    pub efficiency: f64,
}

impl Link {
    /// The output buses of the link, in port order
    pub fn output_buses(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.bus1.as_str()).chain(self.bus2.as_deref())
    }
}

/// An energy store attached to a single bus
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Store {
    /// Unique identifier of the store
    pub name: String,
    /// The bus the store is attached to
    pub bus: String,
    /// Technology label
    pub carrier: String,
    /// Optimised energy capacity (MWh)
    #[serde(default)]
    pub e_nom_opt: f64,
    /// Annualised capital cost per unit of energy capacity
    #[serde(default)]
    pub capital_cost: f64,
}

/// A storage unit (e.g. hydro reservoir) with coupled power and energy capacity
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StorageUnit {
    /// Unique identifier of the storage unit
    pub name: String,
    /// The bus the unit is attached to
    pub bus: String,
    /// Technology label
    pub carrier: String,
    /// Optimised nominal power capacity (MW)
    #[serde(default)]
    pub p_nom_opt: f64,
}

/// An exogenous demand
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Load {
    /// Unique identifier of the load
    pub name: String,
    /// The bus the load draws from
    pub bus: String,
    /// Demand sector label
    #[serde(default)]
    pub carrier: String,
}

/// Per-element totals of a time series over all snapshots.
///
/// Elements with no recorded series have a total of zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeriesTotals(HashMap<String, f64>);

impl TimeSeriesTotals {
    /// Get the total for the specified element
    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    /// Whether no series have been recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for TimeSeriesTotals {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The solved network for one scenario and year
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Network {
    /// The objective weighting (in hours) of each snapshot
    pub snapshot_weightings: Vec<f64>,
    /// Buses, keyed by name
    pub buses: IndexMap<String, Bus>,
    /// Generators
    pub generators: Vec<Generator>,
    /// Links
    pub links: Vec<Link>,
    /// Stores
    pub stores: Vec<Store>,
    /// Storage units
    pub storage_units: Vec<StorageUnit>,
    /// Loads
    pub loads: Vec<Load>,
    /// Generator dispatch totals (MW summed over snapshots)
    pub generators_p: TimeSeriesTotals,
    /// Link input flow totals at `bus0`
    pub links_p0: TimeSeriesTotals,
    /// Link output flow totals at `bus1` (negative when delivering)
    pub links_p1: TimeSeriesTotals,
    /// Link output flow totals at `bus2` (negative when delivering)
    pub links_p2: TimeSeriesTotals,
    /// Storage unit dispatch totals
    pub storage_units_p: TimeSeriesTotals,
    /// Load totals
    pub loads_p: TimeSeriesTotals,
}

impl Network {
    /// The average number of hours represented by each snapshot.
    ///
    /// This is the total objective weighting divided by the number of snapshots. It is zero for a
    /// network without snapshots.
    pub fn snapshot_weighting(&self) -> f64 {
        if self.snapshot_weightings.is_empty() {
            return 0.0;
        }

        self.snapshot_weightings.iter().sum::<f64>() / self.snapshot_weightings.len() as f64
    }

    /// Get the carrier of the specified bus, if the bus exists
    pub fn bus_carrier(&self, bus: &str) -> Option<&str> {
        self.buses.get(bus).map(|bus| bus.carrier.as_str())
    }

    /// Whether the bus carries high-voltage electricity
    pub fn is_ac_bus(&self, bus: &str) -> bool {
        self.bus_carrier(bus) == Some(AC_CARRIER)
    }

    /// Whether the bus carries electricity at either voltage level
    pub fn is_electricity_bus(&self, bus: &str) -> bool {
        matches!(
            self.bus_carrier(bus),
            Some(AC_CARRIER | LOW_VOLTAGE_CARRIER)
        )
    }

    /// Whether the bus carries low-voltage electricity
    pub fn is_low_voltage_bus(&self, bus: &str) -> bool {
        self.bus_carrier(bus) == Some(LOW_VOLTAGE_CARRIER)
    }

    /// Whether the bus carries heat of any kind
    pub fn is_heat_bus(&self, bus: &str) -> bool {
        self.bus_carrier(bus)
            .is_some_and(|carrier| carrier.contains("heat"))
    }

    /// Whether the bus is a high-voltage electricity bus of the specified country
    pub fn is_country_ac_bus(&self, bus: &str, country: &str) -> bool {
        self.buses
            .get(bus)
            .is_some_and(|bus| bus.carrier == AC_CARRIER && bus.country == country)
    }
}

/// Strip the low-voltage suffix from a bus name, if present
pub fn strip_low_voltage(bus: &str) -> &str {
    bus.strip_suffix(LOW_VOLTAGE_SUFFIX).unwrap_or(bus)
}
