//! Fixtures for tests
use crate::network::{Bus, Generator, Link, Load, Network, StorageUnit, Store};
use crate::region::{Region, RegionID, RegionMap};
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

pub fn bus(name: &str, carrier: &str, country: &str) -> Bus {
    Bus {
        name: name.into(),
        carrier: carrier.into(),
        country: country.into(),
    }
}

pub fn generator(name: &str, bus: &str, carrier: &str, p_nom_opt: f64) -> Generator {
    Generator {
        name: name.into(),
        bus: bus.into(),
        carrier: carrier.into(),
        p_nom_opt,
    }
}

pub fn link(
    name: &str,
    buses: (&str, &str, Option<&str>),
    carrier: &str,
    p_nom_opt: f64,
    efficiency: f64,
) -> Link {
    Link {
        name: name.into(),
        bus0: buses.0.into(),
        bus1: buses.1.into(),
        bus2: buses.2.map(String::from),
        carrier: carrier.into(),
        p_nom_opt,
        efficiency,
    }
}

pub fn store(name: &str, bus: &str, carrier: &str, e_nom_opt: f64, capital_cost: f64) -> Store {
    Store {
        name: name.into(),
        bus: bus.into(),
        carrier: carrier.into(),
        e_nom_opt,
        capital_cost,
    }
}

pub fn load(name: &str, bus: &str, carrier: &str) -> Load {
    Load {
        name: name.into(),
        bus: bus.into(),
        carrier: carrier.into(),
    }
}

/// Build time series totals from (element name, total) pairs
pub fn totals<const N: usize>(values: [(&str, f64); N]) -> crate::network::TimeSeriesTotals {
    values
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Create a region with no geometry
pub fn region(name: &str) -> (RegionID, Region) {
    (
        name.into(),
        Region {
            id: name.into(),
            name: name.to_string(),
            geometry: serde_json::Value::Null,
        },
    )
}

#[fixture]
pub fn regions() -> RegionMap {
    ["GB north", "GB south", "GB east", "GB east midland"]
        .into_iter()
        .map(region)
        .collect()
}

/// A small network with four GB regions and one foreign node.
///
/// Snapshots are weighted at three hours each.
#[fixture]
pub fn network() -> Network {
    let buses = [
        bus("GB north 0", "AC", "GB"),
        bus("GB north 0 low voltage", "low voltage", "GB"),
        bus("GB north 0 urban central heat", "urban central heat", "GB"),
        bus("GB south 0", "AC", "GB"),
        bus("GB east 3", "AC", "GB"),
        bus("GB east midland 2", "AC", "GB"),
        bus("IE 0", "AC", "IE"),
    ]
    .into_iter()
    .map(|bus| (bus.name.clone(), bus))
    .collect();

    Network {
        snapshot_weightings: vec![3.0; 4],
        buses,
        generators: vec![
            generator("GB north 0 onwind", "GB north 0", "onwind", 10_000.0),
            generator("GB east 3 offwind-ac", "GB east 3", "offwind-ac", 2000.0),
            generator("GB east 3 offwind-dc", "GB east 3", "offwind-dc", 1000.0),
            generator(
                "GB north 0 solar rooftop",
                "GB north 0 low voltage",
                "solar rooftop",
                500.0,
            ),
            generator("IE 0 onwind", "IE 0", "onwind", 7000.0),
        ],
        links: vec![
            link(
                "GB south 0 OCGT",
                ("GB gas", "GB south 0", None),
                "OCGT",
                1000.0,
                0.4,
            ),
            link(
                "GB east midland 2 H2 Electrolysis",
                ("GB east midland 2", "GB east midland 2 H2", None),
                "H2 Electrolysis",
                2000.0,
                0.7,
            ),
            link(
                "GB north 0 urban central gas CHP",
                ("GB gas", "GB north 0", Some("GB north 0 urban central heat")),
                "urban central gas CHP",
                500.0,
                0.4,
            ),
            link(
                "GB north 0 urban central air heat pump",
                ("GB north 0 low voltage", "GB north 0 urban central heat", None),
                "urban central air heat pump",
                100.0,
                3.0,
            ),
            link(
                "GB north 0 urban central water tanks discharger",
                (
                    "GB north 0 urban central water tanks",
                    "GB north 0 urban central heat",
                    None,
                ),
                "urban central water tanks discharger",
                50.0,
                0.9,
            ),
            link(
                "GB north 0 - GB south 0",
                ("GB north 0", "GB south 0", None),
                "DC",
                3000.0,
                1.0,
            ),
            link(
                "GB north 0 electricity distribution grid",
                ("GB north 0", "GB north 0 low voltage", None),
                "electricity distribution grid",
                5000.0,
                1.0,
            ),
            link(
                "GB north 0 BEV charger",
                ("GB north 0 low voltage", "GB north 0 EV battery", None),
                "BEV charger",
                200.0,
                0.9,
            ),
        ],
        stores: vec![
            store("GB north 0 H2 Store 1", "GB north 0 H2", "H2 Store", 5000.0, 150.0),
            store("GB north 0 H2 Store 2", "GB north 0 H2", "H2 Store", 5000.0, 250.0),
            store("GB south 0 battery", "GB south 0 battery", "battery", 2000.0, 100.0),
            store(
                "GB north 0 urban central water tanks",
                "GB north 0 urban central water tanks",
                "urban central water tanks",
                800.0,
                10.0,
            ),
            store("IE 0 battery", "IE 0 battery", "battery", 999.0, 100.0),
        ],
        storage_units: vec![StorageUnit {
            name: "GB south 0 hydro".into(),
            bus: "GB south 0".into(),
            carrier: "hydro".into(),
            p_nom_opt: 300.0,
        }],
        loads: vec![
            load("GB north 0 electricity", "GB north 0 low voltage", "electricity"),
            load("GB south 0 electricity", "GB south 0", "electricity"),
            load(
                "GB north 0 urban central heat",
                "GB north 0 urban central heat",
                "urban central heat",
            ),
            load("IE 0 electricity", "IE 0", "electricity"),
        ],
        generators_p: totals([
            ("GB north 0 onwind", 20.0),
            ("GB east 3 offwind-ac", 6.0),
            ("GB north 0 solar rooftop", 2.0),
            ("IE 0 onwind", 50.0),
        ]),
        links_p0: totals([
            ("GB south 0 OCGT", 100.0),
            ("GB east midland 2 H2 Electrolysis", 300.0),
            ("GB north 0 urban central gas CHP", 80.0),
            ("GB north 0 urban central air heat pump", 50.0),
            ("GB north 0 - GB south 0", 10.0),
            ("GB north 0 electricity distribution grid", 999.0),
            ("GB north 0 BEV charger", 40.0),
        ]),
        links_p1: totals([
            ("GB south 0 OCGT", -40.0),
            ("GB east midland 2 H2 Electrolysis", -210.0),
            ("GB north 0 urban central gas CHP", -32.0),
            ("GB north 0 urban central air heat pump", -150.0),
            ("GB north 0 urban central water tanks discharger", -20.0),
            ("GB north 0 - GB south 0", -10.0),
            ("GB north 0 electricity distribution grid", -990.0),
        ]),
        links_p2: totals([("GB north 0 urban central gas CHP", -40.0)]),
        storage_units_p: totals([("GB south 0 hydro", 600.0)]),
        loads_p: totals([
            ("GB north 0 electricity", 4000.0),
            ("GB south 0 electricity", 2000.0),
            ("GB north 0 urban central heat", 1000.0),
            ("IE 0 electricity", 9999.0),
        ]),
    }
}
