//! Relabelling of store and link carriers into the technology categories used for reporting.
//!
//! The network model uses fine-grained carrier labels. Before aggregation these are merged or
//! split into coarser categories: cheap and expensive hydrogen stores are distinguished, thermal
//! storage variants are pooled and locality prefixes are removed from heat-producing links.
use crate::network::{Link, Network, Store};

/// The carrier of all hydrogen stores in the network model
const H2_STORE_CARRIER: &str = "H2 Store";

/// Hydrogen stores at or below this capital cost are taken to be underground caverns
pub const H2_UNDERGROUND_COST_THRESHOLD: f64 = 200.0;

/// Store carriers pooled as central thermal energy storage
const TES_CENTRAL_STORES: [&str; 2] = ["urban central water tanks", "urban central water pits"];

/// Store carriers pooled as decentral thermal energy storage
const TES_DECENTRAL_STORES: [&str; 2] = ["rural water tanks", "urban decentral water tanks"];

/// Link carrier fragments and the labels they are relabelled to, checked in order
const TES_LINK_RULES: [(&str, &str); 8] = [
    ("urban central water tanks discharger", "TES central discharger"),
    ("water pits discharger", "TES central discharger"),
    ("rural water tanks discharger", "TES decentral discharger"),
    ("urban decentral water tanks discharger", "TES decentral discharger"),
    ("urban central water tanks charger", "TES central charger"),
    ("urban central water pits charger", "TES central charger"),
    ("rural water tanks charger", "TES decentral charger"),
    ("urban decentral water tanks charger", "TES decentral charger"),
];

/// Locality prefixes removed from the carriers of heat-producing links (longest first)
const LOCALITY_PREFIXES: [&str; 5] = [
    "urban central ",
    "urban decentral ",
    "rural central ",
    "rural decentral ",
    "rural ",
];

/// Get the reporting category for a store
pub fn store_category(store: &Store) -> &str {
    if store.carrier == H2_STORE_CARRIER {
        return if store.capital_cost <= H2_UNDERGROUND_COST_THRESHOLD {
            "H2 underground store"
        } else {
            "H2 overground store"
        };
    }

    if TES_CENTRAL_STORES.contains(&store.carrier.as_str()) {
        "TES central"
    } else if TES_DECENTRAL_STORES.contains(&store.carrier.as_str()) {
        "TES decentral"
    } else {
        &store.carrier
    }
}

/// Strip a locality prefix (e.g. `urban central `) from a carrier label
pub fn strip_locality(carrier: &str) -> &str {
    LOCALITY_PREFIXES
        .iter()
        .find_map(|prefix| carrier.strip_prefix(prefix))
        .unwrap_or(carrier)
}

/// Get the reporting category for a link
pub fn link_category(link: &Link) -> &str {
    if let Some((_, label)) = TES_LINK_RULES
        .iter()
        .find(|(fragment, _)| link.carrier.contains(fragment))
    {
        return label;
    }

    if link.output_buses().any(|bus| bus.contains("heat")) {
        strip_locality(&link.carrier)
    } else {
        &link.carrier
    }
}

/// Return a copy of the stores with carriers relabelled into reporting categories
pub fn reclassify_stores(stores: &[Store]) -> Vec<Store> {
    stores
        .iter()
        .map(|store| Store {
            carrier: store_category(store).to_string(),
            ..store.clone()
        })
        .collect()
}

/// Return a copy of the links with carriers relabelled into reporting categories
pub fn reclassify_links(links: &[Link]) -> Vec<Link> {
    links
        .iter()
        .map(|link| Link {
            carrier: link_category(link).to_string(),
            ..link.clone()
        })
        .collect()
}

/// Return a copy of the network with store and link carriers relabelled.
///
/// Relabelling is idempotent, so applying it to an already relabelled network has no effect.
pub fn reclassify(network: &Network) -> Network {
    Network {
        stores: reclassify_stores(&network.stores),
        links: reclassify_links(&network.links),
        ..network.clone()
    }
}
