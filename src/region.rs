//! Regions are the geographical areas onto which network results are aggregated.
use crate::id::define_id_type;
use indexmap::IndexMap;
use std::collections::HashMap;

define_id_type! {RegionID}

/// A map of [`Region`]s, keyed by region ID, in the order they appear in the input file
pub type RegionMap = IndexMap<RegionID, Region>;

/// How region names in the polygon dataset relate to bus names in the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionLayout {
    /// Networks which have been mapped onto administrative regions.
    ///
    /// Regions are identified by their `name` property, which appears verbatim in bus names.
    Mapped,
    /// Networks as produced directly by the model.
    ///
    /// Regions are identified by an administrative code in their `admin` property, with the first
    /// three characters giving the NUTS-style region code.
    Raw,
}

/// Region names which differ between the polygon dataset and the network (dataset, network)
const MAPPED_ALIASES: [(&str, &str); 1] = [("GB north ireland", "GB north ireland 0")];

/// Region codes which differ between the polygon dataset and the network (dataset, network)
const RAW_ALIASES: [(&str, &str); 1] = [("GBN0B+1", "GBN 0")];

/// Human-readable names for administrative region codes
const SIMPLE_NAMES: [(&str, &str); 13] = [
    ("GBM", "GB scotland"),
    ("GBD", "GB north west"),
    ("GBC", "GB north east yorkshire humber"),
    ("GBE", "GB north east yorkshire humber"),
    ("GBF", "GB east midland"),
    ("GBG", "GB west midland"),
    ("GBH", "GB east"),
    ("GBJ1", "GB central england"),
    ("GBJ", "GB south east"),
    ("GBK", "GB south west"),
    ("GBL", "GB wales cymru"),
    ("GBI", "GB greater london"),
    ("GBN", "GB north ireland"),
];

impl RegionLayout {
    /// The GeoJSON feature property holding the region name
    pub fn name_property(self) -> &'static str {
        match self {
            Self::Mapped => "name",
            Self::Raw => "admin",
        }
    }

    /// Get the (matching ID, output name) pair for a name read from the polygon dataset
    pub fn resolve_name(self, dataset_name: &str) -> (RegionID, String) {
        match self {
            Self::Mapped => {
                let id = MAPPED_ALIASES
                    .iter()
                    .find(|(from, _)| *from == dataset_name)
                    .map_or(dataset_name, |&(_, to)| to);
                (id.into(), dataset_name.to_string())
            }
            Self::Raw => {
                let id = RAW_ALIASES
                    .iter()
                    .find(|(from, _)| *from == dataset_name)
                    .map_or(dataset_name, |&(_, to)| to);
                (id.into(), id.to_string())
            }
        }
    }

    /// Whether a region from the polygon dataset should be kept
    pub fn keep_region(self, id: &RegionID, country: &str) -> bool {
        match self {
            Self::Mapped => true,
            Self::Raw => id.as_str().contains(country),
        }
    }

    /// The label to show for a region when hovering over it on a map
    fn base_label(self, region: &Region) -> String {
        match self {
            Self::Mapped => region.name.clone(),
            Self::Raw => {
                let code = region.name.get(..3).unwrap_or(&region.name);
                SIMPLE_NAMES
                    .iter()
                    .find(|(key, _)| *key == code)
                    .map_or_else(|| region.name.clone(), |(_, name)| (*name).to_string())
            }
        }
    }
}

/// A region with a polygon geometry
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// The identifier used to match network buses to the region
    pub id: RegionID,
    /// The name of the region as written in outputs
    pub name: String,
    /// The GeoJSON geometry of the region (WGS84)
    pub geometry: serde_json::Value,
}

/// Find the region to which a bus belongs.
///
/// A bus belongs to a region if the region's ID is a substring of the bus name. Where several
/// regions match, the longest ID wins, so that `GB east 3` belongs to `GB east` rather than
/// `GB east midland` while `GB east midland 2` belongs to `GB east midland`. Ties go to the region
/// listed first.
pub fn find_region<'a>(regions: &'a RegionMap, bus: &str) -> Option<&'a RegionID> {
    let mut best: Option<&RegionID> = None;
    for id in regions.keys() {
        if !bus.contains(id.as_str()) {
            continue;
        }

        if best.is_none_or(|best| id.as_str().len() > best.as_str().len()) {
            best = Some(id);
        }
    }

    best
}

/// Get hover labels for each region, in region order.
///
/// Labels which are shared by more than one region are numbered, e.g. `GB east (1/2)`.
pub fn hover_labels(regions: &RegionMap, layout: RegionLayout) -> Vec<String> {
    let labels: Vec<_> = regions
        .values()
        .map(|region| layout.base_label(region))
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in &labels {
        *counts.entry(label.as_str()).or_default() += 1;
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    labels
        .iter()
        .map(|label| {
            let count = counts[label.as_str()];
            if count == 1 {
                return label.clone();
            }

            let index = seen.entry(label.as_str()).or_default();
            *index += 1;
            format!("{label} ({index}/{count})")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{region, regions};
    use rstest::rstest;

    #[rstest]
    #[case("GB east 3", Some("GB east"))]
    #[case("GB east midland 2", Some("GB east midland"))]
    #[case("GB east midland 2 low voltage", Some("GB east midland"))]
    #[case("GB north 0", Some("GB north"))]
    #[case("IE 0", None)]
    fn test_find_region(
        regions: RegionMap,
        #[case] bus: &str,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(find_region(&regions, bus).map(RegionID::as_str), expected);
    }

    #[rstest]
    #[case(RegionLayout::Mapped, "GB north ireland", "GB north ireland 0", "GB north ireland")]
    #[case(RegionLayout::Mapped, "GB east", "GB east", "GB east")]
    #[case(RegionLayout::Raw, "GBN0B+1", "GBN 0", "GBN 0")]
    #[case(RegionLayout::Raw, "GBH 1", "GBH 1", "GBH 1")]
    fn test_resolve_name(
        #[case] layout: RegionLayout,
        #[case] dataset_name: &str,
        #[case] id: &str,
        #[case] name: &str,
    ) {
        assert_eq!(layout.resolve_name(dataset_name), (id.into(), name.to_string()));
    }

    #[test]
    fn test_keep_region() {
        assert!(RegionLayout::Raw.keep_region(&"GBH 1".into(), "GB"));
        assert!(!RegionLayout::Raw.keep_region(&"IE0 1".into(), "GB"));
        assert!(RegionLayout::Mapped.keep_region(&"IE0 1".into(), "GB"));
    }

    #[test]
    fn test_hover_labels_raw() {
        let regions: RegionMap = ["GBH 0", "GBH 1", "GBM 0", "GBX 0"]
            .into_iter()
            .map(region)
            .collect();
        assert_eq!(
            hover_labels(&regions, RegionLayout::Raw),
            [
                "GB east (1/2)",
                "GB east (2/2)",
                "GB scotland",
                "GBX 0"
            ]
        );
    }

    #[rstest]
    fn test_hover_labels_mapped(regions: RegionMap) {
        assert_eq!(
            hover_labels(&regions, RegionLayout::Mapped),
            ["GB north", "GB south", "GB east", "GB east midland"]
        );
    }
}
