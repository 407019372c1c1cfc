//! Code for reading region polygons from a GeoJSON file.
use super::{input_err_msg, read_json};
use crate::region::{Region, RegionLayout, RegionMap};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

/// The top-level object of a GeoJSON file
#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

/// A single GeoJSON feature
#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Map<String, Value>,
    #[serde(default)]
    geometry: Value,
}

/// Reads region polygons from a GeoJSON `FeatureCollection`.
///
/// Coordinates are assumed to be in WGS84 already.
///
/// # Arguments
///
/// * `file_path` - Path to the GeoJSON file
/// * `layout` - Determines which property holds the region name and how names are aliased
/// * `country` - Country code used to filter regions, depending on `layout`
///
/// # Returns
///
/// A [`RegionMap`] in file order, or an error.
pub fn read_regions(file_path: &Path, layout: RegionLayout, country: &str) -> Result<RegionMap> {
    let collection: FeatureCollection = read_json(file_path)?;
    let property = layout.name_property();

    let mut regions = RegionMap::new();
    for feature in collection.features {
        let dataset_name = feature
            .properties
            .get(property)
            .and_then(Value::as_str)
            .with_context(|| {
                format!(
                    "{}: feature is missing string property `{property}`",
                    input_err_msg(file_path)
                )
            })?;

        let (id, name) = layout.resolve_name(dataset_name);
        if !layout.keep_region(&id, country) {
            continue;
        }

        let region = Region {
            id: id.clone(),
            name,
            geometry: feature.geometry,
        };
        ensure!(
            regions.insert(id.clone(), region).is_none(),
            "{}: duplicate region {id}",
            input_err_msg(file_path)
        );
    }

    ensure!(
        !regions.is_empty(),
        "{}: no regions found",
        input_err_msg(file_path)
    );

    Ok(regions)
}
