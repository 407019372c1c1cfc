//! Tables of values by region and category.
use crate::region::{RegionID, RegionMap};
use anyhow::{Result, ensure};
use indexmap::{IndexMap, IndexSet};

/// The values of one table column, keyed by region
pub type Column = IndexMap<RegionID, f64>;

/// A table with one row per region and one column per category.
///
/// The set of rows is fixed when the table is created. Cells which have never been written are
/// absent rather than zero.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionTable {
    regions: IndexSet<RegionID>,
    columns: IndexMap<String, Column>,
}

impl RegionTable {
    /// Create an empty table with a row for every region in `regions`
    pub fn new(regions: &RegionMap) -> Self {
        Self {
            regions: regions.keys().cloned().collect(),
            columns: IndexMap::new(),
        }
    }

    /// The regions (rows) of the table, in order
    pub fn regions(&self) -> impl Iterator<Item = &RegionID> {
        self.regions.iter()
    }

    /// The number of rows in the table
    pub fn num_regions(&self) -> usize {
        self.regions.len()
    }

    /// The category (column) names, in the order they were first written
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Iterate over the columns of the table
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(name, column)| (name.as_str(), column))
    }

    /// Whether the table has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Get a column by name
    pub fn column(&self, category: &str) -> Option<&Column> {
        self.columns.get(category)
    }

    /// Get the value of a single cell, if it has been written
    pub fn get(&self, region: &str, category: &str) -> Option<f64> {
        self.columns.get(category)?.get(region).copied()
    }

    /// Write a column to the table, replacing any existing column with the same name.
    ///
    /// Values are reordered to follow the row order of the table.
    ///
    /// # Returns
    ///
    /// An error if any of the values refers to a region which is not a row of the table. In this
    /// case the table is left unchanged.
    pub fn set_column(&mut self, category: &str, values: Column) -> Result<()> {
        for region in values.keys() {
            ensure!(
                self.regions.contains(region),
                "Region {region} is not part of the table"
            );
        }

        let column = self
            .regions
            .iter()
            .filter_map(|region| Some((region.clone(), *values.get(region)?)))
            .collect();
        self.columns.insert(category.to_string(), column);

        Ok(())
    }

    /// Sum a column over all regions. Missing columns sum to zero.
    pub fn column_total(&self, category: &str) -> f64 {
        self.columns
            .get(category)
            .map_or(0.0, |column| column.values().sum())
    }

    /// Sum every column over all regions
    pub fn column_totals(&self) -> IndexMap<String, f64> {
        self.columns
            .iter()
            .map(|(name, column)| (name.clone(), column.values().sum()))
            .collect()
    }

    /// Sum all cells in the table
    pub fn total(&self) -> f64 {
        self.columns.values().flat_map(|column| column.values()).sum()
    }
}
