//! Scenarios and the (scenario, year) keys under which results are stored.
use crate::id::define_id_type;
use derive_more::Display;

define_id_type! {ScenarioID}

/// Identifies the network results for one scenario in one planning year
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("{scenario} ({year})")]
pub struct ScenarioYear {
    /// The scenario
    pub scenario: ScenarioID,
    /// The planning year
    pub year: u32,
}

impl ScenarioYear {
    /// Create a new key
    pub fn new(scenario: &ScenarioID, year: u32) -> Self {
        Self {
            scenario: scenario.clone(),
            year,
        }
    }
}
